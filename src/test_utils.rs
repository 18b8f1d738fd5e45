//! Test doubles for the driver, catalog, and reporter capabilities.
//!
//! Enabled through the `test-utils` feature; the crate's own integration
//! tests pull it in via a dev-dependency on itself.

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::binding::BindingMap;
use crate::catalog::ColumnCatalog;
use crate::driver::StatementDriver;
use crate::error::SqlFacadeError;
use crate::reporter::{ErrorContext, ErrorReporter};
use crate::results::ResultSet;
use crate::value::SqlValue;

/// One capability call as the mock driver observed it.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Prepare(String),
    Query { sql: String, bindings: BindingMap },
    Execute { sql: String, bindings: BindingMap },
}

/// What the mock driver answers for its next query/execute call.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Rows(ResultSet),
    Affected(u64),
    Fail(String),
}

/// Scripted stand-in for a real backend: records every call, answers from a
/// response queue, and serves catalog lookups from registered tables.
///
/// With an empty queue, queries answer an empty row set and executions
/// report zero rows affected.
#[derive(Default)]
pub struct MockDriver {
    pub calls: Vec<DriverCall>,
    responses: VecDeque<MockResponse>,
    tables: Vec<MockTable>,
}

struct MockTable {
    name: String,
    columns: Vec<String>,
    auto_increment: Vec<String>,
}

impl MockDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer for the next query/execute call.
    #[must_use]
    pub fn respond(mut self, response: MockResponse) -> Self {
        self.responses.push_back(response);
        self
    }

    /// Register a table for catalog lookups.
    #[must_use]
    pub fn table<S: Into<String>>(
        mut self,
        name: &str,
        columns: impl IntoIterator<Item = S>,
        auto_increment: impl IntoIterator<Item = S>,
    ) -> Self {
        self.tables.push(MockTable {
            name: name.to_string(),
            columns: columns.into_iter().map(Into::into).collect(),
            auto_increment: auto_increment.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Count of query/execute calls (preparations excluded).
    #[must_use]
    pub fn executions(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| !matches!(call, DriverCall::Prepare(_)))
            .count()
    }
}

/// Build a result set from column names and rows of values, for scripting
/// mock responses.
#[must_use]
pub fn result_set<S: Into<String>>(
    columns: impl IntoIterator<Item = S>,
    rows: impl IntoIterator<Item = Vec<SqlValue>>,
) -> ResultSet {
    let mut rs = ResultSet::with_capacity(0);
    rs.set_columns(columns.into_iter().map(Into::into).collect());
    for row in rows {
        rs.push_row(row).expect("columns set above");
    }
    rs
}

#[async_trait]
impl StatementDriver for MockDriver {
    type Prepared = String;

    async fn prepare(&mut self, sql: &str) -> Result<Self::Prepared, SqlFacadeError> {
        self.calls.push(DriverCall::Prepare(sql.to_string()));
        Ok(sql.to_string())
    }

    async fn query(
        &mut self,
        prepared: &Self::Prepared,
        bindings: &BindingMap,
    ) -> Result<ResultSet, SqlFacadeError> {
        self.calls.push(DriverCall::Query {
            sql: prepared.clone(),
            bindings: bindings.clone(),
        });
        match self.responses.pop_front() {
            Some(MockResponse::Rows(rs)) => Ok(rs),
            Some(MockResponse::Fail(msg)) => Err(SqlFacadeError::ExecutionError(msg)),
            Some(MockResponse::Affected(_)) | None => Ok(ResultSet::default()),
        }
    }

    async fn execute(
        &mut self,
        prepared: &Self::Prepared,
        bindings: &BindingMap,
    ) -> Result<u64, SqlFacadeError> {
        self.calls.push(DriverCall::Execute {
            sql: prepared.clone(),
            bindings: bindings.clone(),
        });
        match self.responses.pop_front() {
            Some(MockResponse::Affected(count)) => Ok(count),
            Some(MockResponse::Fail(msg)) => Err(SqlFacadeError::ExecutionError(msg)),
            Some(MockResponse::Rows(rs)) => Ok(rs.rows_affected),
            None => Ok(0),
        }
    }
}

#[async_trait]
impl ColumnCatalog for MockDriver {
    async fn columns_of(&mut self, table: &str) -> Result<Vec<String>, SqlFacadeError> {
        Ok(self
            .tables
            .iter()
            .find(|t| t.name == table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn auto_increment_columns_of(
        &mut self,
        table: &str,
    ) -> Result<Vec<String>, SqlFacadeError> {
        Ok(self
            .tables
            .iter()
            .find(|t| t.name == table)
            .map(|t| t.auto_increment.clone())
            .unwrap_or_default())
    }
}

/// A reported failure, flattened for assertions.
#[derive(Debug, Clone)]
pub struct ReportedFailure {
    pub call_site: &'static str,
    pub sql: Option<String>,
    pub error: String,
}

/// Reporter double that keeps every context it sees.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub reports: Vec<ReportedFailure>,
}

impl ErrorReporter for RecordingReporter {
    fn report(&mut self, context: &ErrorContext<'_>) {
        self.reports.push(ReportedFailure {
            call_site: context.call_site,
            sql: context.sql.map(str::to_string),
            error: context.error.to_string(),
        });
    }
}
