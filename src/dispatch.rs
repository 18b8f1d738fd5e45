use crate::command::{CommandClass, contains_keyword};
use crate::driver::StatementDriver;
use crate::error::SqlFacadeError;
use crate::results::ResultSet;
use crate::statement::Statement;

/// The normalized result of dispatching one statement, shaped by its command
/// class.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Read commands: the full ordered row set.
    Rows(ResultSet),
    /// DML commands: rows affected.
    Affected(u64),
    /// DDL commands: success flag.
    Done(bool),
}

impl RunOutcome {
    /// Unwrap the affected-row count of a DML outcome.
    ///
    /// # Errors
    /// `ExecutionError` if the statement dispatched to a different shape.
    pub fn into_affected(self) -> Result<u64, SqlFacadeError> {
        match self {
            RunOutcome::Affected(count) => Ok(count),
            other => Err(SqlFacadeError::ExecutionError(format!(
                "expected an affected-row count, got {other:?}"
            ))),
        }
    }

    /// Unwrap the row set of a read outcome.
    ///
    /// # Errors
    /// `ExecutionError` if the statement dispatched to a different shape.
    pub fn into_rows(self) -> Result<ResultSet, SqlFacadeError> {
        match self {
            RunOutcome::Rows(rows) => Ok(rows),
            other => Err(SqlFacadeError::ExecutionError(format!(
                "expected a row set, got {other:?}"
            ))),
        }
    }
}

/// Dispatch one statement: classify, enforce the DELETE guard, execute via
/// the driver, and map the command class onto a result shape.
///
/// Both guard failures happen before any driver call, so an unsupported or
/// unguarded statement never reaches the backend. Execution failures are not
/// retried.
///
/// # Errors
/// `MissingWhereClause` for a DELETE with no `where` keyword,
/// `UnsupportedCommand` when no recognized keyword appears, and any driver
/// error from preparation or execution.
pub async fn run<D: StatementDriver>(
    driver: &mut D,
    statement: &Statement,
) -> Result<RunOutcome, SqlFacadeError> {
    let class = CommandClass::classify(&statement.sql);
    if class == CommandClass::Delete && !contains_keyword(&statement.sql, "where") {
        return Err(SqlFacadeError::MissingWhereClause(statement.sql.clone()));
    }
    if class == CommandClass::Unsupported {
        return Err(SqlFacadeError::UnsupportedCommand(statement.sql.clone()));
    }

    let prepared = driver.prepare(&statement.sql).await?;
    match class {
        CommandClass::Read => {
            let rows = driver.query(&prepared, &statement.bindings).await?;
            Ok(RunOutcome::Rows(rows))
        }
        CommandClass::Delete | CommandClass::Insert | CommandClass::Update => {
            let affected = driver.execute(&prepared, &statement.bindings).await?;
            Ok(RunOutcome::Affected(affected))
        }
        CommandClass::Ddl => {
            driver.execute(&prepared, &statement.bindings).await?;
            Ok(RunOutcome::Done(true))
        }
        CommandClass::Unsupported => {
            Err(SqlFacadeError::UnsupportedCommand(statement.sql.clone()))
        }
    }
}
