use tracing::debug;

use crate::binding::{BindingMap, Bindings};
use crate::catalog::{ColumnCatalog, filter_values};
use crate::dispatch::{RunOutcome, run};
use crate::driver::StatementDriver;
use crate::error::SqlFacadeError;
use crate::reporter::{ErrorContext, ErrorReporter, TracingReporter};
use crate::results::{FetchMode, ResultSet};
use crate::statement::{Statement, ValueMap, build_insert, build_update};
use crate::value::SqlValue;
use crate::where_clause::WhereSpec;

/// The convenience surface: thin orchestrators over the catalog, the
/// statement builder, and the dispatcher, all sharing one driver.
///
/// Every failure is handed to the [`ErrorReporter`] before the operation
/// returns it, and the statement in flight is kept for diagnostics: written
/// at the start of each operation, read only if that same operation fails.
///
/// ```rust,no_run
/// # #[cfg(feature = "sqlite")]
/// # async fn demo() -> Result<(), sql_facade::SqlFacadeError> {
/// use sql_facade::{Bindings, SqlFacade, SqliteDriver, ValueMap};
///
/// let conn = rusqlite::Connection::open_in_memory()?;
/// let mut db = SqlFacade::new(SqliteDriver::new(conn));
///
/// let values = ValueMap::new().set("name", "mango").set("qty", 7i64);
/// let inserted = db.insert("fruits", values, Bindings::none()).await?;
/// assert_eq!(inserted, 1);
/// # Ok(()) }
/// ```
pub struct SqlFacade<D, R = TracingReporter> {
    driver: D,
    reporter: R,
    last_sql: Option<String>,
    last_bindings: Option<BindingMap>,
}

impl<D: StatementDriver> SqlFacade<D> {
    /// Wrap a driver with the default tracing-backed reporter.
    pub fn new(driver: D) -> Self {
        Self::with_reporter(driver, TracingReporter)
    }
}

impl<D: StatementDriver, R: ErrorReporter> SqlFacade<D, R> {
    pub fn with_reporter(driver: D, reporter: R) -> Self {
        Self {
            driver,
            reporter,
            last_sql: None,
            last_bindings: None,
        }
    }

    /// The statement most recently handed to the driver by this facade, if
    /// the current or previous operation got that far.
    #[must_use]
    pub fn last_statement(&self) -> Option<(&str, &BindingMap)> {
        match (&self.last_sql, &self.last_bindings) {
            (Some(sql), Some(bindings)) => Some((sql.as_str(), bindings)),
            _ => None,
        }
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[must_use]
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    #[must_use]
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Execute a SELECT and fetch all rows, association by column name.
    ///
    /// # Errors
    /// Driver preparation/execution failures, reported before returning.
    pub async fn select(
        &mut self,
        sql: &str,
        bindings: Bindings,
    ) -> Result<ResultSet, SqlFacadeError> {
        self.select_as(sql, bindings, FetchMode::Assoc).await
    }

    /// Execute a SELECT and fetch all rows in the requested shape.
    ///
    /// # Errors
    /// Driver failures or an out-of-range fetch column, reported before
    /// returning.
    pub async fn select_as(
        &mut self,
        sql: &str,
        bindings: Bindings,
        mode: FetchMode,
    ) -> Result<ResultSet, SqlFacadeError> {
        let statement = Statement::new(sql, bindings);
        self.begin(Some(&statement));
        let fetched = self.fetch_all(&statement).await;
        fetched
            .and_then(|rows| rows.project(mode))
            .map_err(|e| self.report(e, "select"))
    }

    /// Execute a SELECT and fetch the first column of the first row.
    /// `Ok(None)` when no row came back.
    ///
    /// # Errors
    /// Driver preparation/execution failures, reported before returning.
    pub async fn select_cell(
        &mut self,
        sql: &str,
        bindings: Bindings,
    ) -> Result<Option<SqlValue>, SqlFacadeError> {
        let statement = Statement::new(sql, bindings);
        self.begin(Some(&statement));
        let scalar = async {
            let prepared = self.driver.prepare(&statement.sql).await?;
            self.driver
                .query_scalar(&prepared, &statement.bindings)
                .await
        }
        .await;
        scalar.map_err(|e| self.report(e, "select_cell"))
    }

    /// Filter the value map against the schema, build an INSERT, and
    /// dispatch it. Returns rows affected.
    ///
    /// # Errors
    /// Builder or driver failures, reported before returning.
    pub async fn insert(
        &mut self,
        table: &str,
        values: ValueMap,
        bindings: Bindings,
    ) -> Result<u64, SqlFacadeError>
    where
        D: ColumnCatalog,
    {
        self.begin(None);
        let outcome = async {
            let filtered = filter_values(&mut self.driver, table, values).await?;
            let statement = build_insert(table, &filtered, bindings)?;
            self.track(&statement);
            debug!(sql = %statement.sql, "dispatching insert");
            run(&mut self.driver, &statement).await?.into_affected()
        }
        .await;
        outcome.map_err(|e| self.report(e, "insert"))
    }

    /// Filter the value map against the schema, build an UPDATE with the
    /// given WHERE specification, and dispatch it. Returns rows affected.
    ///
    /// # Errors
    /// Builder or driver failures, reported before returning.
    pub async fn update(
        &mut self,
        table: &str,
        values: ValueMap,
        where_spec: impl Into<WhereSpec>,
        bindings: Bindings,
    ) -> Result<u64, SqlFacadeError>
    where
        D: ColumnCatalog,
    {
        self.begin(None);
        let where_spec = where_spec.into();
        let outcome = async {
            let filtered = filter_values(&mut self.driver, table, values).await?;
            let statement = build_update(table, &filtered, &where_spec, bindings)?;
            self.track(&statement);
            debug!(sql = %statement.sql, "dispatching update");
            run(&mut self.driver, &statement).await?.into_affected()
        }
        .await;
        outcome.map_err(|e| self.report(e, "update"))
    }

    /// Dispatch caller-supplied DELETE SQL. The WHERE-clause guard applies.
    /// Returns rows affected.
    ///
    /// # Errors
    /// `MissingWhereClause` or driver failures, reported before returning.
    pub async fn delete(
        &mut self,
        sql: &str,
        bindings: Bindings,
    ) -> Result<u64, SqlFacadeError> {
        let statement = Statement::new(sql, bindings);
        self.begin(Some(&statement));
        let outcome = run(&mut self.driver, &statement)
            .await
            .and_then(RunOutcome::into_affected);
        outcome.map_err(|e| self.report(e, "delete"))
    }

    /// Dispatch an arbitrary statement through classification, guards, and
    /// result-shape mapping.
    ///
    /// # Errors
    /// Guard or driver failures, reported before returning.
    pub async fn run(&mut self, statement: &Statement) -> Result<RunOutcome, SqlFacadeError> {
        self.begin(Some(statement));
        run(&mut self.driver, statement)
            .await
            .map_err(|e| self.report(e, "run"))
    }

    async fn fetch_all(&mut self, statement: &Statement) -> Result<ResultSet, SqlFacadeError> {
        let prepared = self.driver.prepare(&statement.sql).await?;
        self.driver.query(&prepared, &statement.bindings).await
    }

    fn begin(&mut self, statement: Option<&Statement>) {
        self.last_sql = None;
        self.last_bindings = None;
        if let Some(statement) = statement {
            self.track(statement);
        }
    }

    fn track(&mut self, statement: &Statement) {
        self.last_sql = Some(statement.sql.clone());
        self.last_bindings = Some(statement.bindings.clone());
    }

    fn report(&mut self, error: SqlFacadeError, call_site: &'static str) -> SqlFacadeError {
        let context = ErrorContext {
            sql: self.last_sql.as_deref(),
            bindings: self.last_bindings.as_ref(),
            error: &error,
            call_site,
        };
        self.reporter.report(&context);
        error
    }
}
