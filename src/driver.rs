use async_trait::async_trait;

use crate::binding::BindingMap;
use crate::error::SqlFacadeError;
use crate::results::ResultSet;
use crate::value::SqlValue;

/// The statement capability of an underlying database client: prepare once,
/// then bind-and-run against the prepared handle.
///
/// `query` covers bind+execute+fetch-all, `query_scalar` fetch-scalar, and
/// `execute` bind+execute+row-count, so the dispatcher never touches driver
/// types directly and a test double can stand in for a real backend.
#[async_trait]
pub trait StatementDriver: Send {
    type Prepared: Send + Sync;

    /// Prepare a statement for later execution.
    ///
    /// # Errors
    /// Any preparation failure reported by the backend.
    async fn prepare(&mut self, sql: &str) -> Result<Self::Prepared, SqlFacadeError>;

    /// Bind, execute, and fetch the full row set.
    ///
    /// # Errors
    /// Binding or execution failures from the backend.
    async fn query(
        &mut self,
        prepared: &Self::Prepared,
        bindings: &BindingMap,
    ) -> Result<ResultSet, SqlFacadeError>;

    /// Bind, execute, and fetch the first column of the first row, if any.
    ///
    /// # Errors
    /// Binding or execution failures from the backend.
    async fn query_scalar(
        &mut self,
        prepared: &Self::Prepared,
        bindings: &BindingMap,
    ) -> Result<Option<SqlValue>, SqlFacadeError> {
        let result_set = self.query(prepared, bindings).await?;
        Ok(result_set.scalar().cloned())
    }

    /// Bind, execute, and return the number of rows affected.
    ///
    /// # Errors
    /// Binding or execution failures from the backend.
    async fn execute(
        &mut self,
        prepared: &Self::Prepared,
        bindings: &BindingMap,
    ) -> Result<u64, SqlFacadeError>;
}
