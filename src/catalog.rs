use async_trait::async_trait;

use crate::error::SqlFacadeError;
use crate::statement::ValueMap;

/// Schema-introspection capability used to validate caller-supplied column
/// names before SQL is built.
#[async_trait]
pub trait ColumnCatalog {
    /// All column names of the table.
    ///
    /// # Errors
    /// Backend failures while introspecting the schema.
    async fn columns_of(&mut self, table: &str) -> Result<Vec<String>, SqlFacadeError>;

    /// The auto-increment (or identity) column names of the table.
    ///
    /// # Errors
    /// Backend failures while introspecting the schema.
    async fn auto_increment_columns_of(
        &mut self,
        table: &str,
    ) -> Result<Vec<String>, SqlFacadeError>;
}

/// Drop unknown and auto-increment columns from a value map, preserving the
/// caller's column order.
///
/// # Errors
/// Propagates catalog introspection failures.
pub async fn filter_values<C>(
    catalog: &mut C,
    table: &str,
    mut values: ValueMap,
) -> Result<ValueMap, SqlFacadeError>
where
    C: ColumnCatalog + ?Sized,
{
    let columns = catalog.columns_of(table).await?;
    let auto = catalog.auto_increment_columns_of(table).await?;
    values.retain(|column| {
        columns.iter().any(|c| c == column) && !auto.iter().any(|c| c == column)
    });
    Ok(values)
}
