use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::SqlFacadeError;
use crate::value::SqlValue;

/// How a fetched row set is shaped before it reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// All columns, association by column name.
    #[default]
    Assoc,
    /// A single column, selected by zero-based index.
    Column(usize),
}

/// A single row: values plus shared column metadata.
///
/// Column names and the name-to-index map are shared across all rows of a
/// result set behind `Arc`s, so rows stay cheap to clone.
#[derive(Debug, Clone)]
pub struct DbRow {
    columns: Arc<Vec<String>>,
    values: Vec<SqlValue>,
    index: Arc<HashMap<String, usize>>,
}

impl DbRow {
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Value by column name, or None if the column does not exist.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.index.get(column).and_then(|idx| self.values.get(*idx))
    }

    /// Value by zero-based column index.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// The row as a JSON object keyed by column name.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let map: serde_json::Map<String, JsonValue> = self
            .columns
            .iter()
            .zip(&self.values)
            .map(|(name, value)| (name.clone(), JsonValue::from(value)))
            .collect();
        JsonValue::Object(map)
    }
}

/// An ordered row set with shared column metadata, plus the affected-row
/// count for DML results.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    columns: Option<Arc<Vec<String>>>,
    index: Option<Arc<HashMap<String, usize>>>,
    pub rows: Vec<DbRow>,
    pub rows_affected: u64,
}

impl ResultSet {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            columns: None,
            index: None,
            rows: Vec::with_capacity(capacity),
            rows_affected: 0,
        }
    }

    /// Set the column names shared by every row. Must be called before rows
    /// are added.
    pub fn set_columns(&mut self, columns: Vec<String>) {
        let index: HashMap<String, usize> = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        self.columns = Some(Arc::new(columns));
        self.index = Some(Arc::new(index));
    }

    #[must_use]
    pub fn column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.columns.as_ref()
    }

    /// Append a row of values in column order.
    ///
    /// # Errors
    /// `ExecutionError` if column names were never set.
    pub fn push_row(&mut self, values: Vec<SqlValue>) -> Result<(), SqlFacadeError> {
        let (columns, index) = match (&self.columns, &self.index) {
            (Some(columns), Some(index)) => (columns.clone(), index.clone()),
            _ => {
                return Err(SqlFacadeError::ExecutionError(
                    "row added before column names were set".to_string(),
                ));
            }
        };
        self.rows.push(DbRow {
            columns,
            values,
            index,
        });
        self.rows_affected += 1;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First column of the first row, if any row came back.
    #[must_use]
    pub fn scalar(&self) -> Option<&SqlValue> {
        self.rows.first().and_then(|row| row.get_by_index(0))
    }

    /// Reshape per the fetch mode. `Assoc` is the identity; `Column`
    /// projects a single column by index.
    ///
    /// # Errors
    /// `ParameterError` if the column index is out of range.
    pub fn project(self, mode: FetchMode) -> Result<ResultSet, SqlFacadeError> {
        match mode {
            FetchMode::Assoc => Ok(self),
            FetchMode::Column(idx) => {
                let name = self
                    .columns
                    .as_ref()
                    .and_then(|columns| columns.get(idx).cloned())
                    .ok_or_else(|| {
                        SqlFacadeError::ParameterError(format!(
                            "fetch column index {idx} out of range"
                        ))
                    })?;
                let mut projected = ResultSet::with_capacity(self.rows.len());
                projected.set_columns(vec![name]);
                for row in &self.rows {
                    let value = row.get_by_index(idx).cloned().ok_or_else(|| {
                        SqlFacadeError::ParameterError(format!(
                            "fetch column index {idx} out of range"
                        ))
                    })?;
                    projected.push_row(vec![value])?;
                }
                projected.rows_affected = self.rows_affected;
                Ok(projected)
            }
        }
    }

    /// The row set as a JSON array of objects.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.rows.iter().map(DbRow::to_json).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultSet {
        let mut rs = ResultSet::with_capacity(2);
        rs.set_columns(vec!["name".into(), "qty".into()]);
        rs.push_row(vec![SqlValue::Text("mango".into()), SqlValue::Int(7)])
            .unwrap();
        rs.push_row(vec![SqlValue::Text("kiwi".into()), SqlValue::Int(2)])
            .unwrap();
        rs
    }

    #[test]
    fn rows_associate_by_column_name() {
        let rs = sample();
        assert_eq!(rs.rows[0].get("name"), Some(&SqlValue::Text("mango".into())));
        assert_eq!(rs.rows[1].get("qty"), Some(&SqlValue::Int(2)));
        assert_eq!(rs.rows[0].get("missing"), None);
    }

    #[test]
    fn scalar_is_first_cell() {
        let rs = sample();
        assert_eq!(rs.scalar(), Some(&SqlValue::Text("mango".into())));
        assert_eq!(ResultSet::default().scalar(), None);
    }

    #[test]
    fn column_projection_keeps_row_order() {
        let rs = sample().project(FetchMode::Column(1)).unwrap();
        assert_eq!(rs.column_names().unwrap().as_slice(), ["qty".to_string()]);
        assert_eq!(rs.rows[0].get_by_index(0), Some(&SqlValue::Int(7)));
        assert_eq!(rs.rows[1].get_by_index(0), Some(&SqlValue::Int(2)));
    }

    #[test]
    fn projection_out_of_range_errors() {
        let err = sample().project(FetchMode::Column(9)).unwrap_err();
        assert!(matches!(err, SqlFacadeError::ParameterError(_)));
    }

    #[test]
    fn json_export_keys_by_column() {
        let rs = sample();
        let json = rs.to_json();
        assert_eq!(json[0]["name"], "mango");
        assert_eq!(json[1]["qty"], 2);
    }
}
