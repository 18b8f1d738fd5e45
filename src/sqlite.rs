use async_trait::async_trait;
use rusqlite::Connection;
use rusqlite::ToSql;
use rusqlite::types::{Value, ValueRef};

use crate::binding::{BindingMap, Marker};
use crate::catalog::ColumnCatalog;
use crate::driver::StatementDriver;
use crate::error::SqlFacadeError;
use crate::results::ResultSet;
use crate::translation::{PlaceholderStyle, bind_slots, rewrite_markers};
use crate::value::SqlValue;

/// Statement and catalog capabilities over an already-established
/// `rusqlite::Connection`. Opening the database, pragmas, and pooling stay
/// with the caller.
pub struct SqliteDriver {
    conn: Connection,
}

/// A prepared handle: the statement lowered to SQLite's anonymous
/// placeholders, plus the marker slots in binding order. Execution goes
/// through the connection's prepared-statement cache.
pub struct SqlitePrepared {
    sql: String,
    slots: Vec<Marker>,
}

impl SqliteDriver {
    #[must_use]
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    #[must_use]
    pub fn into_inner(self) -> Connection {
        self.conn
    }

    /// Run a batch of semicolon-separated statements without bindings, e.g.
    /// schema setup.
    ///
    /// # Errors
    /// Any SQLite error from the batch.
    pub fn batch(&mut self, sql: &str) -> Result<(), SqlFacadeError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

#[async_trait]
impl StatementDriver for SqliteDriver {
    type Prepared = SqlitePrepared;

    async fn prepare(&mut self, sql: &str) -> Result<Self::Prepared, SqlFacadeError> {
        let rewritten = rewrite_markers(sql, PlaceholderStyle::Anonymous);
        // Syntax check now; the cached statement serves later execution.
        self.conn.prepare_cached(&rewritten.sql)?;
        Ok(SqlitePrepared {
            sql: rewritten.sql,
            slots: rewritten.slots,
        })
    }

    async fn query(
        &mut self,
        prepared: &Self::Prepared,
        bindings: &BindingMap,
    ) -> Result<ResultSet, SqlFacadeError> {
        let params = convert_params(&bind_slots(&prepared.slots, bindings)?);
        let mut stmt = self.conn.prepare_cached(&prepared.sql)?;
        build_result_set(&mut stmt, &params)
    }

    async fn execute(
        &mut self,
        prepared: &Self::Prepared,
        bindings: &BindingMap,
    ) -> Result<u64, SqlFacadeError> {
        let params = convert_params(&bind_slots(&prepared.slots, bindings)?);
        let mut stmt = self.conn.prepare_cached(&prepared.sql)?;
        let affected = stmt.execute(rusqlite::params_from_iter(params))?;
        Ok(affected as u64)
    }
}

/// Bind facade values to SQLite types.
fn convert_params(values: &[SqlValue]) -> Vec<Value> {
    values
        .iter()
        .map(|value| match value {
            SqlValue::Int(i) => Value::Integer(*i),
            SqlValue::Float(f) => Value::Real(*f),
            SqlValue::Text(s) => Value::Text(s.to_string()),
            SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
            SqlValue::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
            SqlValue::Null => Value::Null,
            SqlValue::Json(jsval) => Value::Text(jsval.to_string()),
            SqlValue::Blob(bytes) => Value::Blob(bytes.to_vec()),
        })
        .collect()
}

fn extract_value(row: &rusqlite::Row, idx: usize) -> Result<SqlValue, SqlFacadeError> {
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(SqlValue::Null),
        ValueRef::Integer(i) => Ok(SqlValue::Int(i)),
        ValueRef::Real(f) => Ok(SqlValue::Float(f)),
        ValueRef::Text(bytes) => Ok(SqlValue::Text(String::from_utf8_lossy(bytes).into_owned())),
        ValueRef::Blob(b) => Ok(SqlValue::Blob(b.to_vec())),
    }
}

fn build_result_set(
    stmt: &mut rusqlite::CachedStatement<'_>,
    params: &[Value],
) -> Result<ResultSet, SqlFacadeError> {
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
    let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    let column_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(0);
    result_set.set_columns(column_names);

    let mut rows = stmt.query(&param_refs[..])?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(column_count);
        for i in 0..column_count {
            values.push(extract_value(row, i)?);
        }
        result_set.push_row(values)?;
    }
    Ok(result_set)
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[async_trait]
impl ColumnCatalog for SqliteDriver {
    async fn columns_of(&mut self, table: &str) -> Result<Vec<String>, SqlFacadeError> {
        let sql = format!("PRAGMA table_info({})", quote_ident(table));
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            columns.push(row.get::<_, String>(1)?);
        }
        Ok(columns)
    }

    async fn auto_increment_columns_of(
        &mut self,
        table: &str,
    ) -> Result<Vec<String>, SqlFacadeError> {
        let sql = format!("PRAGMA table_info({})", quote_ident(table));
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut primary: Vec<(String, String)> = Vec::new();
        while let Some(row) = rows.next()? {
            let pk: i64 = row.get(5)?;
            if pk > 0 {
                primary.push((row.get::<_, String>(1)?, row.get::<_, String>(2)?));
            }
        }
        // A lone INTEGER primary key aliases the rowid and auto-assigns.
        match primary.as_slice() {
            [(name, col_type)] if col_type.eq_ignore_ascii_case("integer") => {
                Ok(vec![name.clone()])
            }
            _ => Ok(Vec::new()),
        }
    }
}
