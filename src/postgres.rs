use std::error::Error;

use async_trait::async_trait;
use bytes::BytesMut;
use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;
use tokio_postgres::Client;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

use crate::binding::{BindingMap, Marker};
use crate::catalog::ColumnCatalog;
use crate::driver::StatementDriver;
use crate::error::SqlFacadeError;
use crate::results::ResultSet;
use crate::translation::{PlaceholderStyle, bind_slots, rewrite_markers};
use crate::value::SqlValue;

/// Statement and catalog capabilities over an already-established
/// `tokio_postgres::Client`. The caller owns the connection task, TLS, and
/// any pooling.
pub struct PostgresDriver {
    client: Client,
}

/// A prepared handle: the server-side prepared statement (markers lowered to
/// `$N`) plus the marker slots in binding order.
pub struct PostgresPrepared {
    stmt: tokio_postgres::Statement,
    slots: Vec<Marker>,
}

impl PostgresDriver {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn into_inner(self) -> Client {
        self.client
    }

    /// Run a batch of semicolon-separated statements without bindings, e.g.
    /// schema setup.
    ///
    /// # Errors
    /// Any backend error from the batch.
    pub async fn batch(&mut self, sql: &str) -> Result<(), SqlFacadeError> {
        self.client.batch_execute(sql).await?;
        Ok(())
    }
}

#[async_trait]
impl StatementDriver for PostgresDriver {
    type Prepared = PostgresPrepared;

    async fn prepare(&mut self, sql: &str) -> Result<Self::Prepared, SqlFacadeError> {
        let rewritten = rewrite_markers(sql, PlaceholderStyle::Numbered);
        let stmt = self.client.prepare(&rewritten.sql).await?;
        Ok(PostgresPrepared {
            stmt,
            slots: rewritten.slots,
        })
    }

    async fn query(
        &mut self,
        prepared: &Self::Prepared,
        bindings: &BindingMap,
    ) -> Result<ResultSet, SqlFacadeError> {
        let values = bind_slots(&prepared.slots, bindings)?;
        let refs: Vec<&(dyn ToSql + Sync)> =
            values.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
        let rows = self.client.query(&prepared.stmt, &refs).await?;

        let column_names: Vec<String> = prepared
            .stmt
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();
        let column_count = column_names.len();

        let mut result_set = ResultSet::with_capacity(rows.len());
        result_set.set_columns(column_names);
        for row in rows {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(extract_value(&row, i)?);
            }
            result_set.push_row(values)?;
        }
        Ok(result_set)
    }

    async fn execute(
        &mut self,
        prepared: &Self::Prepared,
        bindings: &BindingMap,
    ) -> Result<u64, SqlFacadeError> {
        let values = bind_slots(&prepared.slots, bindings)?;
        let refs: Vec<&(dyn ToSql + Sync)> =
            values.iter().map(|v| v as &(dyn ToSql + Sync)).collect();
        let affected = self.client.execute(&prepared.stmt, &refs).await?;
        Ok(affected)
    }
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            SqlValue::Int(i) => (*i).to_sql(ty, out),
            SqlValue::Float(f) => (*f).to_sql(ty, out),
            SqlValue::Text(s) => s.to_sql(ty, out),
            SqlValue::Bool(b) => (*b).to_sql(ty, out),
            SqlValue::Timestamp(dt) => dt.to_sql(ty, out),
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Json(jsval) => jsval.to_sql(ty, out),
            SqlValue::Blob(bytes) => bytes.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        [
            Type::INT2,
            Type::INT4,
            Type::INT8,
            Type::FLOAT4,
            Type::FLOAT8,
            Type::TEXT,
            Type::VARCHAR,
            Type::CHAR,
            Type::NAME,
            Type::BOOL,
            Type::TIMESTAMP,
            Type::TIMESTAMPTZ,
            Type::DATE,
            Type::JSON,
            Type::JSONB,
            Type::BYTEA,
        ]
        .contains(ty)
    }

    to_sql_checked!();
}

/// Extract one cell by the column's reported type name.
fn extract_value(row: &tokio_postgres::Row, idx: usize) -> Result<SqlValue, SqlFacadeError> {
    let type_name = row.columns()[idx].type_().name();
    match type_name {
        "int2" => {
            let val: Option<i16> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, |v| SqlValue::Int(i64::from(v))))
        }
        "int4" => {
            let val: Option<i32> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, |v| SqlValue::Int(i64::from(v))))
        }
        "int8" => {
            let val: Option<i64> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, SqlValue::Int))
        }
        "float4" => {
            let val: Option<f32> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, |v| SqlValue::Float(f64::from(v))))
        }
        "float8" => {
            let val: Option<f64> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, SqlValue::Float))
        }
        "bool" => {
            let val: Option<bool> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, SqlValue::Bool))
        }
        "timestamp" | "timestamptz" => {
            let val: Option<NaiveDateTime> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, SqlValue::Timestamp))
        }
        "json" | "jsonb" => {
            let val: Option<JsonValue> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, SqlValue::Json))
        }
        "bytea" => {
            let val: Option<Vec<u8>> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, SqlValue::Blob))
        }
        // text, varchar, char, name, and anything else readable as text
        _ => {
            let val: Option<String> = row.try_get(idx)?;
            Ok(val.map_or(SqlValue::Null, SqlValue::Text))
        }
    }
}

#[async_trait]
impl ColumnCatalog for PostgresDriver {
    async fn columns_of(&mut self, table: &str) -> Result<Vec<String>, SqlFacadeError> {
        let rows = self
            .client
            .query(
                "SELECT column_name FROM information_schema.columns \
                 WHERE table_name = $1 ORDER BY ordinal_position",
                &[&table],
            )
            .await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    async fn auto_increment_columns_of(
        &mut self,
        table: &str,
    ) -> Result<Vec<String>, SqlFacadeError> {
        let rows = self
            .client
            .query(
                "SELECT column_name FROM information_schema.columns \
                 WHERE table_name = $1 \
                 AND (is_identity = 'YES' OR column_default LIKE 'nextval(%')",
                &[&table],
            )
            .await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }
}
