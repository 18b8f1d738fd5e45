use crate::binding::{BindingMap, BindingSupply, Bindings, Marker, marker_name};
use crate::error::SqlFacadeError;
use crate::value::SqlValue;
use crate::where_clause::{WhereSpec, parse_where, render_where};

/// Ordered column/value pairs for INSERT and UPDATE building.
///
/// Iteration order is insertion order; setting an existing column replaces
/// its value in place. The generated SQL lists columns in exactly this order.
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    entries: Vec<(String, SqlValue)>,
}

impl ValueMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        let column = column.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(c, _)| *c == column) {
            entry.1 = value;
        } else {
            self.entries.push((column, value));
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, SqlValue)> {
        self.entries.iter()
    }

    /// Keep only entries whose column passes the predicate, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|(column, _)| keep(column));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(ValueMap::new(), |map, (k, v)| map.set(k, v))
    }
}

/// Final SQL text plus its binding map, immutable once built.
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub bindings: BindingMap,
}

impl Statement {
    /// Wrap caller-supplied SQL with pass-through bindings, for the paths
    /// that skip the builder (select, delete, raw dispatch).
    #[must_use]
    pub fn new(sql: impl Into<String>, bindings: Bindings) -> Self {
        Self {
            sql: sql.into(),
            bindings: bindings.into(),
        }
    }
}

/// Build `INSERT INTO <table> (<cols>) VALUES (<markers>)`.
///
/// With no caller bindings, each column value is a literal bound to a fresh
/// positional marker, in column order. With caller bindings, every value must
/// already be a marker token; tokens are emitted verbatim and the bindings
/// pass through unchanged.
///
/// # Errors
/// `ParameterError` if the value map is empty, or if bindings were supplied
/// and a value is not a marker token.
pub fn build_insert(
    table: &str,
    values: &ValueMap,
    bindings: Bindings,
) -> Result<Statement, SqlFacadeError> {
    if values.is_empty() {
        return Err(SqlFacadeError::ParameterError(format!(
            "no insertable columns for table {table}"
        )));
    }

    let columns: Vec<&str> = values.iter().map(|(c, _)| c.as_str()).collect();
    let mut map = BindingMap::new();
    let markers: Vec<String> = if bindings.is_empty() {
        values
            .iter()
            .map(|(_, value)| {
                map.push(Marker::Positional, value.clone());
                Marker::Positional.to_string()
            })
            .collect()
    } else {
        let mut tokens = Vec::with_capacity(values.len());
        for (column, value) in values.iter() {
            let token = value.as_text().ok_or_else(|| {
                SqlFacadeError::ParameterError(format!(
                    "value for column {column} must be a marker token when bindings are supplied"
                ))
            })?;
            tokens.push(token.to_string());
        }
        map = bindings.into();
        tokens
    };

    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        markers.join(", ")
    );
    Ok(Statement { sql, bindings: map })
}

/// Build `UPDATE <table> SET <assignments>[ WHERE <conditions>]`.
///
/// SET assignments resolve through the binding supply first (synthesized
/// markers take the column's name), then the WHERE specification consumes the
/// same supply, so positional values feed columns before conditions, left to
/// right.
///
/// # Errors
/// `ParameterError` on an empty value map, `UnresolvedBinding` when the
/// supply runs dry or a named marker has no value, `MalformedCondition` for
/// WHERE fragments that do not decompose.
pub fn build_update(
    table: &str,
    values: &ValueMap,
    where_spec: &WhereSpec,
    bindings: Bindings,
) -> Result<Statement, SqlFacadeError> {
    if values.is_empty() {
        return Err(SqlFacadeError::ParameterError(format!(
            "no updatable columns for table {table}"
        )));
    }

    let mut supply = BindingSupply::new(bindings);
    let mut map = BindingMap::new();

    let mut assignments = Vec::with_capacity(values.len());
    for (column, value) in values.iter() {
        let (marker, bound) = supply.resolve(value, &marker_name(column))?;
        map.push(marker.clone(), bound);
        assignments.push(format!("{column} = {marker}"));
    }

    let conditions = parse_where(where_spec, &mut supply, &mut map)?;

    let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
    let where_sql = render_where(&conditions);
    if !where_sql.is_empty() {
        sql.push(' ');
        sql.push_str(&where_sql);
    }
    Ok(Statement { sql, bindings: map })
}
