use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::binding::{BindingMap, BindingSupply, Marker, marker_name};
use crate::error::SqlFacadeError;
use crate::value::SqlValue;

/// A WHERE specification as callers hand it over: either one raw string or a
/// list of condition fragments.
///
/// The raw form is split on whole-word, case-insensitive `WHERE` and `AND`.
/// `OR`, parentheses, `IN`, `BETWEEN`, and `LIKE` are not supported; a
/// fragment that does not decompose into column/operator/value fails with
/// `MalformedCondition`.
#[derive(Debug, Clone)]
pub enum WhereSpec {
    Raw(String),
    List(Vec<String>),
}

impl WhereSpec {
    /// An empty specification; the statement is built without a WHERE clause.
    #[must_use]
    pub fn none() -> Self {
        WhereSpec::List(Vec::new())
    }
}

impl From<&str> for WhereSpec {
    fn from(raw: &str) -> Self {
        WhereSpec::Raw(raw.to_string())
    }
}

impl From<String> for WhereSpec {
    fn from(raw: String) -> Self {
        WhereSpec::Raw(raw)
    }
}

impl From<Vec<String>> for WhereSpec {
    fn from(list: Vec<String>) -> Self {
        WhereSpec::List(list)
    }
}

impl From<Vec<&str>> for WhereSpec {
    fn from(list: Vec<&str>) -> Self {
        WhereSpec::List(list.into_iter().map(str::to_string).collect())
    }
}

/// One parsed predicate, rewritten onto its resolved marker.
#[derive(Debug, Clone)]
pub(crate) struct Condition {
    pub(crate) column: String,
    pub(crate) operator: String,
    pub(crate) marker: Marker,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.operator, self.marker)
    }
}

static SPLITTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:where|and)\b").unwrap());

static CONDITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_.]*)\s*(!=|<=|>=|<>|[=<>!])\s*(.+)$").unwrap()
});

/// Parse a WHERE specification against the shared binding supply.
///
/// Conditions come back in the order given; their bound values are appended
/// to `map` under markers namespaced with `where_`.
pub(crate) fn parse_where(
    spec: &WhereSpec,
    supply: &mut BindingSupply,
    map: &mut BindingMap,
) -> Result<Vec<Condition>, SqlFacadeError> {
    let fragments: Vec<String> = match spec {
        WhereSpec::Raw(raw) => SPLITTER
            .split(raw)
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect(),
        WhereSpec::List(list) => list
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect(),
    };

    let mut conditions = Vec::with_capacity(fragments.len());
    for fragment in &fragments {
        let caps = CONDITION.captures(fragment).ok_or_else(|| {
            SqlFacadeError::MalformedCondition(fragment.clone())
        })?;
        let column = caps[1].to_string();
        let operator = caps[2].to_string();
        let token = interpret_value(caps[3].trim());

        let base = format!("where_{}", marker_name(&column));
        let (marker, value) = supply.resolve(&token, &base)?;
        map.push(marker.clone(), value);
        conditions.push(Condition {
            column,
            operator,
            marker,
        });
    }
    Ok(conditions)
}

/// Render parsed conditions back into SQL, or an empty string when there are
/// none.
pub(crate) fn render_where(conditions: &[Condition]) -> String {
    if conditions.is_empty() {
        return String::new();
    }
    let rendered: Vec<String> = conditions.iter().map(Condition::to_string).collect();
    format!("WHERE {}", rendered.join(" AND "))
}

/// Interpret the textual value expression of a condition.
///
/// Marker tokens (`?`, `:name`) pass through as text for the resolver to
/// recognize. Quoted text is unquoted, numeric/boolean/null literals are
/// typed, anything else stays text verbatim.
fn interpret_value(expr: &str) -> SqlValue {
    if let Some(inner) = expr
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        return SqlValue::Text(inner.replace("''", "'"));
    }
    if expr.eq_ignore_ascii_case("null") {
        return SqlValue::Null;
    }
    if expr.eq_ignore_ascii_case("true") {
        return SqlValue::Bool(true);
    }
    if expr.eq_ignore_ascii_case("false") {
        return SqlValue::Bool(false);
    }
    if let Ok(i) = expr.parse::<i64>() {
        return SqlValue::Int(i);
    }
    if let Ok(f) = expr.parse::<f64>() {
        return SqlValue::Float(f);
    }
    SqlValue::Text(expr.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Bindings;

    fn parse(spec: WhereSpec, bindings: Bindings) -> Result<(Vec<Condition>, BindingMap), SqlFacadeError> {
        let mut supply = BindingSupply::new(bindings);
        let mut map = BindingMap::new();
        let conditions = parse_where(&spec, &mut supply, &mut map)?;
        Ok((conditions, map))
    }

    #[test]
    fn raw_string_splits_on_where_and_and() {
        let (conditions, _) = parse(
            "WHERE name = 'mango' AND qty > 3".into(),
            Bindings::none(),
        )
        .unwrap();
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].column, "name");
        assert_eq!(conditions[0].operator, "=");
        assert_eq!(conditions[1].column, "qty");
        assert_eq!(conditions[1].operator, ">");
    }

    #[test]
    fn positional_placeholder_round_trips_to_named_marker() {
        let (conditions, map) = parse(
            WhereSpec::List(vec!["name = ?".into()]),
            Bindings::positional([SqlValue::Text("mango".into())]),
        )
        .unwrap();
        assert_eq!(conditions[0].to_string(), "name = :where_name");
        assert_eq!(map.get_named("where_name"), Some(&SqlValue::Text("mango".into())));
    }

    #[test]
    fn embedded_named_marker_is_kept() {
        let (conditions, map) = parse(
            WhereSpec::List(vec!["qty <= :limit".into()]),
            Bindings::named([("limit", SqlValue::Int(10))]),
        )
        .unwrap();
        assert_eq!(conditions[0].to_string(), "qty <= :limit");
        assert_eq!(map.get_named("limit"), Some(&SqlValue::Int(10)));
    }

    #[test]
    fn literals_are_typed() {
        let (_, map) = parse(
            WhereSpec::List(vec![
                "name = 'O''Brien'".into(),
                "qty != 4".into(),
                "ratio < 0.5".into(),
                "active = true".into(),
            ]),
            Bindings::none(),
        )
        .unwrap();
        assert_eq!(map.get_named("where_name"), Some(&SqlValue::Text("O'Brien".into())));
        assert_eq!(map.get_named("where_qty"), Some(&SqlValue::Int(4)));
        assert_eq!(map.get_named("where_ratio"), Some(&SqlValue::Float(0.5)));
        assert_eq!(map.get_named("where_active"), Some(&SqlValue::Bool(true)));
    }

    #[test]
    fn undecomposable_fragment_is_malformed() {
        let err = parse(
            WhereSpec::List(vec!["id IN (1, 2, 3)".into()]),
            Bindings::none(),
        )
        .unwrap_err();
        assert!(matches!(err, SqlFacadeError::MalformedCondition(_)));
    }

    #[test]
    fn order_is_preserved_and_rendered() {
        let (conditions, _) = parse(
            "b = 2 AND a = 1".into(),
            Bindings::none(),
        )
        .unwrap();
        assert_eq!(
            render_where(&conditions),
            "WHERE b = :where_b AND a = :where_a"
        );
    }

    #[test]
    fn empty_spec_renders_nothing() {
        let (conditions, map) = parse(WhereSpec::none(), Bindings::none()).unwrap();
        assert!(conditions.is_empty());
        assert!(map.is_empty());
        assert_eq!(render_where(&conditions), "");
    }

    #[test]
    fn qualified_column_gets_sanitized_marker() {
        let (conditions, _) = parse(
            WhereSpec::List(vec!["t.name = ?".into()]),
            Bindings::positional([SqlValue::Text("x".into())]),
        )
        .unwrap();
        assert_eq!(conditions[0].to_string(), "t.name = :where_t_name");
    }
}
