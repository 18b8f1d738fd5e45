use std::collections::VecDeque;
use std::fmt;

use crate::error::SqlFacadeError;
use crate::value::SqlValue;

/// A placeholder token in SQL text standing in for a bound value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Marker {
    /// Anonymous positional placeholder, rendered as `?`.
    Positional,
    /// Named placeholder, rendered as `:name`.
    Named(String),
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Positional => f.write_str("?"),
            Marker::Named(name) => write!(f, ":{name}"),
        }
    }
}

/// Caller-supplied bindings for one statement: an ordered positional pool
/// and/or named values looked up by marker.
///
/// ```rust
/// use sql_facade::{Bindings, SqlValue};
///
/// let by_position = Bindings::positional([SqlValue::Text("mango".into())]);
/// let by_name = Bindings::named([("qty", SqlValue::Int(3))]);
/// # let _ = (by_position, by_name);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    positional: Vec<SqlValue>,
    named: Vec<(String, SqlValue)>,
}

impl Bindings {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    pub fn positional<I>(values: I) -> Self
    where
        I: IntoIterator<Item = SqlValue>,
    {
        Self {
            positional: values.into_iter().collect(),
            named: Vec::new(),
        }
    }

    pub fn named<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, SqlValue)>,
        K: Into<String>,
    {
        Self {
            positional: Vec::new(),
            named: values
                .into_iter()
                .map(|(k, v)| (normalize_name(k.into()), v))
                .collect(),
        }
    }

    /// Append a positional value.
    #[must_use]
    pub fn push(mut self, value: SqlValue) -> Self {
        self.positional.push(value);
        self
    }

    /// Append a named value. A leading `:` on the name is accepted and
    /// stripped.
    #[must_use]
    pub fn bind(mut self, name: impl Into<String>, value: SqlValue) -> Self {
        self.named.push((normalize_name(name.into()), value));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

fn normalize_name(name: String) -> String {
    match name.strip_prefix(':') {
        Some(stripped) => stripped.to_string(),
        None => name,
    }
}

/// Ordered marker-to-value map owned by one built statement.
///
/// Entries keep the order in which markers were resolved; named lookup is
/// last-write-wins, matching map-overwrite semantics for duplicate names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingMap {
    entries: Vec<(Marker, SqlValue)>,
}

impl BindingMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, marker: Marker, value: SqlValue) {
        self.entries.push((marker, value));
    }

    #[must_use]
    pub fn get_named(&self, name: &str) -> Option<&SqlValue> {
        self.entries.iter().rev().find_map(|(marker, value)| match marker {
            Marker::Named(n) if n == name => Some(value),
            _ => None,
        })
    }

    /// Positional entries in insertion order.
    pub fn positional(&self) -> impl Iterator<Item = &SqlValue> {
        self.entries.iter().filter_map(|(marker, value)| match marker {
            Marker::Positional => Some(value),
            Marker::Named(_) => None,
        })
    }

    /// All entries, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(Marker, SqlValue)> {
        self.entries.iter()
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

impl From<Bindings> for BindingMap {
    /// Pass caller bindings through unchanged: positional entries first in
    /// their given order, then named entries in their given order.
    fn from(bindings: Bindings) -> Self {
        let mut map = BindingMap::new();
        for value in bindings.positional {
            map.push(Marker::Positional, value);
        }
        for (name, value) in bindings.named {
            map.push(Marker::Named(name), value);
        }
        map
    }
}

/// The mutable pool of caller bindings available while building one
/// statement: positional values are consumed FIFO, named values are looked up
/// by marker and may be referenced more than once.
#[derive(Debug)]
pub(crate) struct BindingSupply {
    positional: VecDeque<SqlValue>,
    named: Vec<(String, SqlValue)>,
}

impl BindingSupply {
    pub(crate) fn new(bindings: Bindings) -> Self {
        Self {
            positional: bindings.positional.into(),
            named: bindings.named,
        }
    }

    /// Resolve one value token into a marker and its bound value.
    ///
    /// A token that is itself a named marker (`:name`) is reused as-is and
    /// looked up in the named pool. The bare placeholder `?` consumes the next
    /// positional value and re-binds it under a marker synthesized from
    /// `base`. Anything else is a literal, bound under the synthesized marker
    /// directly.
    pub(crate) fn resolve(
        &mut self,
        token: &SqlValue,
        base: &str,
    ) -> Result<(Marker, SqlValue), SqlFacadeError> {
        if let Some(text) = token.as_text() {
            if let Some(name) = named_marker(text) {
                let value = self
                    .named
                    .iter()
                    .rev()
                    .find(|(n, _)| n == name)
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| {
                        SqlFacadeError::UnresolvedBinding(format!(
                            "no value supplied for marker :{name}"
                        ))
                    })?;
                return Ok((Marker::Named(name.to_string()), value));
            }
            if text == "?" {
                let value = self.positional.pop_front().ok_or_else(|| {
                    SqlFacadeError::UnresolvedBinding(format!(
                        "positional values exhausted at {base}"
                    ))
                })?;
                return Ok((Marker::Named(marker_name(base)), value));
            }
        }
        Ok((Marker::Named(marker_name(base)), token.clone()))
    }
}

/// Returns the identifier of a named-marker token, or None if the text is not
/// exactly one marker.
fn named_marker(text: &str) -> Option<&str> {
    let name = text.strip_prefix(':')?;
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    if chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some(name)
    } else {
        None
    }
}

/// Synthesize a marker identifier from a base name, mapping anything outside
/// `[A-Za-z0-9_]` to `_` so qualified columns like `t.col` stay legal.
pub(crate) fn marker_name(base: &str) -> String {
    base.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
