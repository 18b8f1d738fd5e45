use serde_json::Value as JsonValue;

use crate::binding::BindingMap;
use crate::error::SqlFacadeError;

/// Everything a reporter gets to see about one failure: the statement that
/// was in flight, its bindings, the error, and the facade operation that hit
/// it.
#[derive(Debug)]
pub struct ErrorContext<'a> {
    pub sql: Option<&'a str>,
    pub bindings: Option<&'a BindingMap>,
    pub error: &'a SqlFacadeError,
    pub call_site: &'static str,
}

/// Diagnostics sink invoked synchronously on every facade failure path.
/// Implementations must not fail.
pub trait ErrorReporter {
    fn report(&mut self, context: &ErrorContext<'_>);
}

/// Default reporter: one structured `tracing` error event per failure, with
/// the bindings rendered as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&mut self, context: &ErrorContext<'_>) {
        let bindings = context
            .bindings
            .map(|map| {
                let dump: Vec<JsonValue> = map
                    .iter()
                    .map(|(marker, value)| {
                        let mut entry = serde_json::Map::new();
                        entry.insert(marker.to_string(), JsonValue::from(value));
                        JsonValue::Object(entry)
                    })
                    .collect();
                JsonValue::Array(dump).to_string()
            })
            .unwrap_or_default();
        tracing::error!(
            call_site = context.call_site,
            sql = context.sql.unwrap_or(""),
            %bindings,
            error = %context.error,
            "sql facade operation failed"
        );
    }
}
