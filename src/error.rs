use thiserror::Error;

#[cfg(feature = "sqlite")]
use rusqlite;
#[cfg(feature = "postgres")]
use tokio_postgres;

/// Unified error type for statement building, binding resolution, and
/// dispatch.
///
/// Driver failures surface through the transparent variants; everything the
/// core itself detects carries a message describing the offending input.
#[derive(Debug, Error)]
pub enum SqlFacadeError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Unresolved binding: {0}")]
    UnresolvedBinding(String),

    #[error("Malformed WHERE condition: {0}")]
    MalformedCondition(String),

    #[error("DELETE without WHERE clause: {0}")]
    MissingWhereClause(String),

    #[error("Unsupported command: {0}")]
    UnsupportedCommand(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}
