//! Convenient imports for common functionality.
//!
//! Re-exports the types most callers need to build statements and dispatch
//! them through a facade.

pub use crate::binding::{BindingMap, Bindings, Marker};
pub use crate::catalog::ColumnCatalog;
pub use crate::command::CommandClass;
pub use crate::dispatch::RunOutcome;
pub use crate::driver::StatementDriver;
pub use crate::error::SqlFacadeError;
pub use crate::facade::SqlFacade;
pub use crate::reporter::{ErrorReporter, TracingReporter};
pub use crate::results::{DbRow, FetchMode, ResultSet};
pub use crate::statement::{Statement, ValueMap, build_insert, build_update};
pub use crate::value::SqlValue;
pub use crate::where_clause::WhereSpec;

#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresDriver;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteDriver;
