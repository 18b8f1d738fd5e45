//! Statement building, binding resolution, and command dispatch over SQL
//! database clients.
//!
//! The crate turns column/value maps and loosely-specified WHERE clauses
//! into parameterized INSERT/UPDATE statements, reconciles positional and
//! named bindings into one canonical map, and funnels execution through a
//! dispatcher that classifies each command, refuses DELETEs without a WHERE
//! clause, and normalizes the result shape (rows, affected count, or success
//! flag).
//!
//! ```rust
//! use sql_facade::{Bindings, ValueMap, build_insert};
//!
//! let values = ValueMap::new().set("name", "mango").set("qty", 7i64);
//! let stmt = build_insert("fruits", &values, Bindings::none())?;
//! assert_eq!(stmt.sql, "INSERT INTO fruits (name, qty) VALUES (?, ?)");
//! assert_eq!(stmt.bindings.len(), 2);
//! # Ok::<(), sql_facade::SqlFacadeError>(())
//! ```
//!
//! Execution goes through the [`StatementDriver`] capability; `SqliteDriver`
//! (feature `sqlite`) and `PostgresDriver` (feature `postgres`) adapt
//! `rusqlite` and `tokio-postgres` connections, and the `test-utils` feature
//! provides a scripted mock.

mod binding;
mod command;
mod dispatch;
mod error;
mod facade;
mod reporter;
mod results;
mod statement;
mod value;
mod where_clause;

pub mod catalog;
pub mod driver;
pub mod translation;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "test-utils")]
pub mod test_utils;

pub mod prelude;

pub use binding::{BindingMap, Bindings, Marker};
pub use catalog::{ColumnCatalog, filter_values};
pub use command::{CommandClass, contains_keyword};
pub use dispatch::{RunOutcome, run};
pub use driver::StatementDriver;
pub use error::SqlFacadeError;
pub use facade::SqlFacade;
pub use reporter::{ErrorContext, ErrorReporter, TracingReporter};
pub use results::{DbRow, FetchMode, ResultSet};
pub use statement::{Statement, ValueMap, build_insert, build_update};
pub use value::SqlValue;
pub use where_clause::WhereSpec;

#[cfg(feature = "postgres")]
pub use postgres::PostgresDriver;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDriver;
