//! A blocking query executor for `SQLite` and `PostgreSQL`.
//!
//! Queries use named `:name` placeholders bound from [`Attributes`]. Inside a
//! transaction, writes are queued and replayed in order at commit; the first
//! failure rolls the whole batch back.

pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod params;
pub mod prelude;
pub mod results;
pub mod statement;
pub mod translation;
pub mod types;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConnectionParams, ConnectionParamsBuilder};
pub use driver::DriverConnection;
pub use error::SqlExecutorError;
pub use executor::{ExecutorOptions, QueryExecutor, ReplayPolicy, TransactionState};
pub use params::Attributes;
pub use results::{AssocRow, CustomDbRow, FetchedRow, ResultSet};
pub use statement::PreparedStatement;
pub use types::{DatabaseType, FetchShape, RowValues};
