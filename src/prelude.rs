//! Convenient imports for common functionality.

pub use crate::attributes;
pub use crate::config::{ConnectionParams, ConnectionParamsBuilder};
pub use crate::driver::DriverConnection;
pub use crate::error::SqlExecutorError;
pub use crate::executor::{ExecutorOptions, QueryExecutor, ReplayPolicy, TransactionState};
pub use crate::params::Attributes;
pub use crate::results::{AssocRow, CustomDbRow, FetchedRow, ResultSet};
pub use crate::statement::PreparedStatement;
pub use crate::translation::{PlaceholderStyle, translate_named_placeholders};
pub use crate::types::{DatabaseType, FetchShape, RowValues};

#[cfg(feature = "postgres")]
pub use crate::postgres::PostgresConnection;
#[cfg(feature = "sqlite")]
pub use crate::sqlite::SqliteConnection;
