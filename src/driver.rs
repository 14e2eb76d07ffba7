//! The contract a database client must provide to back a [`QueryExecutor`].
//!
//! [`QueryExecutor`]: crate::executor::QueryExecutor

use crate::config::ConnectionParams;
use crate::error::SqlExecutorError;
use crate::results::ResultSet;
use crate::statement::PreparedStatement;
use crate::translation::PlaceholderStyle;
use crate::types::DatabaseType;

/// A single open database session.
///
/// Every call blocks until the driver answers. Errors from the database are
/// returned as `SqlExecutorError::QueryError` carrying the driver's code.
pub trait DriverConnection: Send {
    /// Short backend name used in log events.
    fn backend(&self) -> &'static str;

    /// Positional placeholder syntax the backend expects.
    fn placeholder_style(&self) -> PlaceholderStyle;

    /// Compile `query` for this backend.
    ///
    /// # Errors
    /// Returns a `QueryError` if the database rejects the statement.
    fn prepare(&mut self, query: &str) -> Result<PreparedStatement, SqlExecutorError>;

    /// Run a prepared statement with its bound values.
    ///
    /// Statements that return rows produce a populated [`ResultSet`]; others produce
    /// an empty one carrying the affected row count.
    ///
    /// # Errors
    /// Returns a `QueryError` on binding or execution failure.
    fn execute(&mut self, statement: &PreparedStatement) -> Result<ResultSet, SqlExecutorError>;

    /// # Errors
    /// Returns a `QueryError` if the database refuses to start a transaction.
    fn begin_transaction(&mut self) -> Result<(), SqlExecutorError>;

    /// # Errors
    /// Returns a `QueryError` if the commit fails.
    fn commit(&mut self) -> Result<(), SqlExecutorError>;

    /// # Errors
    /// Returns a `QueryError` if the rollback fails.
    fn rollback(&mut self) -> Result<(), SqlExecutorError>;

    /// Identifier of the last inserted row, as the driver reports it.
    ///
    /// # Errors
    /// Returns a `QueryError` if the driver cannot report one.
    fn last_insert_id(&mut self) -> Result<String, SqlExecutorError>;

    /// Apply the session character set (already upper-cased and validated).
    ///
    /// # Errors
    /// Returns an error if the backend does not support the character set.
    fn set_charset(&mut self, charset: &str) -> Result<(), SqlExecutorError>;
}

/// Open a driver connection for the backend named by `params.dbms`.
///
/// # Errors
/// Returns `SqlExecutorError::ConfigError` for unknown or disabled backends and
/// `SqlExecutorError::ConnectionError` if the driver cannot connect.
pub fn open(params: &ConnectionParams) -> Result<Box<dyn DriverConnection>, SqlExecutorError> {
    match params.database_type()? {
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => Ok(Box::new(crate::sqlite::SqliteConnection::open(params)?)),
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => Ok(Box::new(crate::postgres::PostgresConnection::open(
            params,
        )?)),
        #[allow(unreachable_patterns)]
        other => Err(SqlExecutorError::ConfigError(format!(
            "{other:?} support is not enabled in this build"
        ))),
    }
}
