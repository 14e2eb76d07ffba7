use std::fmt;

use tracing::trace;

use super::config::{open_database, sqlite_encoding};
use super::params::row_value_to_sqlite_value;
use super::query::build_result_set;
use crate::config::ConnectionParams;
use crate::driver::DriverConnection;
use crate::error::SqlExecutorError;
use crate::results::ResultSet;
use crate::statement::PreparedStatement;
use crate::translation::PlaceholderStyle;

/// `SQLite` session owned by a single executor.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    /// Open the database named by `params.dbname`.
    ///
    /// # Errors
    /// Returns `SqlExecutorError::ConnectionError` if the database cannot be opened.
    pub fn open(params: &ConnectionParams) -> Result<Self, SqlExecutorError> {
        Ok(Self {
            conn: open_database(params)?,
        })
    }

    /// Wrap an already open rusqlite connection.
    #[must_use]
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Borrow the underlying rusqlite connection.
    #[must_use]
    pub fn raw(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.conn.path())
            .field("autocommit", &self.conn.is_autocommit())
            .finish()
    }
}

impl DriverConnection for SqliteConnection {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Sqlite
    }

    fn prepare(&mut self, query: &str) -> Result<PreparedStatement, SqlExecutorError> {
        let statement = PreparedStatement::new(query, self.placeholder_style());
        // Compile once so syntax errors surface at prepare time; the cache keeps it for execute.
        self.conn.prepare_cached(statement.native_sql())?;
        Ok(statement)
    }

    fn execute(&mut self, statement: &PreparedStatement) -> Result<ResultSet, SqlExecutorError> {
        let values = statement.positional_values()?;
        let mut stmt = self.conn.prepare_cached(statement.native_sql())?;

        let expected = stmt.parameter_count();
        if expected != values.len() {
            return Err(SqlExecutorError::invalid_parameter(format!(
                "statement expects {expected} parameter(s) but {} were bound",
                values.len()
            )));
        }
        for (idx, value) in values.iter().enumerate() {
            stmt.raw_bind_parameter(idx + 1, row_value_to_sqlite_value(value))?;
        }

        trace!(sql = statement.native_sql(), params = values.len(), "sqlite execute");
        if stmt.column_count() > 0 {
            build_result_set(&mut stmt)
        } else {
            let affected = stmt.raw_execute()?;
            Ok(ResultSet::affected(affected))
        }
    }

    fn begin_transaction(&mut self) -> Result<(), SqlExecutorError> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SqlExecutorError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), SqlExecutorError> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn last_insert_id(&mut self) -> Result<String, SqlExecutorError> {
        Ok(self.conn.last_insert_rowid().to_string())
    }

    fn set_charset(&mut self, charset: &str) -> Result<(), SqlExecutorError> {
        let encoding = sqlite_encoding(charset)?;
        self.conn.pragma_update(None, "encoding", encoding)?;
        Ok(())
    }
}
