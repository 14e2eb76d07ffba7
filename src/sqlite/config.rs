use rusqlite::{Connection, OpenFlags};

use crate::config::ConnectionParams;
use crate::error::SqlExecutorError;

/// Open the database named by `dbname` (a file path, `:memory:` or a `file:` URI).
///
/// # Errors
/// Returns `SqlExecutorError::ConnectionError` if the file cannot be opened.
pub fn open_database(params: &ConnectionParams) -> Result<Connection, SqlExecutorError> {
    let path = params.dbname.trim();
    if path.is_empty() {
        return Err(SqlExecutorError::ConnectionError(format!(
            "no database path in {}",
            params.dsn()
        )));
    }
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Connection::open_with_flags(path, flags).map_err(|e| {
        SqlExecutorError::ConnectionError(format!("failed to open {}: {e}", params.dsn()))
    })
}

/// Map a charset name to the value `PRAGMA encoding` understands.
///
/// # Errors
/// Returns `SqlExecutorError::ConnectionError` for encodings `SQLite` cannot store.
pub fn sqlite_encoding(charset: &str) -> Result<&'static str, SqlExecutorError> {
    match charset.replace(['-', '_'], "").as_str() {
        "UTF8" => Ok("UTF-8"),
        "UTF16" => Ok("UTF-16"),
        "UTF16LE" => Ok("UTF-16le"),
        "UTF16BE" => Ok("UTF-16be"),
        other => Err(SqlExecutorError::ConnectionError(format!(
            "SQLite does not support charset {other}"
        ))),
    }
}
