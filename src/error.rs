use thiserror::Error;

/// SQLSTATE used when a driver failure carries no code of its own.
pub const GENERIC_ERROR_CODE: &str = "HY000";
/// SQLSTATE for parameter binding mismatches (unknown or missing placeholder).
pub const INVALID_PARAMETER_CODE: &str = "HY093";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlExecutorError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Transaction state error: {0}")]
    StateError(String),

    #[error("Query error [{code}]: {message}")]
    QueryError { code: String, message: String },
}

impl SqlExecutorError {
    /// Build a `QueryError` from a code and message.
    pub fn query(code: impl Into<String>, message: impl Into<String>) -> Self {
        SqlExecutorError::QueryError {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Build a `QueryError` for a placeholder that cannot be bound.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::query(INVALID_PARAMETER_CODE, message)
    }

    /// The driver code carried by a `QueryError`.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            SqlExecutorError::QueryError { code, .. } => Some(code),
            _ => None,
        }
    }

    /// The message without the variant prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            SqlExecutorError::ConnectionError(msg)
            | SqlExecutorError::ConfigError(msg)
            | SqlExecutorError::StateError(msg) => msg,
            SqlExecutorError::QueryError { message, .. } => message,
        }
    }

    #[must_use]
    pub fn is_query_error(&self) -> bool {
        matches!(self, SqlExecutorError::QueryError { .. })
    }

    #[must_use]
    pub fn is_state_error(&self) -> bool {
        matches!(self, SqlExecutorError::StateError(_))
    }

    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, SqlExecutorError::ConnectionError(_))
    }

    /// Re-wrap any error as a `QueryError`, keeping code and message.
    #[must_use]
    pub fn into_query_error(self) -> Self {
        match self {
            err @ SqlExecutorError::QueryError { .. } => err,
            other => Self::query(GENERIC_ERROR_CODE, other.message().to_string()),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for SqlExecutorError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match &err {
            rusqlite::Error::SqliteFailure(ffi_err, _) => ffi_err.extended_code.to_string(),
            _ => GENERIC_ERROR_CODE.to_string(),
        };
        SqlExecutorError::QueryError {
            code,
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for SqlExecutorError {
    fn from(err: tokio_postgres::Error) -> Self {
        let code = err
            .code()
            .map_or_else(|| GENERIC_ERROR_CODE.to_string(), |state| state.code().to_string());
        // `as_db_error` carries the server's message; the Display impl only says "db error".
        let message = err
            .as_db_error()
            .map_or_else(|| err.to_string(), |db| db.message().to_string());
        SqlExecutorError::QueryError { code, message }
    }
}
