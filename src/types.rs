use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde_json::Value as JsonValue;

use crate::error::SqlExecutorError;

/// Values that can be stored in a database row or bound as query parameters.
///
/// The same enum is used by every backend so callers never touch driver types:
/// ```rust
/// use sql_executor::prelude::*;
///
/// let values = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::from(true),
/// ];
/// # let _ = values;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // Try "YYYY-MM-DD HH:MM:SS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            // Try "YYYY-MM-DD HH:MM:SS.SSS"
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Render the value the way a string-typed driver would hand it back.
    ///
    /// `Null` renders as `None`; blobs are decoded lossily.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            RowValues::Int(i) => Some(i.to_string()),
            RowValues::Float(f) => Some(f.to_string()),
            RowValues::Text(s) => Some(s.clone()),
            RowValues::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            RowValues::Timestamp(dt) => Some(dt.format("%F %T%.f").to_string()),
            RowValues::Null => None,
            RowValues::JSON(v) => Some(v.to_string()),
            RowValues::Blob(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<i32> for RowValues {
    fn from(value: i32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_string())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<NaiveDateTime> for RowValues {
    fn from(value: NaiveDateTime) -> Self {
        RowValues::Timestamp(value)
    }
}

impl From<JsonValue> for RowValues {
    fn from(value: JsonValue) -> Self {
        RowValues::JSON(value)
    }
}

impl From<Vec<u8>> for RowValues {
    fn from(value: Vec<u8>) -> Self {
        RowValues::Blob(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

/// The database engine named by the `dbms` connection parameter.
///
/// Parsing is case-insensitive and accepts the common driver aliases:
/// ```rust
/// use sql_executor::prelude::*;
///
/// assert_eq!(DatabaseType::from_dbms("pgsql").unwrap(), DatabaseType::Postgres);
/// assert_eq!(DatabaseType::from_dbms("SQLite").unwrap(), DatabaseType::Sqlite);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DatabaseType {
    /// `PostgreSQL` database
    #[value(alias = "pgsql", alias = "postgresql")]
    Postgres,
    /// `SQLite` database
    #[value(alias = "sqlite3")]
    Sqlite,
}

impl DatabaseType {
    /// Resolve a `dbms` identifier.
    ///
    /// # Errors
    /// Returns `SqlExecutorError::ConfigError` for unknown identifiers.
    pub fn from_dbms(dbms: &str) -> Result<Self, SqlExecutorError> {
        <DatabaseType as ValueEnum>::from_str(dbms.trim(), true).map_err(|_| {
            SqlExecutorError::ConfigError(format!("unsupported dbms identifier: {dbms}"))
        })
    }

    /// Whether support for this backend was compiled in.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        match self {
            DatabaseType::Postgres => cfg!(feature = "postgres"),
            DatabaseType::Sqlite => cfg!(feature = "sqlite"),
        }
    }
}

/// The structural form in which a fetched row is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum FetchShape {
    /// Column name to value
    #[default]
    #[value(alias = "assoc")]
    Associative,
    /// Values by position
    #[value(alias = "num")]
    Numeric,
    /// Addressable by both name and position
    Both,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dbms_aliases_resolve() {
        assert_eq!(DatabaseType::from_dbms("postgresql").unwrap(), DatabaseType::Postgres);
        assert_eq!(DatabaseType::from_dbms("PGSQL").unwrap(), DatabaseType::Postgres);
        assert_eq!(DatabaseType::from_dbms("sqlite3").unwrap(), DatabaseType::Sqlite);
        let err = DatabaseType::from_dbms("oracle").unwrap_err();
        assert!(matches!(err, SqlExecutorError::ConfigError(_)));
    }

    #[test]
    fn enabled_backends_follow_features() {
        assert_eq!(DatabaseType::Sqlite.is_enabled(), cfg!(feature = "sqlite"));
        assert_eq!(DatabaseType::Postgres.is_enabled(), cfg!(feature = "postgres"));
    }

    #[test]
    fn option_converts_to_null() {
        assert_eq!(RowValues::from(None::<i64>), RowValues::Null);
        assert_eq!(RowValues::from(Some("x")), RowValues::Text("x".into()));
    }

    #[test]
    fn text_rendering() {
        assert_eq!(RowValues::Int(42).to_text().as_deref(), Some("42"));
        assert_eq!(RowValues::Bool(true).to_text().as_deref(), Some("1"));
        assert_eq!(RowValues::Null.to_text(), None);
    }

    #[test]
    fn fetch_shape_defaults_to_associative() {
        assert_eq!(FetchShape::default(), FetchShape::Associative);
        assert_eq!(
            <FetchShape as ValueEnum>::from_str("num", true).unwrap(),
            FetchShape::Numeric
        );
    }
}
