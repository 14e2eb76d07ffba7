//! Connection parameters.
//!
//! Parameters can come from a key/value map, a JSON document, or the builder.
//! All of them end up in [`ConnectionParams`], which validates the required
//! keys and normalizes the session character set.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::SqlExecutorError;
use crate::types::DatabaseType;

/// Character set applied when `charset` is not supplied.
pub const DEFAULT_CHARSET: &str = "UTF8";

const REQUIRED_KEYS: [&str; 5] = ["dbms", "host", "dbname", "user", "password"];

// The charset is interpolated into `SET NAMES`, so only identifier characters pass.
static CHARSET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static charset pattern"));

/// Whether `charset` is safe to hand to the session (`[A-Za-z0-9_-]+`).
#[must_use]
pub fn is_valid_charset(charset: &str) -> bool {
    CHARSET_PATTERN.is_match(charset)
}

fn default_charset() -> String {
    DEFAULT_CHARSET.to_string()
}

/// Parameters needed to open a connection.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionParams {
    pub dbms: String,
    pub host: String,
    pub dbname: String,
    pub user: String,
    pub password: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_charset")]
    pub charset: String,
}

impl ConnectionParams {
    #[must_use]
    pub fn builder(dbms: impl Into<String>) -> ConnectionParamsBuilder {
        ConnectionParamsBuilder::new(dbms)
    }

    /// Build parameters from a string map using the `dbms`/`host`/`dbname`/`user`/`password`
    /// keys, plus the optional `charset` and `port`.
    ///
    /// # Errors
    /// Returns `SqlExecutorError::ConfigError` if a required key is missing or a value is invalid.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, SqlExecutorError> {
        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| !map.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(SqlExecutorError::ConfigError(format!(
                "missing connection parameter(s): {}",
                missing.join(", ")
            )));
        }

        let port = map
            .get("port")
            .map(|raw| {
                raw.trim().parse::<u16>().map_err(|e| {
                    SqlExecutorError::ConfigError(format!("invalid port {raw:?}: {e}"))
                })
            })
            .transpose()?;

        let params = ConnectionParams {
            dbms: map["dbms"].clone(),
            host: map["host"].clone(),
            dbname: map["dbname"].clone(),
            user: map["user"].clone(),
            password: map["password"].clone(),
            port,
            charset: map.get("charset").cloned().unwrap_or_else(default_charset),
        };
        params.validate()?;
        Ok(params)
    }

    /// Parse parameters from a JSON object.
    ///
    /// # Errors
    /// Returns `SqlExecutorError::ConfigError` if the document does not deserialize or
    /// fails validation.
    pub fn from_json(json: &str) -> Result<Self, SqlExecutorError> {
        let params: ConnectionParams = serde_json::from_str(json)
            .map_err(|e| SqlExecutorError::ConfigError(format!("invalid connection json: {e}")))?;
        params.validate()?;
        Ok(params)
    }

    /// Check the dbms identifier and the charset.
    ///
    /// # Errors
    /// Returns `SqlExecutorError::ConfigError` describing the first invalid value.
    pub fn validate(&self) -> Result<(), SqlExecutorError> {
        DatabaseType::from_dbms(&self.dbms)?;
        if !is_valid_charset(self.charset.trim()) {
            return Err(SqlExecutorError::ConfigError(format!(
                "invalid charset: {:?}",
                self.charset
            )));
        }
        Ok(())
    }

    /// The backend named by `dbms`.
    ///
    /// # Errors
    /// Returns `SqlExecutorError::ConfigError` for unknown identifiers.
    pub fn database_type(&self) -> Result<DatabaseType, SqlExecutorError> {
        DatabaseType::from_dbms(&self.dbms)
    }

    /// The session character set, upper-cased.
    #[must_use]
    pub fn charset(&self) -> String {
        self.charset.trim().to_uppercase()
    }

    /// Driver-style connection string, e.g. `pgsql:host=localhost;dbname=app;`.
    ///
    /// Credentials are never part of the DSN, so it is safe to log.
    #[must_use]
    pub fn dsn(&self) -> String {
        let mut dsn = format!("{}:host={};dbname={};", self.dbms, self.host, self.dbname);
        if let Some(port) = self.port {
            dsn.push_str(&format!("port={port};"));
        }
        dsn
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("dbms", &self.dbms)
            .field("host", &self.host)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("port", &self.port)
            .field("charset", &self.charset)
            .finish()
    }
}

/// Fluent builder for [`ConnectionParams`].
///
/// ```rust
/// use sql_executor::prelude::*;
///
/// let params = ConnectionParams::builder("sqlite")
///     .dbname(":memory:")
///     .charset("utf8")
///     .finish()
///     .unwrap();
/// assert_eq!(params.charset(), "UTF8");
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionParamsBuilder {
    params: ConnectionParams,
}

impl ConnectionParamsBuilder {
    #[must_use]
    pub fn new(dbms: impl Into<String>) -> Self {
        Self {
            params: ConnectionParams {
                dbms: dbms.into(),
                host: String::new(),
                dbname: String::new(),
                user: String::new(),
                password: String::new(),
                port: None,
                charset: default_charset(),
            },
        }
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.params.host = host.into();
        self
    }

    #[must_use]
    pub fn dbname(mut self, dbname: impl Into<String>) -> Self {
        self.params.dbname = dbname.into();
        self
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.params.user = user.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.params.password = password.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.params.port = Some(port);
        self
    }

    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.params.charset = charset.into();
        self
    }

    /// Validate and return the parameters.
    ///
    /// # Errors
    /// Returns `SqlExecutorError::ConfigError` if validation fails.
    pub fn finish(self) -> Result<ConnectionParams, SqlExecutorError> {
        self.params.validate()?;
        Ok(self.params)
    }
}
