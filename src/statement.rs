use std::sync::Arc;

use crate::error::SqlExecutorError;
use crate::params::{Attributes, normalize_name};
use crate::translation::{PlaceholderStyle, translate_named_placeholders};
use crate::types::RowValues;

/// A query compiled for one backend together with its bound parameters.
///
/// Values are paired with their placeholder by position, never by splicing text,
/// so a value can contain any character the query syntax uses.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedStatement {
    query: Arc<str>,
    native_sql: Arc<str>,
    placeholders: Arc<[String]>,
    bindings: Vec<Option<RowValues>>,
}

impl PreparedStatement {
    /// Translate `query`'s named placeholders into `style`.
    #[must_use]
    pub fn new(query: &str, style: PlaceholderStyle) -> Self {
        let translation = translate_named_placeholders(query, style);
        Self::from_parts(query, translation.sql.as_ref(), translation.names)
    }

    /// Build from already translated SQL; `placeholders[i]` is positional parameter `i + 1`.
    #[must_use]
    pub fn from_parts(query: &str, native_sql: &str, placeholders: Vec<String>) -> Self {
        let bindings = vec![None; placeholders.len()];
        Self {
            query: Arc::from(query),
            native_sql: Arc::from(native_sql),
            placeholders: Arc::from(placeholders),
            bindings,
        }
    }

    /// The query as written by the caller.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The query with positional placeholders for the backend.
    #[must_use]
    pub fn native_sql(&self) -> &str {
        &self.native_sql
    }

    #[must_use]
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Bind a value to a named placeholder, replacing any earlier binding.
    ///
    /// # Errors
    /// Returns a `QueryError` (`HY093`) if the statement has no such placeholder.
    pub fn bind(&mut self, name: &str, value: RowValues) -> Result<(), SqlExecutorError> {
        let name = normalize_name(name);
        let idx = self
            .placeholders
            .iter()
            .position(|p| p == name)
            .ok_or_else(|| {
                SqlExecutorError::invalid_parameter(format!(
                    "parameter :{name} is not defined in query"
                ))
            })?;
        self.bindings[idx] = Some(value);
        Ok(())
    }

    /// Bind every attribute in order.
    ///
    /// # Errors
    /// Returns the first binding error.
    pub fn bind_all(&mut self, attributes: &Attributes) -> Result<(), SqlExecutorError> {
        for (name, value) in attributes.iter() {
            self.bind(name, value.clone())?;
        }
        Ok(())
    }

    #[must_use]
    pub fn bound(&self, name: &str) -> Option<&RowValues> {
        let name = normalize_name(name);
        let idx = self.placeholders.iter().position(|p| p == name)?;
        self.bindings[idx].as_ref()
    }

    /// Bound values in positional order.
    ///
    /// # Errors
    /// Returns a `QueryError` (`HY093`) naming the first placeholder without a value.
    pub fn positional_values(&self) -> Result<Vec<&RowValues>, SqlExecutorError> {
        self.bindings
            .iter()
            .zip(self.placeholders.iter())
            .map(|(value, name)| {
                value.as_ref().ok_or_else(|| {
                    SqlExecutorError::invalid_parameter(format!("no value bound for :{name}"))
                })
            })
            .collect()
    }
}
