//! In-memory [`DriverConnection`] that records every call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::driver::DriverConnection;
use crate::error::SqlExecutorError;
use crate::results::ResultSet;
use crate::statement::PreparedStatement;
use crate::translation::PlaceholderStyle;
use crate::types::RowValues;

/// One call received by a [`MockConnection`].
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    Prepare(String),
    Execute { sql: String, values: Vec<RowValues> },
    Begin,
    Commit,
    Rollback,
    LastInsertId,
    SetCharset(String),
}

/// Shared view of the calls a [`MockConnection`] has received.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<DriverCall>>>);

impl CallLog {
    fn push(&self, call: DriverCall) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<DriverCall> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// SQL text of every executed statement, in order.
    #[must_use]
    pub fn executed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DriverCall::Execute { sql, .. } => Some(sql),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn count(&self, call: &DriverCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// Scriptable driver for executor tests.
///
/// Statements are executed against nothing: each returns the canned
/// [`ResultSet`] registered for its query text, or one affected row.
#[derive(Debug, Default)]
pub struct MockConnection {
    log: CallLog,
    fail_on: Option<String>,
    fail_commit: bool,
    fail_rollback: bool,
    results: HashMap<String, ResultSet>,
    last_id: i64,
}

impl MockConnection {
    /// A mock plus a handle to its call log.
    #[must_use]
    pub fn new() -> (Self, CallLog) {
        let mock = Self::default();
        let log = mock.log.clone();
        (mock, log)
    }

    /// Fail any statement whose SQL contains `marker`.
    #[must_use]
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_on = Some(marker.into());
        self
    }

    #[must_use]
    pub fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    #[must_use]
    pub fn failing_rollback(mut self) -> Self {
        self.fail_rollback = true;
        self
    }

    /// Return `results` whenever `query` is executed.
    #[must_use]
    pub fn with_result(mut self, query: impl Into<String>, results: ResultSet) -> Self {
        self.results.insert(query.into(), results);
        self
    }

    /// Box the mock for
    /// [`QueryExecutor::from_connection`](crate::executor::QueryExecutor::from_connection).
    #[must_use]
    pub fn boxed(self) -> Box<dyn DriverConnection> {
        Box::new(self)
    }
}

impl DriverConnection for MockConnection {
    fn backend(&self) -> &'static str {
        "mock"
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Sqlite
    }

    fn prepare(&mut self, query: &str) -> Result<PreparedStatement, SqlExecutorError> {
        self.log.push(DriverCall::Prepare(query.to_string()));
        if query.trim().is_empty() {
            return Err(SqlExecutorError::query("42000", "empty query"));
        }
        Ok(PreparedStatement::new(query, self.placeholder_style()))
    }

    fn execute(&mut self, statement: &PreparedStatement) -> Result<ResultSet, SqlExecutorError> {
        let values = statement
            .positional_values()?
            .into_iter()
            .cloned()
            .collect();
        self.log.push(DriverCall::Execute {
            sql: statement.query().to_string(),
            values,
        });
        if let Some(marker) = &self.fail_on
            && statement.query().contains(marker.as_str())
        {
            return Err(SqlExecutorError::query(
                "23000",
                format!("mock failure: {}", statement.query()),
            ));
        }
        if let Some(results) = self.results.get(statement.query()) {
            return Ok(results.clone());
        }
        if statement
            .query()
            .trim_start()
            .to_ascii_uppercase()
            .starts_with("INSERT")
        {
            self.last_id += 1;
        }
        Ok(ResultSet::affected(1))
    }

    fn begin_transaction(&mut self) -> Result<(), SqlExecutorError> {
        self.log.push(DriverCall::Begin);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SqlExecutorError> {
        self.log.push(DriverCall::Commit);
        if self.fail_commit {
            return Err(SqlExecutorError::query("40001", "mock commit failure"));
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), SqlExecutorError> {
        self.log.push(DriverCall::Rollback);
        if self.fail_rollback {
            return Err(SqlExecutorError::query("HY000", "mock rollback failure"));
        }
        Ok(())
    }

    fn last_insert_id(&mut self) -> Result<String, SqlExecutorError> {
        self.log.push(DriverCall::LastInsertId);
        Ok(self.last_id.to_string())
    }

    fn set_charset(&mut self, charset: &str) -> Result<(), SqlExecutorError> {
        self.log.push(DriverCall::SetCharset(charset.to_string()));
        Ok(())
    }
}
