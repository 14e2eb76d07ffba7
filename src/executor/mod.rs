//! The query executor.
//!
//! [`QueryExecutor`] owns one driver connection. Statements are written with
//! named `:name` placeholders and bound from an [`Attributes`] list. Rows come
//! back in the [`FetchShape`] the caller asks for.
//!
//! While a transaction is open, write statements passed to
//! [`QueryExecutor::execute`] are queued and replayed in order when
//! [`QueryExecutor::commit`] runs. If one of them fails, the transaction is
//! rolled back and the failure is returned.

mod cursor;
mod transaction;

use std::fmt;

use tracing::{debug, trace, warn};

use crate::config::ConnectionParams;
use crate::driver::{self, DriverConnection};
use crate::error::SqlExecutorError;
use crate::params::Attributes;
use crate::results::FetchedRow;
use crate::statement::PreparedStatement;
use crate::types::{FetchShape, RowValues};

use cursor::CurrentStatement;
use transaction::replay_and_commit;
pub use transaction::{PendingStatementQueue, ReplayPolicy, TransactionState};

/// Executor behavior knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutorOptions {
    pub replay: ReplayPolicy,
}

impl ExecutorOptions {
    #[must_use]
    pub fn with_replay(mut self, replay: ReplayPolicy) -> Self {
        self.replay = replay;
        self
    }
}

/// Runs SQL against a single connection and batches writes inside transactions.
///
/// ```rust,no_run
/// use sql_executor::prelude::*;
///
/// # fn main() -> Result<(), SqlExecutorError> {
/// let params = ConnectionParams::builder("sqlite").dbname(":memory:").finish()?;
/// let mut db = QueryExecutor::new();
/// db.connect(&params)?;
/// db.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", &Attributes::new())?;
///
/// db.begin_transaction()?;
/// db.execute("INSERT INTO t (name) VALUES (:name)", &attributes! { "name" => "alice" })?;
/// db.execute("INSERT INTO t (name) VALUES (:name)", &attributes! { "name" => "bob" })?;
/// db.commit()?;
///
/// let names = db.query_column("SELECT name FROM t ORDER BY id", &Attributes::new())?;
/// assert_eq!(names.len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct QueryExecutor {
    connection: Option<Box<dyn DriverConnection>>,
    options: ExecutorOptions,
    state: TransactionState,
    pending: PendingStatementQueue,
    current: Option<CurrentStatement>,
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryExecutor {
    /// An executor with no connection and default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ExecutorOptions::default())
    }

    #[must_use]
    pub fn with_options(options: ExecutorOptions) -> Self {
        Self {
            connection: None,
            options,
            state: TransactionState::Inactive,
            pending: PendingStatementQueue::default(),
            current: None,
        }
    }

    /// Wrap an already open driver connection.
    #[must_use]
    pub fn from_connection(connection: Box<dyn DriverConnection>) -> Self {
        let mut executor = Self::new();
        executor.connection = Some(connection);
        executor
    }

    #[must_use]
    pub fn options(&self) -> ExecutorOptions {
        self.options
    }

    /// Open a connection described by `params`, replacing any current one.
    ///
    /// The session character set is applied right after connecting.
    ///
    /// # Errors
    /// Returns `ConfigError` for invalid parameters and `ConnectionError` if the
    /// database cannot be reached or rejects the character set. On error the
    /// previous connection, if any, is left untouched.
    pub fn connect(&mut self, params: &ConnectionParams) -> Result<(), SqlExecutorError> {
        params.validate()?;
        let charset = params.charset();
        let mut connection = driver::open(params)?;
        connection.set_charset(&charset).map_err(|e| {
            SqlExecutorError::ConnectionError(format!(
                "failed to apply charset {charset}: {}",
                e.message()
            ))
        })?;

        self.close_connection();
        debug!(
            backend = connection.backend(),
            dsn = %params.dsn(),
            charset = %charset,
            "connection opened"
        );
        self.connection = Some(connection);
        Ok(())
    }

    /// Drop the connection. Safe to call when nothing is open.
    ///
    /// Queued statements of an open transaction are discarded; the database
    /// rolls the transaction back when the session ends.
    pub fn close_connection(&mut self) {
        if let Some(connection) = self.connection.take() {
            if self.state.is_active() {
                debug!(
                    discarded = self.pending.len(),
                    "closing connection with an open transaction"
                );
            }
            debug!(backend = connection.backend(), "connection closed");
        }
        self.reset_transaction();
        self.current = None;
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.state.is_active()
    }

    #[must_use]
    pub fn transaction_state(&self) -> TransactionState {
        self.state
    }

    /// Number of statements waiting for commit.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Statements waiting for commit, in the order they will run.
    pub fn pending_statements(&self) -> impl Iterator<Item = &PreparedStatement> {
        self.pending.iter()
    }

    /// Start a transaction. Nested transactions are not supported.
    ///
    /// # Errors
    /// Returns `StateError` if a transaction is already open, `ConnectionError`
    /// if there is no connection, or the driver's error if `BEGIN` fails.
    pub fn begin_transaction(&mut self) -> Result<(), SqlExecutorError> {
        if self.state.is_active() {
            return Err(SqlExecutorError::StateError(
                "a transaction is already active".into(),
            ));
        }
        self.connection_mut()?.begin_transaction()?;
        self.state = TransactionState::Active;
        self.pending.clear();
        debug!("transaction started");
        Ok(())
    }

    /// Replay the queued statements in order, then commit.
    ///
    /// On the first failure the transaction is rolled back and that failure is
    /// returned as a `QueryError`. The executor leaves the transaction whether
    /// or not the commit succeeds.
    ///
    /// # Errors
    /// Returns `StateError` without an open transaction, otherwise the
    /// `QueryError` of the statement (or commit) that failed.
    pub fn commit(&mut self) -> Result<(), SqlExecutorError> {
        if !self.state.is_active() {
            return Err(SqlExecutorError::StateError(
                "no active transaction to commit".into(),
            ));
        }
        let pending = std::mem::take(&mut self.pending);
        self.state = TransactionState::Inactive;

        let connection = self.connection_mut()?;
        match replay_and_commit(connection, &pending) {
            Ok(()) => {
                debug!(replayed = pending.len(), "transaction committed");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "commit failed, rolling back");
                if let Err(rollback_err) = connection.rollback() {
                    warn!(error = %rollback_err, "rollback after failed commit also failed");
                }
                Err(err.into_query_error())
            }
        }
    }

    /// Discard the queued statements and roll the transaction back.
    ///
    /// # Errors
    /// Returns `StateError` without an open transaction, or the driver's error
    /// if `ROLLBACK` fails. The executor leaves the transaction either way.
    pub fn rollback(&mut self) -> Result<(), SqlExecutorError> {
        if !self.state.is_active() {
            return Err(SqlExecutorError::StateError(
                "no active transaction to roll back".into(),
            ));
        }
        let discarded = self.pending.len();
        self.reset_transaction();
        self.connection_mut()?.rollback()?;
        debug!(discarded, "transaction rolled back");
        Ok(())
    }

    /// Run `f` inside a transaction.
    ///
    /// Commits when `f` returns `Ok` and rolls back when it returns `Err`. If
    /// `f` ends the transaction itself, its outcome is left as is.
    ///
    /// # Errors
    /// Returns the error from `begin_transaction`, from `f`, or from `commit`.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T, SqlExecutorError>
    where
        F: FnOnce(&mut Self) -> Result<T, SqlExecutorError>,
    {
        self.begin_transaction()?;
        match f(self) {
            Ok(value) => {
                if self.state.is_active() {
                    self.commit()?;
                }
                Ok(value)
            }
            Err(err) => {
                if self.state.is_active()
                    && let Err(rollback_err) = self.rollback()
                {
                    warn!(error = %rollback_err, "rollback after failed transaction body failed");
                }
                Err(err)
            }
        }
    }

    /// Run a statement that does not return rows.
    ///
    /// Inside a transaction the statement is queued for commit; whether it also
    /// runs now depends on [`ReplayPolicy`]. Under `Deferred` the database does
    /// not see the statement until commit, so syntax errors surface there.
    /// Returns `true` on success.
    ///
    /// # Errors
    /// Returns `ConnectionError` without a connection and `QueryError` if
    /// preparing, binding, or running the statement fails.
    pub fn execute(
        &mut self,
        query: &str,
        attributes: &Attributes,
    ) -> Result<bool, SqlExecutorError> {
        if self.defers_writes() {
            // Compiled at replay, so it may refer to objects created earlier in the batch.
            let statement = self.translate_and_bind(query, attributes)?;
            self.pending.push(statement.clone());
            trace!(
                queued = self.pending.len(),
                sql = query,
                "statement deferred until commit"
            );
            self.current = Some(CurrentStatement::deferred(statement));
            return Ok(true);
        }
        let statement = self.prepare_and_bind(query, attributes)?;
        if self.state.is_active() {
            self.pending.push(statement.clone());
        }
        self.run(statement)?;
        Ok(true)
    }

    /// All rows of `query` in the requested shape. Empty when nothing matches.
    ///
    /// # Errors
    /// Same as [`QueryExecutor::execute`].
    pub fn query_all(
        &mut self,
        query: &str,
        attributes: &Attributes,
        shape: FetchShape,
    ) -> Result<Vec<FetchedRow>, SqlExecutorError> {
        let current = self.execute_for_rows(query, attributes)?;
        Ok(current.fetch_remaining(shape))
    }

    /// The first row of `query`, or `None` when nothing matches.
    ///
    /// Remaining rows stay available through [`QueryExecutor::fetch_row`].
    ///
    /// # Errors
    /// Same as [`QueryExecutor::execute`].
    pub fn query_row(
        &mut self,
        query: &str,
        attributes: &Attributes,
        shape: FetchShape,
    ) -> Result<Option<FetchedRow>, SqlExecutorError> {
        let current = self.execute_for_rows(query, attributes)?;
        Ok(current.fetch_next(shape))
    }

    /// Next unread row of the last statement, or `None` once exhausted.
    pub fn fetch_row(&mut self, shape: FetchShape) -> Option<FetchedRow> {
        self.current.as_mut()?.fetch_next(shape)
    }

    /// The first column of every row, in row order.
    ///
    /// # Errors
    /// Same as [`QueryExecutor::execute`].
    pub fn query_column(
        &mut self,
        query: &str,
        attributes: &Attributes,
    ) -> Result<Vec<RowValues>, SqlExecutorError> {
        let current = self.execute_for_rows(query, attributes)?;
        Ok(current.fetch_first_column())
    }

    /// The first column of the first row, or `None` when nothing matches.
    ///
    /// # Errors
    /// Same as [`QueryExecutor::execute`].
    pub fn query_one(
        &mut self,
        query: &str,
        attributes: &Attributes,
    ) -> Result<Option<RowValues>, SqlExecutorError> {
        let current = self.execute_for_rows(query, attributes)?;
        Ok(current
            .fetch_next(FetchShape::Numeric)
            .and_then(|row| row.into_values().into_iter().next()))
    }

    /// Identifier of the last inserted row, as a string.
    ///
    /// Under [`ReplayPolicy::Deferred`] queued inserts have not run yet, so the
    /// id is only available once the transaction is committed.
    ///
    /// # Errors
    /// Returns `StateError` while deferred statements are queued,
    /// `ConnectionError` without a connection, or the driver's error.
    pub fn last_insert_id(&mut self) -> Result<String, SqlExecutorError> {
        if self.defers_writes() && !self.pending.is_empty() {
            return Err(SqlExecutorError::StateError(format!(
                "last insert id is unknown until the {} queued statement(s) are committed",
                self.pending.len()
            )));
        }
        self.connection_mut()?.last_insert_id()
    }

    /// Rows affected (or returned) by the last statement that actually ran.
    ///
    /// `None` before any statement, or when the last one was queued for commit.
    #[must_use]
    pub fn last_rows_affected(&self) -> Option<usize> {
        self.current.as_ref()?.rows_affected()
    }

    /// Text of the last statement handed to the executor.
    #[must_use]
    pub fn last_query(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.statement().query())
    }

    fn connection_mut(
        &mut self,
    ) -> Result<&mut (dyn DriverConnection + 'static), SqlExecutorError> {
        self.connection
            .as_deref_mut()
            .ok_or_else(|| SqlExecutorError::ConnectionError("no open connection".into()))
    }

    fn defers_writes(&self) -> bool {
        self.state.is_active() && self.options.replay == ReplayPolicy::Deferred
    }

    fn reset_transaction(&mut self) {
        self.state = TransactionState::Inactive;
        self.pending.clear();
    }

    fn prepare_and_bind(
        &mut self,
        query: &str,
        attributes: &Attributes,
    ) -> Result<PreparedStatement, SqlExecutorError> {
        let mut statement = self
            .connection_mut()?
            .prepare(query)
            .map_err(SqlExecutorError::into_query_error)?;
        statement.bind_all(attributes)?;
        trace!(
            sql = query,
            placeholders = statement.placeholders().len(),
            "statement prepared"
        );
        Ok(statement)
    }

    /// Build a statement from placeholder translation alone, without asking the
    /// database to compile it.
    fn translate_and_bind(
        &mut self,
        query: &str,
        attributes: &Attributes,
    ) -> Result<PreparedStatement, SqlExecutorError> {
        let style = self.connection_mut()?.placeholder_style();
        let mut statement = PreparedStatement::new(query, style);
        statement.bind_all(attributes)?;
        statement.positional_values()?;
        Ok(statement)
    }

    fn execute_for_rows(
        &mut self,
        query: &str,
        attributes: &Attributes,
    ) -> Result<&mut CurrentStatement, SqlExecutorError> {
        let statement = self.prepare_and_bind(query, attributes)?;
        if self.state.is_active() && self.options.replay == ReplayPolicy::ExecuteAndReplay {
            self.pending.push(statement.clone());
        }
        self.run(statement)
    }

    fn run(
        &mut self,
        statement: PreparedStatement,
    ) -> Result<&mut CurrentStatement, SqlExecutorError> {
        self.current = None;
        let results = self
            .connection_mut()?
            .execute(&statement)
            .map_err(SqlExecutorError::into_query_error)?;
        trace!(
            sql = statement.query(),
            rows = results.len(),
            rows_affected = results.rows_affected,
            "statement executed"
        );
        Ok(self
            .current
            .insert(CurrentStatement::executed(statement, results)))
    }
}

impl fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("backend", &self.connection.as_ref().map(|c| c.backend()))
            .field("options", &self.options)
            .field("state", &self.state)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl Drop for QueryExecutor {
    fn drop(&mut self) {
        if !self.state.is_active() {
            return;
        }
        warn!(
            discarded = self.pending.len(),
            "executor dropped with an open transaction, rolling back"
        );
        if let Some(connection) = self.connection.as_deref_mut()
            && let Err(err) = connection.rollback()
        {
            warn!(error = %err, "rollback on drop failed");
        }
    }
}

#[cfg(test)]
mod tests;
