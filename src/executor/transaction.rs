use std::collections::VecDeque;

use tracing::trace;

use crate::driver::DriverConnection;
use crate::error::SqlExecutorError;
use crate::statement::PreparedStatement;

/// Whether the executor is inside a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    #[default]
    Inactive,
    Active,
}

impl TransactionState {
    #[must_use]
    pub fn is_active(self) -> bool {
        self == TransactionState::Active
    }
}

/// What `execute` does with a statement while a transaction is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayPolicy {
    /// Queue the statement; it runs only when the transaction commits.
    /// Row-returning `query_*` calls still run immediately and are not queued.
    #[default]
    Deferred,
    /// Run the statement now and queue it to run again at commit. Applies to
    /// `query_*` calls as well.
    ExecuteAndReplay,
}

/// Statements waiting for commit, in execution order.
#[derive(Debug, Clone, Default)]
pub struct PendingStatementQueue {
    statements: VecDeque<PreparedStatement>,
}

impl PendingStatementQueue {
    pub fn push(&mut self, statement: PreparedStatement) {
        self.statements.push_back(statement);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn clear(&mut self) {
        self.statements.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PreparedStatement> {
        self.statements.iter()
    }
}

/// Replay `pending` in order and commit. Stops at the first failure without
/// rolling back; the caller owns the rollback.
pub(crate) fn replay_and_commit(
    conn: &mut dyn DriverConnection,
    pending: &PendingStatementQueue,
) -> Result<(), SqlExecutorError> {
    for (position, statement) in pending.iter().enumerate() {
        trace!(position, sql = statement.query(), "replaying statement");
        conn.execute(statement)?;
    }
    conn.commit()
}
