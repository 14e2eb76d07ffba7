use std::fmt;

use tokio::runtime::Runtime;
use tokio_postgres::{Client, Statement};
use tracing::trace;

use super::config::connect;
use super::params::Params;
use super::query::build_result_set_from_statement;
use crate::config::{ConnectionParams, is_valid_charset};
use crate::driver::DriverConnection;
use crate::error::SqlExecutorError;
use crate::results::ResultSet;
use crate::statement::PreparedStatement;
use crate::translation::PlaceholderStyle;

/// Blocking `PostgreSQL` session.
///
/// Owns the client and the runtime that drives it; the client is declared first
/// so it is dropped (closing the session) before the runtime shuts down.
pub struct PostgresConnection {
    client: Client,
    runtime: Runtime,
    // Server-side statement for the most recently prepared query.
    last_prepared: Option<(String, Statement)>,
}

impl PostgresConnection {
    /// Connect using `params`.
    ///
    /// # Errors
    /// Returns `SqlExecutorError::ConnectionError` if the server cannot be reached.
    pub fn open(params: &ConnectionParams) -> Result<Self, SqlExecutorError> {
        let (runtime, client) = connect(params)?;
        Ok(Self {
            client,
            runtime,
            last_prepared: None,
        })
    }

    fn server_statement(&mut self, native_sql: &str) -> Result<Statement, SqlExecutorError> {
        if let Some((sql, stmt)) = &self.last_prepared
            && sql == native_sql
        {
            return Ok(stmt.clone());
        }
        let stmt = self.runtime.block_on(self.client.prepare(native_sql))?;
        self.last_prepared = Some((native_sql.to_string(), stmt.clone()));
        Ok(stmt)
    }

    fn batch(&mut self, sql: &str) -> Result<(), SqlExecutorError> {
        self.runtime.block_on(self.client.batch_execute(sql))?;
        Ok(())
    }
}

impl fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("closed", &self.client.is_closed())
            .field(
                "last_prepared",
                &self.last_prepared.as_ref().map(|(sql, _)| sql),
            )
            .finish()
    }
}

impl DriverConnection for PostgresConnection {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Postgres
    }

    fn prepare(&mut self, query: &str) -> Result<PreparedStatement, SqlExecutorError> {
        let statement = PreparedStatement::new(query, self.placeholder_style());
        self.server_statement(statement.native_sql())?;
        Ok(statement)
    }

    fn execute(&mut self, statement: &PreparedStatement) -> Result<ResultSet, SqlExecutorError> {
        let values = statement.positional_values()?;
        let stmt = self.server_statement(statement.native_sql())?;

        let expected = stmt.params().len();
        if expected != values.len() {
            return Err(SqlExecutorError::invalid_parameter(format!(
                "statement expects {expected} parameter(s) but {} were bound",
                values.len()
            )));
        }
        let params = Params::convert(&values);

        trace!(sql = statement.native_sql(), params = values.len(), "postgres execute");
        if stmt.columns().is_empty() {
            let affected = self
                .runtime
                .block_on(self.client.execute(&stmt, params.as_refs()))?;
            let affected = usize::try_from(affected).map_err(|e| {
                SqlExecutorError::query(
                    crate::error::GENERIC_ERROR_CODE,
                    format!("postgres affected rows conversion error: {e}"),
                )
            })?;
            Ok(ResultSet::affected(affected))
        } else {
            let rows = self
                .runtime
                .block_on(self.client.query(&stmt, params.as_refs()))?;
            build_result_set_from_statement(&stmt, &rows)
        }
    }

    fn begin_transaction(&mut self) -> Result<(), SqlExecutorError> {
        self.batch("BEGIN")
    }

    fn commit(&mut self) -> Result<(), SqlExecutorError> {
        self.batch("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), SqlExecutorError> {
        self.batch("ROLLBACK")
    }

    fn last_insert_id(&mut self) -> Result<String, SqlExecutorError> {
        let row = self
            .runtime
            .block_on(self.client.query_one("SELECT lastval()", &[]))?;
        let id: i64 = row.try_get(0)?;
        Ok(id.to_string())
    }

    fn set_charset(&mut self, charset: &str) -> Result<(), SqlExecutorError> {
        if !is_valid_charset(charset) {
            return Err(SqlExecutorError::ConnectionError(format!(
                "invalid charset: {charset:?}"
            )));
        }
        self.batch(&format!("SET NAMES '{charset}'"))
    }
}
