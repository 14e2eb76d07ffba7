use tokio::runtime::{Builder, Runtime};
use tokio_postgres::{Client, Config as PgConfig, NoTls};
use tracing::warn;

use crate::config::ConnectionParams;
use crate::error::SqlExecutorError;

/// Translate connection parameters into a tokio-postgres config.
///
/// # Errors
/// Returns `SqlExecutorError::ConfigError` if a required field is empty.
pub fn pg_config(params: &ConnectionParams) -> Result<PgConfig, SqlExecutorError> {
    if params.dbname.trim().is_empty() {
        return Err(SqlExecutorError::ConfigError("dbname is required".to_string()));
    }
    if params.host.trim().is_empty() {
        return Err(SqlExecutorError::ConfigError("host is required".to_string()));
    }
    if params.user.trim().is_empty() {
        return Err(SqlExecutorError::ConfigError("user is required".to_string()));
    }

    let mut cfg = PgConfig::new();
    cfg.host(params.host.trim())
        .dbname(&params.dbname)
        .user(&params.user)
        .password(&params.password)
        .application_name("sql-executor");
    if let Some(port) = params.port {
        cfg.port(port);
    }
    Ok(cfg)
}

/// Open a client on a dedicated current-thread runtime.
///
/// The connection task is spawned onto the returned runtime and only makes
/// progress while a call blocks on that runtime.
///
/// # Errors
/// Returns `SqlExecutorError::ConnectionError` if the runtime cannot be built or the server
/// refuses the connection.
pub fn connect(params: &ConnectionParams) -> Result<(Runtime, Client), SqlExecutorError> {
    let cfg = pg_config(params)?;
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            SqlExecutorError::ConnectionError(format!("failed to build postgres runtime: {e}"))
        })?;

    let (client, connection) = runtime.block_on(cfg.connect(NoTls)).map_err(|e| {
        SqlExecutorError::ConnectionError(format!("failed to connect to {}: {e}", params.dsn()))
    })?;

    runtime.spawn(async move {
        if let Err(e) = connection.await {
            warn!(error = %e, "postgres connection closed with error");
        }
    });

    Ok((runtime, client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_host_is_a_config_error() {
        let params = ConnectionParams::builder("pgsql")
            .dbname("app")
            .user("svc")
            .finish()
            .unwrap();
        assert_eq!(
            pg_config(&params).unwrap_err(),
            SqlExecutorError::ConfigError("host is required".into())
        );
    }

    #[test]
    fn port_is_forwarded() {
        let params = ConnectionParams::builder("pgsql")
            .host("db.internal")
            .dbname("app")
            .user("svc")
            .password("pw")
            .port(6543)
            .finish()
            .unwrap();
        let cfg = pg_config(&params).unwrap();
        assert_eq!(cfg.get_ports(), &[6543]);
        assert_eq!(cfg.get_dbname(), Some("app"));
    }
}
