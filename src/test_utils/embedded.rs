use std::sync::LazyLock;

use postgresql_embedded::PostgreSQL;
use tokio::runtime::Runtime;

use crate::config::ConnectionParams;

// One runtime for every embedded server started by a test binary.
static SHARED_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime for test utilities")
});

/// A running embedded `PostgreSQL` instance.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    pub port: u16,
    /// Parameters that connect to the created database.
    pub params: ConnectionParams,
}

/// Start an embedded `PostgreSQL` server and create `dbname` on it.
///
/// # Errors
/// Returns an error if the server cannot be set up or started, or if the
/// database cannot be created.
pub fn setup_postgres_embedded(
    dbname: &str,
) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    SHARED_RUNTIME.block_on(async {
        let mut postgresql = PostgreSQL::default();
        postgresql.setup().await?;
        postgresql.start().await?;
        postgresql.create_database(dbname).await?;

        let settings = postgresql.settings();
        let port = settings.port;
        let params = ConnectionParams::builder("pgsql")
            .host(settings.host.clone())
            .port(port)
            .dbname(dbname)
            .user(settings.username.clone())
            .password(settings.password.clone())
            .finish()?;

        tracing::debug!(port, dbname, "embedded postgres started");
        Ok(EmbeddedPostgres {
            postgresql,
            port,
            params,
        })
    })
}

/// Stop a previously started embedded `PostgreSQL` instance.
pub fn stop_postgres_embedded(postgres: EmbeddedPostgres) {
    let EmbeddedPostgres { postgresql, .. } = postgres;
    SHARED_RUNTIME.block_on(async move {
        let _ = postgresql.stop().await;
    });
}
