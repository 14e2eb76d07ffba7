// PostgreSQL module - blocking driver over tokio-postgres
//
// - config: building the tokio-postgres config and connecting
// - params: `ToSql` for `RowValues`
// - query: result extraction and building
// - connection: the `DriverConnection` implementation

pub mod config;
pub mod connection;
pub mod params;
pub mod query;

pub use connection::PostgresConnection;
pub use params::Params;
pub use query::build_result_set_from_statement;
