//! Helpers for exercising the executor without a real database, plus an
//! embedded `PostgreSQL` launcher behind the `test-utils-postgres` feature.

use std::sync::Arc;

use crate::results::ResultSet;
use crate::types::RowValues;

pub mod mock;

#[cfg(feature = "test-utils-postgres")]
pub mod embedded;

pub use mock::{CallLog, DriverCall, MockConnection};

#[cfg(feature = "test-utils-postgres")]
pub use embedded::{EmbeddedPostgres, setup_postgres_embedded, stop_postgres_embedded};

/// Build a result set from column names and row values.
#[must_use]
pub fn result_set(columns: &[&str], rows: Vec<Vec<RowValues>>) -> ResultSet {
    let mut rs = ResultSet::with_capacity(rows.len());
    rs.set_column_names(Arc::new(columns.iter().map(ToString::to_string).collect()));
    for row in rows {
        rs.add_row_values(row);
    }
    rs
}
