use std::collections::VecDeque;

use crate::results::{CustomDbRow, FetchedRow, ResultSet};
use crate::statement::PreparedStatement;
use crate::types::FetchShape;

/// The statement the executor ran last, with the rows not yet fetched.
#[derive(Debug)]
pub(crate) struct CurrentStatement {
    statement: PreparedStatement,
    rows: VecDeque<CustomDbRow>,
    // None while the statement waits in the commit queue.
    rows_affected: Option<usize>,
}

impl CurrentStatement {
    pub(crate) fn executed(statement: PreparedStatement, results: ResultSet) -> Self {
        Self {
            statement,
            rows_affected: Some(results.rows_affected),
            rows: results.results.into(),
        }
    }

    pub(crate) fn deferred(statement: PreparedStatement) -> Self {
        Self {
            statement,
            rows: VecDeque::new(),
            rows_affected: None,
        }
    }

    pub(crate) fn statement(&self) -> &PreparedStatement {
        &self.statement
    }

    pub(crate) fn rows_affected(&self) -> Option<usize> {
        self.rows_affected
    }

    pub(crate) fn fetch_next(&mut self, shape: FetchShape) -> Option<FetchedRow> {
        self.rows
            .pop_front()
            .map(|row| FetchedRow::from_row(row, shape))
    }

    pub(crate) fn fetch_remaining(&mut self, shape: FetchShape) -> Vec<FetchedRow> {
        self.rows
            .drain(..)
            .map(|row| FetchedRow::from_row(row, shape))
            .collect()
    }

    /// First column of each remaining row.
    pub(crate) fn fetch_first_column(&mut self) -> Vec<crate::types::RowValues> {
        self.rows
            .drain(..)
            .filter_map(|row| row.rows.into_iter().next())
            .collect()
    }
}
