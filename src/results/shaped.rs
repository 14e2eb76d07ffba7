use super::row::CustomDbRow;
use crate::types::{FetchShape, RowValues};

/// A row keyed by column name, in column order.
///
/// When a result has duplicate column names the last value wins and keeps the
/// position of the first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssocRow {
    entries: Vec<(String, RowValues)>,
}

impl AssocRow {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&RowValues> {
        self.entries
            .iter()
            .find_map(|(name, value)| (name == column).then_some(value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<(String, RowValues)> {
        self.entries
    }
}

impl From<CustomDbRow> for AssocRow {
    fn from(row: CustomDbRow) -> Self {
        let mut entries: Vec<(String, RowValues)> = Vec::with_capacity(row.rows.len());
        for (name, value) in row.column_names.iter().zip(row.rows) {
            match entries.iter_mut().find(|(existing, _)| existing == name) {
                Some(slot) => slot.1 = value,
                None => entries.push((name.clone(), value)),
            }
        }
        AssocRow { entries }
    }
}

/// A row in the shape requested by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedRow {
    Associative(AssocRow),
    Numeric(Vec<RowValues>),
    Both(CustomDbRow),
}

impl FetchedRow {
    #[must_use]
    pub fn from_row(row: CustomDbRow, shape: FetchShape) -> Self {
        match shape {
            FetchShape::Associative => FetchedRow::Associative(AssocRow::from(row)),
            FetchShape::Numeric => FetchedRow::Numeric(row.rows),
            FetchShape::Both => FetchedRow::Both(row),
        }
    }

    /// Look up by column name; always `None` for numeric rows.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&RowValues> {
        match self {
            FetchedRow::Associative(row) => row.get(column),
            FetchedRow::Numeric(_) => None,
            FetchedRow::Both(row) => row.get(column),
        }
    }

    /// Look up by position; always `None` for associative rows.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        match self {
            FetchedRow::Associative(_) => None,
            FetchedRow::Numeric(values) => values.get(index),
            FetchedRow::Both(row) => row.get_by_index(index),
        }
    }

    #[must_use]
    pub fn as_assoc(&self) -> Option<&AssocRow> {
        if let FetchedRow::Associative(row) = self {
            Some(row)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_numeric(&self) -> Option<&[RowValues]> {
        if let FetchedRow::Numeric(values) = self {
            Some(values)
        } else {
            None
        }
    }

    /// The row's values in column order.
    #[must_use]
    pub fn into_values(self) -> Vec<RowValues> {
        match self {
            FetchedRow::Associative(row) => row.entries.into_iter().map(|(_, v)| v).collect(),
            FetchedRow::Numeric(values) => values,
            FetchedRow::Both(row) => row.rows,
        }
    }
}
