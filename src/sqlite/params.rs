use rusqlite::types::Value;

use crate::types::RowValues;

/// Convert a single `RowValues` to a rusqlite `Value`.
///
/// `SQLite` has no boolean, timestamp or JSON storage classes: booleans become
/// integers, timestamps become `YYYY-MM-DD HH:MM:SS[.fff]` text and JSON is
/// stored as its serialized text.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    #[test]
    fn non_native_types_are_stored_as_text_or_integer() {
        let ts = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_opt(13, 5, 0)
            .unwrap();
        assert_eq!(
            row_value_to_sqlite_value(&RowValues::Timestamp(ts)),
            Value::Text("2024-02-29 13:05:00".into())
        );
        assert_eq!(
            row_value_to_sqlite_value(&RowValues::Bool(true)),
            Value::Integer(1)
        );
        assert_eq!(
            row_value_to_sqlite_value(&RowValues::JSON(json!({"a": 1}))),
            Value::Text(r#"{"a":1}"#.into())
        );
    }
}
