use std::error::Error;

use tokio_postgres::types::{IsNull, ToSql, Type};
use tokio_util::bytes;

use crate::types::RowValues;

/// Container for Postgres parameters with lifetime tracking
pub struct Params<'a> {
    references: Vec<&'a (dyn ToSql + Sync)>,
}

impl<'a> Params<'a> {
    /// Borrow positional values as Postgres parameters
    #[must_use]
    pub fn convert(values: &[&'a RowValues]) -> Params<'a> {
        let mut references = Vec::with_capacity(values.len());
        for value in values {
            references.push(*value as &(dyn ToSql + Sync));
        }
        Params { references }
    }

    /// Get a reference to the underlying parameter array
    #[must_use]
    pub fn as_refs(&self) -> &[&(dyn ToSql + Sync)] {
        &self.references
    }
}

fn is_text_type(ty: &Type) -> bool {
    matches!(*ty, Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "t" | "true" | "1" | "y" | "yes" | "on" => Some(true),
        "f" | "false" | "0" | "n" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Whether this particular value can be encoded for a parameter of type `ty`.
///
/// Scalars are also accepted by text parameters, and text is accepted by numeric
/// and boolean parameters when it parses, mirroring client-side emulated binds.
fn value_accepts(value: &RowValues, ty: &Type) -> bool {
    match value {
        RowValues::Null => true,
        RowValues::Int(_) => {
            matches!(*ty, Type::INT2 | Type::INT4 | Type::INT8 | Type::FLOAT4 | Type::FLOAT8)
                || is_text_type(ty)
        }
        RowValues::Float(_) => matches!(*ty, Type::FLOAT4 | Type::FLOAT8) || is_text_type(ty),
        RowValues::Bool(_) => *ty == Type::BOOL || is_text_type(ty),
        RowValues::Text(s) => match *ty {
            Type::INT2 | Type::INT4 | Type::INT8 => s.trim().parse::<i64>().is_ok(),
            Type::FLOAT4 | Type::FLOAT8 => s.trim().parse::<f64>().is_ok(),
            Type::BOOL => parse_bool(s).is_some(),
            _ => <String as ToSql>::accepts(ty),
        },
        RowValues::Timestamp(_) => {
            matches!(*ty, Type::TIMESTAMP | Type::TIMESTAMPTZ | Type::DATE) || is_text_type(ty)
        }
        RowValues::JSON(_) => {
            <serde_json::Value as ToSql>::accepts(ty) || is_text_type(ty)
        }
        RowValues::Blob(_) => <Vec<u8> as ToSql>::accepts(ty),
    }
}

impl ToSql for RowValues {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            RowValues::Null => Ok(IsNull::Yes),
            RowValues::Text(s) => match *ty {
                Type::INT2 | Type::INT4 | Type::INT8 => {
                    RowValues::Int(s.trim().parse::<i64>()?).to_sql(ty, out)
                }
                Type::FLOAT4 | Type::FLOAT8 => {
                    RowValues::Float(s.trim().parse::<f64>()?).to_sql(ty, out)
                }
                Type::BOOL => match parse_bool(s) {
                    Some(b) => b.to_sql(ty, out),
                    None => Err(format!("cannot interpret {s:?} as boolean").into()),
                },
                _ => s.to_sql(ty, out),
            },
            RowValues::Blob(bytes) => bytes.to_sql(ty, out),
            other if is_text_type(ty) => match other.to_text() {
                Some(text) => text.to_sql(ty, out),
                None => Ok(IsNull::Yes),
            },
            RowValues::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                #[allow(clippy::cast_precision_loss)]
                Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                #[allow(clippy::cast_precision_loss)]
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                _ => i.to_sql(ty, out),
            },
            RowValues::Float(f) => match *ty {
                #[allow(clippy::cast_possible_truncation)]
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                _ => f.to_sql(ty, out),
            },
            RowValues::Bool(b) => b.to_sql(ty, out),
            RowValues::Timestamp(dt) => match *ty {
                Type::TIMESTAMPTZ => dt.and_utc().to_sql(ty, out),
                Type::DATE => dt.date().to_sql(ty, out),
                _ => dt.to_sql(ty, out),
            },
            RowValues::JSON(jsval) => jsval.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        match *ty {
            // Integer types
            Type::INT2 | Type::INT4 | Type::INT8 => true,
            // Floating point types
            Type::FLOAT4 | Type::FLOAT8 => true,
            // Text types
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => true,
            // Boolean type
            Type::BOOL => true,
            // Date/time types
            Type::TIMESTAMP | Type::TIMESTAMPTZ | Type::DATE => true,
            // JSON types
            Type::JSON | Type::JSONB => true,
            // Binary data
            Type::BYTEA => true,
            _ => false,
        }
    }

    fn to_sql_checked(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        if !value_accepts(self, ty) {
            return Err(format!("cannot bind {self:?} to a parameter of type {ty}").into());
        }
        self.to_sql(ty, out)
    }
}
