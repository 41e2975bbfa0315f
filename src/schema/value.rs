//! Typed cell and literal values
//!
//! One variant per scalar type plus `Null`. Values decoded from a row carry
//! the variant of their column type; predicate literals are parsed into the
//! variant of the column they bind to.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};
use super::types::ScalarType;

/// Date format for date columns and literals
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A typed scalar value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Char(i8),
    UChar(u8),
    Bool(bool),
    Float(f32),
    Double(f64),
    Date(String),
    String(String),
}

impl Value {
    /// Scalar type of this value; `None` for `Null`
    pub fn scalar_type(&self) -> Option<ScalarType> {
        Some(match self {
            Value::Null => return None,
            Value::Int8(_) => ScalarType::Int8,
            Value::Int16(_) => ScalarType::Int16,
            Value::Int32(_) => ScalarType::Int32,
            Value::Int64(_) => ScalarType::Int64,
            Value::UInt8(_) => ScalarType::UInt8,
            Value::UInt16(_) => ScalarType::UInt16,
            Value::UInt32(_) => ScalarType::UInt32,
            Value::UInt64(_) => ScalarType::UInt64,
            Value::Char(_) => ScalarType::Char,
            Value::UChar(_) => ScalarType::UChar,
            Value::Bool(_) => ScalarType::Bool,
            Value::Float(_) => ScalarType::Float,
            Value::Double(_) => ScalarType::Double,
            Value::Date(_) => ScalarType::Date,
            Value::String(_) => ScalarType::String,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Widens signed integers and `char` to 64 bits
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int8(v) => Some(*v as i64),
            Value::Int16(v) => Some(*v as i64),
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            Value::Char(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Widens unsigned integers and `uchar` to 64 bits
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt8(v) => Some(*v as u64),
            Value::UInt16(v) => Some(*v as u64),
            Value::UInt32(v) => Some(*v as u64),
            Value::UInt64(v) => Some(*v),
            Value::UChar(v) => Some(*v as u64),
            _ => None,
        }
    }

    /// Widens floating values to `f64`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// String view of textual values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Date(s) | Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Parses a literal from its textual form into the variant for `ty`.
    ///
    /// Integers must fit the column width; `char`/`uchar` take the first
    /// byte of the literal; dates must be `YYYY-MM-DD`.
    pub fn parse_literal(ty: ScalarType, literal: &str) -> SchemaResult<Value> {
        let bad = || SchemaError::BadLiteral {
            scalar_type: ty,
            literal: literal.to_string(),
        };
        let trimmed = literal.trim();

        let value = match ty {
            ScalarType::Int8 => Value::Int8(trimmed.parse().map_err(|_| bad())?),
            ScalarType::Int16 => Value::Int16(trimmed.parse().map_err(|_| bad())?),
            ScalarType::Int32 => Value::Int32(trimmed.parse().map_err(|_| bad())?),
            ScalarType::Int64 => Value::Int64(trimmed.parse().map_err(|_| bad())?),
            ScalarType::UInt8 => Value::UInt8(trimmed.parse().map_err(|_| bad())?),
            ScalarType::UInt16 => Value::UInt16(trimmed.parse().map_err(|_| bad())?),
            ScalarType::UInt32 => Value::UInt32(trimmed.parse().map_err(|_| bad())?),
            ScalarType::UInt64 => Value::UInt64(trimmed.parse().map_err(|_| bad())?),
            ScalarType::Char => Value::Char(*literal.as_bytes().first().ok_or_else(bad)? as i8),
            ScalarType::UChar => Value::UChar(*literal.as_bytes().first().ok_or_else(bad)?),
            ScalarType::Bool => match trimmed {
                "1" | "true" | "TRUE" => Value::Bool(true),
                "0" | "false" | "FALSE" => Value::Bool(false),
                _ => return Err(bad()),
            },
            ScalarType::Float => Value::Float(trimmed.parse().map_err(|_| bad())?),
            ScalarType::Double => Value::Double(trimmed.parse().map_err(|_| bad())?),
            ScalarType::Date => {
                NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| bad())?;
                Value::Date(trimmed.to_string())
            }
            ScalarType::String => Value::String(literal.to_string()),
        };
        Ok(value)
    }

    /// Textual literal form accepted by `parse_literal`
    pub fn to_literal(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Char(v) => ((*v as u8) as char).to_string(),
            Value::UChar(v) => (*v as char).to_string(),
            Value::Bool(v) => u8::from(*v).to_string(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt8(v) => write!(f, "{}", v),
            Value::UInt16(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", (*v as u8) as char),
            Value::UChar(v) => write!(f, "{}", *v as char),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Date(s) | Value::String(s) => write!(f, "{}", s),
        }
    }
}
