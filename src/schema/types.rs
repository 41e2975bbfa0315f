//! Scalar column types
//!
//! Type codes are part of the schema string format and must not change:
//!
//! ```text
//! int8=1 int16=2 int32=3 int64=4 uint8=5 uint16=6 uint32=7 uint64=8
//! char=9 uchar=10 bool=11 float=12 double=13 date=14 string=15
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};

/// Scalar type of a table column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Char,
    UChar,
    Bool,
    Float,
    Double,
    /// Calendar date as `YYYY-MM-DD`
    Date,
    String,
}

impl ScalarType {
    /// All supported types in code order
    pub const ALL: [ScalarType; 15] = [
        ScalarType::Int8,
        ScalarType::Int16,
        ScalarType::Int32,
        ScalarType::Int64,
        ScalarType::UInt8,
        ScalarType::UInt16,
        ScalarType::UInt32,
        ScalarType::UInt64,
        ScalarType::Char,
        ScalarType::UChar,
        ScalarType::Bool,
        ScalarType::Float,
        ScalarType::Double,
        ScalarType::Date,
        ScalarType::String,
    ];

    /// Resolves a type from its schema-string code
    pub fn from_code(code: i64) -> SchemaResult<Self> {
        if code < 1 || code as usize > Self::ALL.len() {
            return Err(SchemaError::UnknownDataType(code));
        }
        Ok(Self::ALL[(code - 1) as usize])
    }

    /// Returns the schema-string code
    pub fn code(&self) -> u8 {
        match self {
            ScalarType::Int8 => 1,
            ScalarType::Int16 => 2,
            ScalarType::Int32 => 3,
            ScalarType::Int64 => 4,
            ScalarType::UInt8 => 5,
            ScalarType::UInt16 => 6,
            ScalarType::UInt32 => 7,
            ScalarType::UInt64 => 8,
            ScalarType::Char => 9,
            ScalarType::UChar => 10,
            ScalarType::Bool => 11,
            ScalarType::Float => 12,
            ScalarType::Double => 13,
            ScalarType::Date => 14,
            ScalarType::String => 15,
        }
    }

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ScalarType::Int8 => "int8",
            ScalarType::Int16 => "int16",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::UInt8 => "uint8",
            ScalarType::UInt16 => "uint16",
            ScalarType::UInt32 => "uint32",
            ScalarType::UInt64 => "uint64",
            ScalarType::Char => "char",
            ScalarType::UChar => "uchar",
            ScalarType::Bool => "bool",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
            ScalarType::Date => "date",
            ScalarType::String => "string",
        }
    }

    pub fn is_signed_int(&self) -> bool {
        matches!(
            self,
            ScalarType::Int8 | ScalarType::Int16 | ScalarType::Int32 | ScalarType::Int64
        )
    }

    pub fn is_unsigned_int(&self) -> bool {
        matches!(
            self,
            ScalarType::UInt8 | ScalarType::UInt16 | ScalarType::UInt32 | ScalarType::UInt64
        )
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, ScalarType::Float | ScalarType::Double)
    }

    /// Types that can carry a running min/max/sum/cnt aggregate
    pub fn is_aggregatable(&self) -> bool {
        self.is_signed_int() || self.is_unsigned_int() || self.is_floating()
    }

    /// Types whose values are free text (eligible for text indexes)
    pub fn is_textual(&self) -> bool {
        matches!(self, ScalarType::String)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}
