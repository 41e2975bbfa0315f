//! Schema error types
//!
//! Error codes:
//! - TAB_EMPTY_SCHEMA
//! - TAB_BAD_COL_INFO_FORMAT
//! - TAB_UNKNOWN_DATA_TYPE
//! - TAB_COLUMN_NOT_PRESENT
//! - TAB_BAD_LITERAL

use thiserror::Error;

use super::types::ScalarType;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while parsing or projecting schemas.
///
/// All schema errors are decode errors: the request that carried the schema
/// string is aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Schema string describes no columns
    #[error("schema string contains no column descriptors")]
    EmptySchema,

    /// A column descriptor line is malformed
    #[error("bad column descriptor {line:?}: {reason}")]
    BadColInfoFormat { line: String, reason: String },

    /// A column type code is outside the supported range
    #[error("unknown scalar type code {0}")]
    UnknownDataType(i64),

    /// A referenced column name is absent from the schema
    #[error("column {0:?} not present in schema")]
    ColumnNotPresent(String),

    /// A literal cannot be parsed as the column's type
    #[error("literal {literal:?} is not a valid {scalar_type}")]
    BadLiteral {
        scalar_type: ScalarType,
        literal: String,
    },
}

impl SchemaError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::EmptySchema => "TAB_EMPTY_SCHEMA",
            SchemaError::BadColInfoFormat { .. } => "TAB_BAD_COL_INFO_FORMAT",
            SchemaError::UnknownDataType(_) => "TAB_UNKNOWN_DATA_TYPE",
            SchemaError::ColumnNotPresent(_) => "TAB_COLUMN_NOT_PRESENT",
            SchemaError::BadLiteral { .. } => "TAB_BAD_LITERAL",
        }
    }

    pub(crate) fn bad_line(line: &str, reason: impl Into<String>) -> Self {
        SchemaError::BadColInfoFormat {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SchemaError::EmptySchema.code(), "TAB_EMPTY_SCHEMA");
        assert_eq!(SchemaError::UnknownDataType(99).code(), "TAB_UNKNOWN_DATA_TYPE");
        assert_eq!(
            SchemaError::ColumnNotPresent("x".into()).code(),
            "TAB_COLUMN_NOT_PRESENT"
        );
    }

    #[test]
    fn test_error_display() {
        let err = SchemaError::bad_line("0 3 1", "expected 5 fields");
        let display = err.to_string();
        assert!(display.contains("0 3 1"));
        assert!(display.contains("expected 5 fields"));
    }
}
