//! Predicate error types
//!
//! Error codes:
//! - TAB_BAD_PREDICATE_FORMAT
//! - TAB_UNKNOWN_OPERATOR
//! - TAB_PREDICATE_COMPARISON_NOT_DEFINED
//! - TAB_UNSUPPORTED_AGG_TYPE
//! - TAB_UNSUPPORTED_TYPE
//! - TAB_BAD_REGEX
//! - TAB_DECODE_ERROR

use thiserror::Error;

use crate::schema::{ScalarType, SchemaError};

use super::operator::Operator;

/// Result type for predicate operations
pub type PredicateResult<T> = Result<T, PredicateError>;

/// Errors raised while parsing or evaluating predicates
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredicateError {
    /// A predicate item is not `col,op,value`
    #[error("bad predicate {item:?}: {reason}")]
    BadPredicateFormat { item: String, reason: String },

    #[error("unknown predicate operator {0:?}")]
    UnknownOperator(String),

    /// The operator has no meaning for the column's type
    #[error("operator {op} is not defined for {scalar_type} columns")]
    ComparisonNotDefined { op: Operator, scalar_type: ScalarType },

    /// Aggregate requested over a type that cannot hold a running value
    #[error("aggregate {op} is not supported for {scalar_type} columns")]
    UnsupportedAggType { op: Operator, scalar_type: ScalarType },

    /// A cell value does not carry its column's type
    #[error("cell of type {found} does not match {expected} column")]
    TypeMismatch { expected: ScalarType, found: String },

    #[error("invalid like pattern {pattern:?}: {reason}")]
    BadRegex { pattern: String, reason: String },

    /// A stored cell cannot be interpreted (e.g. a malformed date)
    #[error("malformed {scalar_type} value {value:?}")]
    BadValue { scalar_type: ScalarType, value: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl PredicateError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            PredicateError::BadPredicateFormat { .. } => "TAB_BAD_PREDICATE_FORMAT",
            PredicateError::UnknownOperator(_) => "TAB_UNKNOWN_OPERATOR",
            PredicateError::ComparisonNotDefined { .. } => "TAB_PREDICATE_COMPARISON_NOT_DEFINED",
            PredicateError::UnsupportedAggType { .. } => "TAB_UNSUPPORTED_AGG_TYPE",
            PredicateError::TypeMismatch { .. } => "TAB_UNSUPPORTED_TYPE",
            PredicateError::BadRegex { .. } => "TAB_BAD_REGEX",
            PredicateError::BadValue { .. } => "TAB_DECODE_ERROR",
            PredicateError::Schema(err) => err.code(),
        }
    }

    pub(crate) fn bad_item(item: &str, reason: impl Into<String>) -> Self {
        PredicateError::BadPredicateFormat {
            item: item.to_string(),
            reason: reason.into(),
        }
    }
}
