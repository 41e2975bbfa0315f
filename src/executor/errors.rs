//! Executor error types
//!
//! Error codes:
//! - TAB_ROW_INDEX_OOB (FATAL)
//! - TAB_PROJECTION_MISMATCH
//! - TAB_DECODE_ERROR for malformed requests
//! - codes of wrapped errors, unchanged

use thiserror::Error;

use crate::index::IndexError;
use crate::planner::PlannerError;
use crate::predicate::PredicateError;
use crate::schema::SchemaError;
use crate::storage::StorageError;

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Errors raised while executing a query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// A read plan or caller named a row the batch does not have
    #[error("row position {position} out of bounds for batch of {nrows} rows")]
    RowIndexOutOfBounds { position: usize, nrows: usize },

    /// A projected or filtered column is absent from the table schema
    #[error("column {column} cannot be read: {reason}")]
    ProjectionMismatch { column: String, reason: String },

    #[error("malformed query request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Predicate(#[from] PredicateError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Planner(#[from] PlannerError),
}

impl ExecutorError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorError::RowIndexOutOfBounds { .. } => "TAB_ROW_INDEX_OOB",
            ExecutorError::ProjectionMismatch { .. } => "TAB_PROJECTION_MISMATCH",
            ExecutorError::InvalidRequest(_) => "TAB_DECODE_ERROR",
            ExecutorError::Schema(err) => err.code(),
            ExecutorError::Predicate(err) => err.code(),
            ExecutorError::Storage(err) => err.code(),
            ExecutorError::Index(err) => err.code(),
            ExecutorError::Planner(err) => err.code(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        match self {
            ExecutorError::Storage(err) => err.is_fatal(),
            ExecutorError::Index(err) => err.is_fatal(),
            ExecutorError::Planner(err) => err.is_fatal(),
            _ => true,
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ExecutorError::InvalidRequest(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let oob = ExecutorError::RowIndexOutOfBounds {
            position: 7,
            nrows: 3,
        };
        assert_eq!(oob.code(), "TAB_ROW_INDEX_OOB");
        assert!(oob.is_fatal());
        assert!(oob.to_string().contains("7"));

        assert_eq!(ExecutorError::invalid("bad json").code(), "TAB_DECODE_ERROR");
    }

    #[test]
    fn test_wrapped_code_passes_through() {
        let io = StorageError::io("read", "connection reset");
        let err: ExecutorError = PlannerError::from(io).into();
        assert_eq!(err.code(), "TAB_STORE_IO");
    }
}
