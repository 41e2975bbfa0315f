//! Planner error types
//!
//! Error codes:
//! - TAB_INDEX_NOT_USABLE
//! - TAB_PLAN_SEQUENCE_CONFLICT
//! - codes of wrapped index, storage and key errors, unchanged

use thiserror::Error;

use crate::index::IndexError;
use crate::keys::KeyError;
use crate::storage::StorageError;

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

/// Errors raised while reading indexes into read plans
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    /// The predicates cannot be answered by a bounded scan of the index
    #[error("index cannot answer predicates: {0}")]
    NotUsable(String),

    /// Two plans map one batch-sequence number to different byte ranges
    #[error("batch-sequence {seq} maps to offsets {first} and {second}")]
    SequenceConflict { seq: u64, first: u64, second: u64 },

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Key(#[from] KeyError),
}

impl PlannerError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            PlannerError::NotUsable(_) => "TAB_INDEX_NOT_USABLE",
            PlannerError::SequenceConflict { .. } => "TAB_PLAN_SEQUENCE_CONFLICT",
            PlannerError::Index(err) => err.code(),
            PlannerError::Storage(err) => err.code(),
            PlannerError::Key(err) => err.code(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        match self {
            PlannerError::Storage(err) => err.is_fatal(),
            PlannerError::Index(err) => err.is_fatal(),
            _ => true,
        }
    }
}
