//! Index error types
//!
//! Error codes:
//! - TAB_INVALID_INDEX
//! - TAB_INDEX_COLUMN_MISMATCH
//! - TAB_UNSUPPORTED_TYPE
//! - TAB_DECODE_ERROR (corrupt entries, bad sequence counter)
//! - codes of wrapped storage, key and schema errors, unchanged

use thiserror::Error;

use crate::keys::KeyError;
use crate::schema::{ScalarType, SchemaError};
use crate::storage::StorageError;

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors raised while building or decoding indexes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// The index definition cannot be built
    #[error("invalid index descriptor: {0}")]
    InvalidDescriptor(String),

    /// A key column does not line up with the data schema or the row
    #[error("index column {column:?}: {reason}")]
    ColumnMismatch { column: String, reason: String },

    #[error("text index column {column:?} has non-text type {scalar_type}")]
    UnsupportedType {
        column: String,
        scalar_type: ScalarType,
    },

    /// A stored index entry does not decode
    #[error("corrupt index entry {key:?}: {reason}")]
    CorruptEntry { key: String, reason: String },

    /// The persisted batch-sequence counter is unreadable
    #[error("bad batch-sequence counter {0:?}")]
    BadSequenceCounter(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl IndexError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::InvalidDescriptor(_) => "TAB_INVALID_INDEX",
            IndexError::ColumnMismatch { .. } => "TAB_INDEX_COLUMN_MISMATCH",
            IndexError::UnsupportedType { .. } => "TAB_UNSUPPORTED_TYPE",
            IndexError::CorruptEntry { .. } | IndexError::BadSequenceCounter(_) => {
                "TAB_DECODE_ERROR"
            }
            IndexError::Storage(err) => err.code(),
            IndexError::Key(err) => err.code(),
            IndexError::Schema(err) => err.code(),
        }
    }

    /// Store I/O failures are not fatal to the object; everything else is
    pub fn is_fatal(&self) -> bool {
        match self {
            IndexError::Storage(err) => err.is_fatal(),
            _ => true,
        }
    }

    pub(crate) fn corrupt(key: &str, reason: impl ToString) -> Self {
        IndexError::CorruptEntry {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}
