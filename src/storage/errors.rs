//! Storage error types
//!
//! Error codes:
//! - TAB_STORE_IO (ERROR severity)
//! - TAB_BLOB_RANGE (ERROR severity)
//! - TAB_DECODE_ERROR (FATAL severity)
//! - TAB_DATA_CORRUPTION (FATAL severity)

use std::fmt;

use thiserror::Error;

/// Severity levels for storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The invocation fails; the object stays usable
    Error,
    /// Stored data cannot be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by the stores and by row-batch decoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The underlying store failed; surfaced to the caller unchanged
    #[error("store {op} failed: {message}")]
    Io { op: String, message: String },

    /// A byte-range read falls outside the object
    #[error("range {offset}+{len} exceeds object size {size}")]
    RangeOutOfBounds { offset: u64, len: u64, size: u64 },

    /// A stored blob or row-batch is malformed
    #[error("decode error at byte {position}: {reason}")]
    Decode { position: usize, reason: String },

    /// A row-batch checksum does not match its contents
    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
}

impl StorageError {
    /// Builds an I/O failure for store operation `op`
    pub fn io(op: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::Io {
            op: op.into(),
            message: message.into(),
        }
    }

    pub(crate) fn decode(position: usize, reason: impl Into<String>) -> Self {
        StorageError::Decode {
            position,
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::Io { .. } => "TAB_STORE_IO",
            StorageError::RangeOutOfBounds { .. } => "TAB_BLOB_RANGE",
            StorageError::Decode { .. } => "TAB_DECODE_ERROR",
            StorageError::ChecksumMismatch { .. } => "TAB_DATA_CORRUPTION",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            StorageError::Io { .. } | StorageError::RangeOutOfBounds { .. } => Severity::Error,
            StorageError::Decode { .. } | StorageError::ChecksumMismatch { .. } => Severity::Fatal,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}
