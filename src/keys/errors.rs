//! Key codec error types

use thiserror::Error;

use crate::schema::ScalarType;

/// Result type for key encoding and decoding
pub type KeyResult<T> = Result<T, KeyError>;

/// Errors raised while encoding or decoding index keys
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Null values have no position in key order
    #[error("null value cannot be encoded as key data")]
    NullKey,

    /// The value's variant does not match the declared column type
    #[error("value of type {found} cannot be encoded as {expected} key data")]
    TypeMismatch {
        expected: ScalarType,
        found: String,
    },

    /// Stored key data does not decode as the declared column type
    #[error("malformed {scalar_type} key data {key_data:?}: {reason}")]
    Malformed {
        scalar_type: ScalarType,
        key_data: String,
        reason: String,
    },
}

impl KeyError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            KeyError::NullKey => "TAB_KEY_NULL",
            KeyError::TypeMismatch { .. } => "TAB_UNSUPPORTED_TYPE",
            KeyError::Malformed { .. } => "TAB_DECODE_ERROR",
        }
    }
}
