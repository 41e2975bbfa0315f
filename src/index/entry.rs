//! Index entry values
//!
//! Entry values are JSON documents; keys carry all ordering information.

use serde::{Deserialize, Serialize};

use super::errors::{IndexError, IndexResult};

/// Byte range of one row-batch, keyed by its batch-sequence number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEntry {
    /// Object offset of the framed blob
    pub offset: u64,
    /// Framed length (prefix plus payload)
    pub len: u64,
}

/// Row reference stored under a content-index key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    /// Batch-sequence number of the containing row-batch
    pub seq: u64,
    /// Row position inside the batch
    pub position: u32,
    pub rid: i64,
    /// Word position, text indexes only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_pos: Option<u32>,
}

impl LocationEntry {
    pub fn encode(&self) -> IndexResult<Vec<u8>> {
        encode_json("location entry", self)
    }

    /// Decodes the value stored under `key`
    pub fn decode(key: &str, bytes: &[u8]) -> IndexResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| IndexError::corrupt(key, e))
    }
}

impl ContentEntry {
    pub fn encode(&self) -> IndexResult<Vec<u8>> {
        encode_json("content entry", self)
    }

    /// Decodes the value stored under `key`
    pub fn decode(key: &str, bytes: &[u8]) -> IndexResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| IndexError::corrupt(key, e))
    }
}

fn encode_json<T: Serialize>(what: &str, value: &T) -> IndexResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| IndexError::corrupt(what, e))
}
