//! Persisted batch-sequence counter
//!
//! The counter is the next unassigned batch-sequence number, stored as a
//! decimal string in an object attribute. Numbers are never reused: a
//! rebuild assigns fresh numbers after the previous build's.

use crate::storage::BlobStore;

use super::errors::{IndexError, IndexResult};

/// Reads the counter, or `default` when the attribute is absent
pub fn read_sequence_counter<B: BlobStore + ?Sized>(
    blobs: &B,
    attr: &str,
    default: u64,
) -> IndexResult<u64> {
    let Some(raw) = blobs.get_attr(attr)? else {
        return Ok(default);
    };
    let text = String::from_utf8_lossy(&raw);
    text.trim()
        .parse::<u64>()
        .map_err(|_| IndexError::BadSequenceCounter(text.into_owned()))
}

pub fn write_sequence_counter<B: BlobStore + ?Sized>(
    blobs: &mut B,
    attr: &str,
    next: u64,
) -> IndexResult<()> {
    blobs.set_attr(attr, next.to_string().as_bytes())?;
    Ok(())
}
