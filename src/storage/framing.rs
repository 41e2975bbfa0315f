//! Length-prefixed blob framing
//!
//! Object content is a concatenation of frames:
//!
//! ```text
//! [u32 LE payload length][payload bytes] [u32 LE payload length][payload bytes] ...
//! ```
//!
//! A frame's offset is the offset of its length prefix; its length covers
//! prefix and payload, so `(offset, len)` is directly readable.

use super::errors::{StorageError, StorageResult};

/// Size of the length prefix
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// One framed blob located inside a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramedBlob<'a> {
    /// Object offset of the length prefix
    pub offset: u64,
    /// Prefix plus payload length
    pub len: u64,
    pub payload: &'a [u8],
}

/// Appends one framed payload to `out`
pub fn frame_blob(payload: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
}

/// Frames a sequence of payloads into object content
pub fn frame_blobs<I, P>(payloads: I) -> Vec<u8>
where
    I: IntoIterator<Item = P>,
    P: AsRef<[u8]>,
{
    let mut out = Vec::new();
    for p in payloads {
        frame_blob(p.as_ref(), &mut out);
    }
    out
}

/// Iterates frames in `buf`, which starts at object offset `base_offset`.
///
/// A truncated frame yields one decode error and ends the iteration.
pub fn iter_blobs(buf: &[u8], base_offset: u64) -> BlobIter<'_> {
    BlobIter {
        buf,
        pos: 0,
        base_offset,
        failed: false,
    }
}

/// Iterator returned by `iter_blobs`
#[derive(Debug)]
pub struct BlobIter<'a> {
    buf: &'a [u8],
    pos: usize,
    base_offset: u64,
    failed: bool,
}

impl<'a> Iterator for BlobIter<'a> {
    type Item = StorageResult<FramedBlob<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.buf.len() {
            return None;
        }

        let start = self.pos;
        let Some(prefix) = self.buf.get(start..start + LENGTH_PREFIX_SIZE) else {
            self.failed = true;
            return Some(Err(StorageError::decode(start, "truncated length prefix")));
        };
        let mut len_bytes = [0u8; LENGTH_PREFIX_SIZE];
        len_bytes.copy_from_slice(prefix);
        let payload_len = u32::from_le_bytes(len_bytes) as usize;

        let payload_start = start + LENGTH_PREFIX_SIZE;
        let Some(payload) = self.buf.get(payload_start..payload_start + payload_len) else {
            self.failed = true;
            return Some(Err(StorageError::decode(
                start,
                format!("frame declares {} bytes past end of buffer", payload_len),
            )));
        };

        self.pos = payload_start + payload_len;
        Some(Ok(FramedBlob {
            offset: self.base_offset + start as u64,
            len: (LENGTH_PREFIX_SIZE + payload_len) as u64,
            payload,
        }))
    }
}
