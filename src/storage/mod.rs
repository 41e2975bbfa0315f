//! Object storage interfaces and on-object layout
//!
//! Each object pairs two stores:
//!
//! - an ordered key-value store (`OrderedStore`) holding index entries
//! - a byte store (`BlobStore`) holding the object content and attributes
//!
//! Object content is a concatenation of length-prefixed blobs, each one
//! row-batch. Row-batches are checksummed and decoded through a
//! bounds-checked reader; malformed bytes become decode errors, never
//! out-of-bounds reads.

mod batch;
mod blob;
mod checksum;
mod errors;
mod framing;
mod kv;

pub use batch::{null_bits_for, BatchReader, Row, RowBatchBuilder, RowBatchView, BATCH_FORMAT_VERSION};
pub use blob::{BlobStore, MemoryBlobStore};
pub use checksum::{compute_checksum, verify_checksum};
pub use errors::{Severity, StorageError, StorageResult};
pub use framing::{frame_blob, frame_blobs, iter_blobs, BlobIter, FramedBlob, LENGTH_PREFIX_SIZE};
pub use kv::{KeyPage, MemoryKvStore, OrderedStore};
