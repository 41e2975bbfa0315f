//! Secondary index build for aerotab
//!
//! Indexes live in the object's ordered key-value store next to the data
//! they describe. Every build writes:
//!
//! - one location entry per row-batch (batch-sequence to byte range)
//! - content entries for the requested index kind (row-id, record, text)
//! - a marker entry under the bare content prefix once the build finishes
//!
//! # Invariants
//!
//! - Batch-sequence numbers increase monotonically and are never reused
//! - Deleted rows and rows with a null key column are never indexed
//! - Keys are built with the same codec the planner scans with

mod builder;
mod descriptor;
mod entry;
mod errors;
mod sequence;
mod text;

pub use builder::{BuildSummary, IndexBuilder};
pub use descriptor::IndexDescriptor;
pub use entry::{ContentEntry, LocationEntry};
pub use errors::{IndexError, IndexResult};
pub use sequence::{read_sequence_counter, write_sequence_counter};
pub use text::{tokenize, Stopwords, TextOptions};
