//! Index build over an object's row-batches
//!
//! # Flow
//!
//! 1. Read the persisted batch-sequence counter (config minimum if absent)
//! 2. For each framed row-batch: assign the next sequence number, write its
//!    location entry, then one content entry per live row (or per token)
//! 3. Flush buffered entries whenever the buffer exceeds the batch size,
//!    and once more at the end
//! 4. Write the index-exists marker, then persist the advanced counter
//!
//! A decode failure aborts the build. Entries already flushed stay in the
//! store and the counter is not advanced, so a crash or error mid-build
//! leaves orphaned entries that a reconciliation pass must remove before
//! the object is rebuilt.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::config::EngineConfig;
use crate::keys::{
    build_key_data, build_prefix, join_key_data, location_key, record_key, text_key, IndexKind,
};
use crate::schema::{ColumnDescriptor, ScalarType, Schema, Value};
use crate::storage::{iter_blobs, BlobStore, OrderedStore, Row, RowBatchView};

use super::descriptor::IndexDescriptor;
use super::entry::{ContentEntry, LocationEntry};
use super::errors::{IndexError, IndexResult};
use super::sequence::{read_sequence_counter, write_sequence_counter};
use super::text::{tokenize, Stopwords};

/// Outcome of one index build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// First batch-sequence number assigned by this build
    pub first_seq: u64,
    /// Counter value persisted after the build
    pub next_seq: u64,
    pub batches: u64,
    pub rows_indexed: u64,
    /// Live rows left out because a key column was null
    pub rows_skipped: u64,
    /// Location plus content entries, excluding the marker
    pub entries_written: u64,
    pub flushes: u64,
}

/// Buffers entries and writes them in batches
struct EntryBuffer {
    entries: BTreeMap<String, Vec<u8>>,
    threshold: usize,
    written: u64,
    flushes: u64,
}

impl EntryBuffer {
    fn new(threshold: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            threshold: threshold.max(1),
            written: 0,
            flushes: 0,
        }
    }

    fn push<K: OrderedStore + ?Sized>(
        &mut self,
        kv: &mut K,
        key: String,
        value: Vec<u8>,
    ) -> IndexResult<()> {
        self.entries.insert(key, value);
        if self.entries.len() > self.threshold {
            self.flush(kv)?;
        }
        Ok(())
    }

    fn flush<K: OrderedStore + ?Sized>(&mut self, kv: &mut K) -> IndexResult<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        kv.put_batch(&self.entries)?;
        self.written += self.entries.len() as u64;
        self.flushes += 1;
        debug!(entries = self.entries.len(), "flushed index entries");
        self.entries.clear();
        Ok(())
    }
}

/// Builds secondary indexes for one object
pub struct IndexBuilder<'c> {
    config: &'c EngineConfig,
    stopwords: Stopwords,
}

impl<'c> IndexBuilder<'c> {
    pub fn new(config: &'c EngineConfig) -> Self {
        Self {
            config,
            stopwords: Stopwords::new(&config.stopwords),
        }
    }

    /// Scans every row-batch of the object and writes location and content
    /// entries for `descriptor`.
    #[instrument(
        name = "index::build",
        level = "debug",
        skip_all,
        fields(db = db, table = table, kind = ?descriptor.kind())
    )]
    pub fn build<K, B>(
        &self,
        kv: &mut K,
        blobs: &mut B,
        db: &str,
        table: &str,
        data_schema: &Schema,
        descriptor: &IndexDescriptor,
    ) -> IndexResult<BuildSummary>
    where
        K: OrderedStore + ?Sized,
        B: BlobStore + ?Sized,
    {
        descriptor.validate(data_schema)?;

        let db = self.config.db_name(db);
        let table = self.config.table_name(table);
        let location_prefix = build_prefix(IndexKind::Location, db, table, &[]);
        let content_prefix = descriptor.prefix(db, table);

        let first_seq = read_sequence_counter(
            blobs,
            &self.config.sequence_attr,
            self.config.min_batch_sequence,
        )?;
        let mut seq = first_seq;

        let size = blobs.size()?;
        let content = blobs.read(0, size)?;
        let batch_size = descriptor
            .batch_size()
            .unwrap_or(self.config.index_batch_size);
        let mut buffer = EntryBuffer::new(batch_size);
        let mut summary = BuildSummary {
            first_seq,
            ..Default::default()
        };

        for frame in iter_blobs(&content, 0) {
            let frame = frame?;
            let view = RowBatchView::decode(frame.payload)?;

            let location = LocationEntry {
                offset: frame.offset,
                len: frame.len,
            };
            buffer.push(kv, location_key(&location_prefix, seq), location.encode()?)?;

            for position in 0..view.nrows() {
                if view.is_deleted(position) {
                    continue;
                }
                let row = view.row(position)?;
                let indexed = self.index_row(
                    kv,
                    &mut buffer,
                    &content_prefix,
                    data_schema,
                    descriptor,
                    seq,
                    position,
                    &row,
                )?;
                if indexed {
                    summary.rows_indexed += 1;
                } else {
                    summary.rows_skipped += 1;
                }
            }

            debug!(seq, offset = frame.offset, rows = view.nrows(), "indexed row-batch");
            summary.batches += 1;
            seq += 1;
        }

        buffer.flush(kv)?;

        // Marker first, then the counter
        kv.put(&content_prefix, &[])?;
        write_sequence_counter(blobs, &self.config.sequence_attr, seq)?;

        summary.next_seq = seq;
        summary.entries_written = buffer.written;
        summary.flushes = buffer.flushes;
        Ok(summary)
    }

    /// Emits the content entries of one row. Returns false when the row has
    /// a null key column and is left out.
    #[allow(clippy::too_many_arguments)]
    fn index_row<K: OrderedStore + ?Sized>(
        &self,
        kv: &mut K,
        buffer: &mut EntryBuffer,
        prefix: &str,
        data_schema: &Schema,
        descriptor: &IndexDescriptor,
        seq: u64,
        position: usize,
        row: &Row,
    ) -> IndexResult<bool> {
        let entry = ContentEntry {
            seq,
            position: position as u32,
            rid: row.rid,
            word_pos: None,
        };

        match descriptor.kind() {
            IndexKind::RowId => {
                let data = build_key_data(ScalarType::UInt64, &Value::UInt64(row.rid as u64))?;
                buffer.push(kv, record_key(prefix, &data, true, row.rid), entry.encode()?)?;
            }
            IndexKind::Record => {
                let mut parts = Vec::with_capacity(descriptor.schema().len());
                for col in descriptor.schema().iter() {
                    let cell = key_cell(data_schema, row, col)?;
                    if cell.is_null() {
                        return Ok(false);
                    }
                    parts.push(build_key_data(col.scalar_type, &cell)?);
                }
                let key = record_key(prefix, &join_key_data(&parts), descriptor.is_unique(), row.rid);
                buffer.push(kv, key, entry.encode()?)?;
            }
            IndexKind::Text => {
                let options = descriptor.text_options();
                let delimiters = if options.delimiters.is_empty() {
                    self.config.text_delimiters.as_str()
                } else {
                    options.delimiters.as_str()
                };
                for col in descriptor.schema().iter() {
                    let cell = key_cell(data_schema, row, col)?;
                    let Some(text) = cell.as_str() else {
                        continue;
                    };
                    for (word_pos, token) in tokenize(text, delimiters) {
                        if options.remove_stopwords && self.stopwords.contains(&token) {
                            continue;
                        }
                        let entry = ContentEntry {
                            word_pos: Some(word_pos),
                            ..entry
                        };
                        let key = text_key(prefix, &token, row.rid, word_pos);
                        buffer.push(kv, key, entry.encode()?)?;
                    }
                }
            }
            IndexKind::Location => {
                return Err(IndexError::InvalidDescriptor(
                    "location entries are written per batch".into(),
                ))
            }
        }
        Ok(true)
    }
}

/// Value of a key column in `row`
fn key_cell(data_schema: &Schema, row: &Row, col: &ColumnDescriptor) -> IndexResult<Value> {
    if col.is_row_id() {
        return Ok(Value::UInt64(row.rid as u64));
    }
    let position = data_schema
        .position_of(col.idx)
        .ok_or_else(|| IndexError::ColumnMismatch {
            column: col.name.clone(),
            reason: "not in table schema".into(),
        })?;
    row.cell(position)
        .cloned()
        .ok_or_else(|| IndexError::ColumnMismatch {
            column: col.name.clone(),
            reason: format!("row {} has only {} cells", row.rid, row.cells.len()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::TextOptions;
    use crate::storage::{frame_blobs, null_bits_for, MemoryBlobStore, MemoryKvStore, RowBatchBuilder};

    const DATA: &str = "0 3 1 0 ORDERKEY\n1 15 0 1 COMMENT\n";

    fn batch(rows: &[(i64, i32, Option<&str>)], deleted: &[usize]) -> Vec<u8> {
        let schema = Schema::parse(DATA).unwrap();
        let mut b = RowBatchBuilder::new("db", "t", DATA);
        for (rid, key, comment) in rows {
            let cells = vec![
                Value::Int32(*key),
                comment.map_or(Value::Null, |c| Value::String(c.to_string())),
            ];
            b.push_row(*rid, &null_bits_for(&schema, &cells), &cells);
        }
        for d in deleted {
            b.mark_deleted(*d);
        }
        b.finish()
    }

    fn object() -> MemoryBlobStore {
        MemoryBlobStore::with_content(frame_blobs([
            batch(&[(1, 1, Some("the quick fox")), (2, 2, None)], &[]),
            batch(&[(3, 2, Some("quick quick")), (4, 3, Some("gone"))], &[1]),
        ]))
    }

    #[test]
    fn test_record_build() {
        let config = EngineConfig::default();
        let mut kv = MemoryKvStore::new();
        let mut blobs = object();
        let desc =
            IndexDescriptor::record(Schema::parse("0 3 1 0 ORDERKEY").unwrap(), false).unwrap();

        let summary = IndexBuilder::new(&config)
            .build(&mut kv, &mut blobs, "db", "t", &Schema::parse(DATA).unwrap(), &desc)
            .unwrap();

        assert_eq!(summary.first_seq, 0);
        assert_eq!(summary.next_seq, 2);
        assert_eq!(summary.batches, 2);
        assert_eq!(summary.rows_indexed, 3);
        // 2 location + 3 content entries
        assert_eq!(summary.entries_written, 5);
        assert_eq!(kv.get("IDX_REC:db-t:ORDERKEY:").unwrap(), Some(Vec::new()));
        assert_eq!(blobs.get_attr("_seq_num").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn test_rebuild_uses_fresh_sequences() {
        let config = EngineConfig::default();
        let mut kv = MemoryKvStore::new();
        let mut blobs = object();
        let desc = IndexDescriptor::row_id();
        let data = Schema::parse(DATA).unwrap();
        let builder = IndexBuilder::new(&config);

        builder.build(&mut kv, &mut blobs, "db", "t", &data, &desc).unwrap();
        let second = builder.build(&mut kv, &mut blobs, "db", "t", &data, &desc).unwrap();
        assert_eq!(second.first_seq, 2);
        assert_eq!(second.next_seq, 4);
    }

    #[test]
    fn test_text_build_with_stopwords() {
        let config = EngineConfig::default();
        let mut kv = MemoryKvStore::new();
        let mut blobs = object();
        let desc = IndexDescriptor::text(
            Schema::parse("1 15 0 1 COMMENT").unwrap(),
            TextOptions {
                delimiters: String::new(),
                remove_stopwords: true,
            },
        )
        .unwrap();

        IndexBuilder::new(&config)
            .build(&mut kv, &mut blobs, "db", "t", &Schema::parse(DATA).unwrap(), &desc)
            .unwrap();

        let keys: Vec<&str> = kv
            .keys_with_prefix("IDX_TXT:db-t:COMMENT:")
            .filter(|k| k.len() > "IDX_TXT:db-t:COMMENT:".len())
            .collect();
        // "the" dropped; "quick" repeated in row 3 yields two distinct keys
        assert_eq!(keys.len(), 4);
        assert!(keys.iter().all(|k| !k.contains(":the:")));
    }

    #[test]
    fn test_small_batch_size_flushes_repeatedly() {
        let config = EngineConfig::with_batch_size(1);
        let mut kv = MemoryKvStore::new();
        let mut blobs = object();
        let desc = IndexDescriptor::row_id();
        let summary = IndexBuilder::new(&config)
            .build(&mut kv, &mut blobs, "db", "t", &Schema::parse(DATA).unwrap(), &desc)
            .unwrap();
        assert!(summary.flushes >= 2);
        assert_eq!(summary.entries_written, 5);
    }

    #[test]
    fn test_corrupt_batch_aborts() {
        let config = EngineConfig::default();
        let mut kv = MemoryKvStore::new();
        let mut bytes = batch(&[(1, 1, None)], &[]);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let mut blobs = MemoryBlobStore::with_content(frame_blobs([bytes]));

        let err = IndexBuilder::new(&config)
            .build(
                &mut kv,
                &mut blobs,
                "db",
                "t",
                &Schema::parse(DATA).unwrap(),
                &IndexDescriptor::row_id(),
            )
            .unwrap_err();
        assert_eq!(err.code(), "TAB_DATA_CORRUPTION");
        assert_eq!(kv.get("IDX_RID:db-t:RID:").unwrap(), None);
        assert_eq!(blobs.get_attr("_seq_num").unwrap(), None);
    }
}
