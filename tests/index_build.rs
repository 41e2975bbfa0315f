//! Index Build Tests
//!
//! Tests for index build invariants:
//! - The index marker is absent before a build and present after it
//! - Deleted rows are never indexed
//! - Batch-sequence numbers are persisted and never reused
//! - Store failures surface as TAB_STORE_IO and abort the build

use std::collections::BTreeMap;

use aerotab::index::{
    read_sequence_counter, ContentEntry, IndexBuilder, IndexDescriptor, LocationEntry, TextOptions,
};
use aerotab::keys::{build_prefix, IndexKind};
use aerotab::planner::{AlwaysSelective, IndexPlanner};
use aerotab::schema::{Schema, Value};
use aerotab::storage::{
    frame_blobs, null_bits_for, BlobStore, KeyPage, MemoryBlobStore, MemoryKvStore, OrderedStore,
    RowBatchBuilder, StorageError, StorageResult,
};
use aerotab::EngineConfig;

const DATA: &str = "0 3 1 0 ORDERKEY\n1 15 0 1 COMMENT\n";

// =============================================================================
// Helper Functions
// =============================================================================

fn make_batch(rows: &[(i64, i32, Option<&str>)], deleted: &[usize]) -> Vec<u8> {
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

fn make_object() -> MemoryBlobStore {
    MemoryBlobStore::with_content(frame_blobs([
        make_batch(&[(1, 1, Some("quick brown fox")), (2, 2, Some("the lazy dog"))], &[]),
        make_batch(&[(3, 2, None), (4, 3, Some("brown cow"))], &[0]),
    ]))
}

fn make_record_index() -> IndexDescriptor {
    IndexDescriptor::record(Schema::parse("0 3 1 0 ORDERKEY").unwrap(), false).unwrap()
}

fn build(
    config: &EngineConfig,
    kv: &mut MemoryKvStore,
    blobs: &mut MemoryBlobStore,
    desc: &IndexDescriptor,
) {
    IndexBuilder::new(config)
        .build(kv, blobs, "db", "t", &Schema::parse(DATA).unwrap(), desc)
        .unwrap();
}

fn content_rids(kv: &MemoryKvStore, prefix: &str) -> Vec<i64> {
    kv.keys_with_prefix(prefix)
        .filter(|k| *k != prefix)
        .map(|k| {
            let bytes = kv.get(k).unwrap().unwrap();
            ContentEntry::decode(k, &bytes).unwrap().rid
        })
        .collect()
}

/// Ordered store whose reads or writes can be made to fail
struct FailingKv {
    inner: MemoryKvStore,
    fail_reads: bool,
    fail_writes: bool,
}

impl FailingKv {
    fn new(fail_reads: bool, fail_writes: bool) -> Self {
        Self {
            inner: MemoryKvStore::new(),
            fail_reads,
            fail_writes,
        }
    }

    fn check_read(&self, op: &str) -> StorageResult<()> {
        if self.fail_reads {
            return Err(StorageError::io(op, "injected read failure"));
        }
        Ok(())
    }

    fn check_write(&self, op: &str) -> StorageResult<()> {
        if self.fail_writes {
            return Err(StorageError::io(op, "injected write failure"));
        }
        Ok(())
    }
}

impl OrderedStore for FailingKv {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.check_read("get")?;
        self.inner.get(key)
    }

    fn put(&mut self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.check_write("put")?;
        self.inner.put(key, value)
    }

    fn put_batch(&mut self, entries: &BTreeMap<String, Vec<u8>>) -> StorageResult<()> {
        self.check_write("put_batch")?;
        self.inner.put_batch(entries)
    }

    fn range(&self, start_after: &str, end: Option<&str>, limit: usize) -> StorageResult<KeyPage> {
        self.check_read("range")?;
        self.inner.range(start_after, end, limit)
    }

    fn keys(&self, start_after: &str, limit: usize) -> StorageResult<(Vec<String>, bool)> {
        self.check_read("keys")?;
        self.inner.keys(start_after, limit)
    }
}

// =============================================================================
// Marker Tests
// =============================================================================

/// indexExists is false before a build and true after it.
#[test]
fn test_marker_present_only_after_build() {
    let config = EngineConfig::default();
    let (mut kv, mut blobs) = (MemoryKvStore::new(), make_object());
    let desc = make_record_index();
    let prefix = desc.prefix("db", "t");

    {
        let planner = IndexPlanner::new(&kv, &blobs, &config, &AlwaysSelective, "db", "t");
        assert!(!planner.index_exists(&prefix).unwrap());
    }

    build(&config, &mut kv, &mut blobs, &desc);

    let planner = IndexPlanner::new(&kv, &blobs, &config, &AlwaysSelective, "db", "t");
    assert!(planner.index_exists(&prefix).unwrap());
    assert_eq!(kv.get(&prefix).unwrap(), Some(Vec::new()));
}

/// Building one index does not mark another as present.
#[test]
fn test_marker_is_per_index() {
    let config = EngineConfig::default();
    let (mut kv, mut blobs) = (MemoryKvStore::new(), make_object());
    build(&config, &mut kv, &mut blobs, &make_record_index());

    let planner = IndexPlanner::new(&kv, &blobs, &config, &AlwaysSelective, "db", "t");
    let rid_prefix = IndexDescriptor::row_id().prefix("db", "t");
    assert!(!planner.index_exists(&rid_prefix).unwrap());
}

// =============================================================================
// Content Tests
// =============================================================================

/// A deleted row is never indexed.
#[test]
fn test_deleted_rows_never_indexed() {
    let config = EngineConfig::default();
    let (mut kv, mut blobs) = (MemoryKvStore::new(), make_object());
    let desc = IndexDescriptor::row_id();
    build(&config, &mut kv, &mut blobs, &desc);

    let rids = content_rids(&kv, &desc.prefix("db", "t"));
    assert_eq!(rids, vec![1, 2, 4]);
}

/// Text entries skip nulls and stopwords but keep word positions.
#[test]
fn test_text_index_entries() {
    let config = EngineConfig::default();
    let (mut kv, mut blobs) = (MemoryKvStore::new(), make_object());
    let options = TextOptions {
        delimiters: String::new(),
        remove_stopwords: true,
    };
    let desc = IndexDescriptor::text(Schema::parse("1 15 0 1 COMMENT").unwrap(), options).unwrap();
    build(&config, &mut kv, &mut blobs, &desc);

    let prefix = desc.prefix("db", "t");
    let words: Vec<&str> = kv
        .keys_with_prefix(&prefix)
        .filter(|k| *k != prefix)
        .filter_map(|k| k[prefix.len()..].split(':').next())
        .collect();
    assert_eq!(words, vec!["brown", "brown", "cow", "dog", "fox", "lazy", "quick"]);

    let lazy = kv
        .keys_with_prefix(&prefix)
        .find(|k| k[prefix.len()..].starts_with("lazy:"))
        .unwrap();
    let entry = ContentEntry::decode(lazy, &kv.get(lazy).unwrap().unwrap()).unwrap();
    assert_eq!(entry.word_pos, Some(1));
    assert_eq!((entry.seq, entry.position, entry.rid), (0, 1, 2));
}

// =============================================================================
// Location and Sequence Tests
// =============================================================================

/// Location entries point at the framed blobs in object order.
#[test]
fn test_location_entries_cover_every_batch() {
    let config = EngineConfig::default();
    let (mut kv, mut blobs) = (MemoryKvStore::new(), make_object());
    build(&config, &mut kv, &mut blobs, &make_record_index());

    let location_prefix = build_prefix(IndexKind::Location, "db", "t", &[]);
    let entries: Vec<LocationEntry> = kv
        .keys_with_prefix(&location_prefix)
        .map(|k| LocationEntry::decode(k, &kv.get(k).unwrap().unwrap()).unwrap())
        .collect();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].offset, 0);
    assert_eq!(entries[1].offset, entries[0].len);
    assert_eq!(entries[1].offset + entries[1].len, blobs.size().unwrap());
}

/// A rebuild assigns fresh sequence numbers after the persisted counter.
#[test]
fn test_sequence_numbers_never_reused() {
    let config = EngineConfig::default();
    let (mut kv, mut blobs) = (MemoryKvStore::new(), make_object());
    let desc = make_record_index();

    let first = IndexBuilder::new(&config)
        .build(&mut kv, &mut blobs, "db", "t", &Schema::parse(DATA).unwrap(), &desc)
        .unwrap();
    assert_eq!((first.first_seq, first.next_seq), (0, 2));

    let second = IndexBuilder::new(&config)
        .build(&mut kv, &mut blobs, "db", "t", &Schema::parse(DATA).unwrap(), &desc)
        .unwrap();
    assert_eq!((second.first_seq, second.next_seq), (2, 4));
    assert_eq!(read_sequence_counter(&blobs, &config.sequence_attr, 0).unwrap(), 4);
}

#[test]
fn test_counter_respects_configured_minimum() {
    let config = EngineConfig {
        min_batch_sequence: 100,
        ..EngineConfig::default()
    };
    let (mut kv, mut blobs) = (MemoryKvStore::new(), make_object());
    let summary = IndexBuilder::new(&config)
        .build(
            &mut kv,
            &mut blobs,
            "db",
            "t",
            &Schema::parse(DATA).unwrap(),
            &IndexDescriptor::row_id(),
        )
        .unwrap();
    assert_eq!(summary.first_seq, 100);
    assert_eq!(summary.next_seq, 102);
}

// =============================================================================
// Failure Tests
// =============================================================================

/// A failing write aborts the build with TAB_STORE_IO and leaves no marker.
#[test]
fn test_store_write_failure_surfaces() {
    let config = EngineConfig::default();
    let mut kv = FailingKv::new(false, true);
    let mut blobs = make_object();
    let desc = make_record_index();

    let err = IndexBuilder::new(&config)
        .build(&mut kv, &mut blobs, "db", "t", &Schema::parse(DATA).unwrap(), &desc)
        .unwrap_err();
    assert_eq!(err.code(), "TAB_STORE_IO");
    assert!(kv.inner.get(&desc.prefix("db", "t")).unwrap().is_none());
    assert!(blobs.get_attr(&config.sequence_attr).unwrap().is_none());
}

#[test]
fn test_store_read_failure_surfaces_from_planner() {
    let config = EngineConfig::default();
    let kv = FailingKv::new(true, false);
    let blobs = make_object();
    let planner = IndexPlanner::new(&kv, &blobs, &config, &AlwaysSelective, "db", "t");

    let err = planner.index_exists(&make_record_index().prefix("db", "t")).unwrap_err();
    assert_eq!(err.code(), "TAB_STORE_IO");
}

/// A build over a corrupt row-batch fails before writing its marker.
#[test]
fn test_corrupt_object_aborts_build() {
    let config = EngineConfig::default();
    let mut kv = MemoryKvStore::new();
    let mut bytes = make_object().content().to_vec();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    let mut blobs = MemoryBlobStore::with_content(bytes);
    let desc = make_record_index();

    let err = IndexBuilder::new(&config)
        .build(&mut kv, &mut blobs, "db", "t", &Schema::parse(DATA).unwrap(), &desc)
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(kv.get(&desc.prefix("db", "t")).unwrap().is_none());
}
