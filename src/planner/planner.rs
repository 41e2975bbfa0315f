//! Index planner
//!
//! Turns index entries into a read plan. Content-index keys resolve to a
//! batch-sequence number and row position; the location index maps the
//! sequence to the batch's byte range.
//!
//! # Scan rules
//!
//! - Equality on a unique index is a point lookup
//! - Equality on a non-unique or text index scans the keys sharing
//!   `prefix + key-data + ":ENTRY-"`
//! - Ranges scan from the lower bound (or the bare prefix) in pages;
//!   fixed-width keys stop at the first key past the upper bound, string
//!   keys skip it since their key order differs from value order
//! - Text lookups scan the whole content prefix and take every token that
//!   contains the searched word
//! - A key outside the content prefix ends the scan
//! - Missing location entries mean the batch was compacted away and are
//!   skipped

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, instrument};

use crate::config::EngineConfig;
use crate::index::{read_sequence_counter, ContentEntry, IndexDescriptor, IndexError, LocationEntry};
use crate::keys::{
    build_prefix, key_value, location_key, IndexKind, KEY_DELIM_INNER, KEY_DELIM_OUTER,
    KEY_DELIM_UNIQUE,
};
use crate::predicate::Predicate;
use crate::storage::{BlobStore, OrderedStore};

use super::bounds::ScanBounds;
use super::errors::PlannerResult;
use super::plan::ReadPlan;
use super::selectivity::SelectivityModel;

/// Verdict on one scanned key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanStep {
    Take,
    Skip,
    Stop,
}

/// Reads the indexes of one object
pub struct IndexPlanner<'a, K: ?Sized, B: ?Sized> {
    kv: &'a K,
    blobs: &'a B,
    config: &'a EngineConfig,
    selectivity: &'a dyn SelectivityModel,
    db: String,
    table: String,
    location_prefix: String,
    locations: HashMap<u64, Option<LocationEntry>>,
}

impl<'a, K, B> IndexPlanner<'a, K, B>
where
    K: OrderedStore + ?Sized,
    B: BlobStore + ?Sized,
{
    pub fn new(
        kv: &'a K,
        blobs: &'a B,
        config: &'a EngineConfig,
        selectivity: &'a dyn SelectivityModel,
        db: &str,
        table: &str,
    ) -> Self {
        let db = config.db_name(db).to_string();
        let table = config.table_name(table).to_string();
        let location_prefix = build_prefix(IndexKind::Location, &db, &table, &[]);
        Self {
            kv,
            blobs,
            config,
            selectivity,
            db,
            table,
            location_prefix,
            locations: HashMap::new(),
        }
    }

    /// Content prefix of `descriptor` on this object
    pub fn content_prefix(&self, descriptor: &IndexDescriptor) -> String {
        descriptor.prefix(&self.db, &self.table)
    }

    pub fn location_prefix(&self) -> &str {
        &self.location_prefix
    }

    /// True when the build marker for `prefix` is present
    pub fn index_exists(&self, prefix: &str) -> PlannerResult<bool> {
        Ok(self.kv.get(prefix)?.is_some())
    }

    /// Asks the selectivity strategy whether the index is worth scanning
    pub fn use_index(&self, prefix: &str, predicates: &[Predicate]) -> bool {
        self.selectivity.is_selective(prefix, predicates)
    }

    /// Reads every location entry between the configured minimum sequence
    /// and the persisted counter. Gaps are not errors.
    #[instrument(name = "planner::read_location_index", level = "debug", skip_all)]
    pub fn read_location_index(&mut self) -> PlannerResult<BTreeMap<u64, LocationEntry>> {
        let min = self.config.min_batch_sequence;
        let counter = read_sequence_counter(self.blobs, &self.config.sequence_attr, min)?;
        let mut out = BTreeMap::new();
        if counter <= min {
            return Ok(out);
        }

        let end = location_key(&self.location_prefix, counter);
        let mut cursor = match min.checked_sub(1) {
            Some(before) => location_key(&self.location_prefix, before),
            None => self.location_prefix.clone(),
        };
        let page_size = self.config.index_batch_size.max(1);

        loop {
            let (page, more) = self.kv.range(&cursor, Some(&end), page_size)?;
            let Some(last) = page.keys().next_back().cloned() else {
                break;
            };
            for (key, bytes) in &page {
                let seq = self.sequence_of(key)?;
                let entry = LocationEntry::decode(key, bytes)?;
                self.locations.insert(seq, Some(entry));
                out.insert(seq, entry);
            }
            if !more {
                break;
            }
            cursor = last;
        }

        debug!(min, counter, found = out.len(), "read location index");
        Ok(out)
    }

    /// Scans the content index of `descriptor` for rows matching
    /// `predicates` and resolves them into a read plan.
    ///
    /// `batch_size` overrides the scan page size; otherwise the
    /// descriptor's, then the config's, applies.
    #[instrument(
        name = "planner::read_content_index",
        level = "debug",
        skip_all,
        fields(kind = ?descriptor.kind())
    )]
    pub fn read_content_index(
        &mut self,
        descriptor: &IndexDescriptor,
        predicates: &[Predicate],
        batch_size: Option<usize>,
    ) -> PlannerResult<ReadPlan> {
        let prefix = self.content_prefix(descriptor);
        let bounds = ScanBounds::for_index(descriptor, predicates, self.config)?;
        let page_size = batch_size
            .or(descriptor.batch_size())
            .unwrap_or(self.config.index_batch_size)
            .max(1);
        let unique = descriptor.is_unique() && descriptor.kind() != IndexKind::Text;

        let mut entries = Vec::new();
        match (&bounds.lower, bounds.exact) {
            (Some(lower), true) if unique => {
                let key = format!("{}{}", prefix, lower.key_data);
                entries.extend(self.point_entry(&key)?);
            }
            (Some(lower), true) => {
                let stem = format!("{}{}{}{}", prefix, lower.key_data, KEY_DELIM_OUTER, KEY_DELIM_UNIQUE);
                let within = format!("{}{}", stem, KEY_DELIM_INNER);
                entries = self.scan_entries(&stem, page_size, |key| {
                    if key.starts_with(&within) {
                        ScanStep::Take
                    } else {
                        ScanStep::Stop
                    }
                })?;
            }
            _ => {
                let start_after = match &bounds.lower {
                    Some(lower) => {
                        let key = format!("{}{}", prefix, lower.key_data);
                        if lower.inclusive && unique {
                            entries.extend(self.point_entry(&key)?);
                        }
                        key
                    }
                    None => prefix.clone(),
                };
                let found = self.scan_entries(&start_after, page_size, |key| {
                    let Some(value) = key_value(&prefix, key) else {
                        return ScanStep::Stop;
                    };
                    if bounds.above_upper(value) {
                        if bounds.fixed_width {
                            ScanStep::Stop
                        } else {
                            ScanStep::Skip
                        }
                    } else if bounds.below_lower(value) || !bounds.admits_token(value) {
                        ScanStep::Skip
                    } else {
                        ScanStep::Take
                    }
                })?;
                entries.extend(found);
            }
        }

        let mut plan = ReadPlan::new();
        let mut compacted = 0usize;
        for entry in &entries {
            match self.location(entry.seq)? {
                Some(location) => plan.add_row(entry.seq, location, entry.position),
                None => compacted += 1,
            }
        }

        debug!(
            prefix = %prefix,
            matched = entries.len(),
            batches = plan.len(),
            compacted,
            "read content index"
        );
        Ok(plan)
    }

    fn point_entry(&self, key: &str) -> PlannerResult<Option<ContentEntry>> {
        match self.kv.get(key)? {
            Some(bytes) => Ok(Some(ContentEntry::decode(key, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Pages through keys after `start_after`, decoding the ones `step` takes
    fn scan_entries<F>(
        &self,
        start_after: &str,
        page_size: usize,
        mut step: F,
    ) -> PlannerResult<Vec<ContentEntry>>
    where
        F: FnMut(&str) -> ScanStep,
    {
        let mut cursor = start_after.to_string();
        let mut found = Vec::new();
        let mut pages = 0usize;

        loop {
            let (page, more) = self.kv.range(&cursor, None, page_size)?;
            pages += 1;
            let Some(last) = page.keys().next_back().cloned() else {
                break;
            };
            for (key, bytes) in &page {
                match step(key) {
                    ScanStep::Take => found.push(ContentEntry::decode(key, bytes)?),
                    ScanStep::Skip => {}
                    ScanStep::Stop => {
                        debug!(pages, taken = found.len(), "content scan stopped");
                        return Ok(found);
                    }
                }
            }
            if !more {
                break;
            }
            cursor = last;
        }

        debug!(pages, taken = found.len(), "content scan exhausted");
        Ok(found)
    }

    /// Cached location lookup; `None` when the entry is gone
    fn location(&mut self, seq: u64) -> PlannerResult<Option<LocationEntry>> {
        if let Some(cached) = self.locations.get(&seq) {
            return Ok(*cached);
        }
        let key = location_key(&self.location_prefix, seq);
        let entry = match self.kv.get(&key)? {
            Some(bytes) => Some(LocationEntry::decode(&key, &bytes)?),
            None => None,
        };
        self.locations.insert(seq, entry);
        Ok(entry)
    }

    fn sequence_of(&self, key: &str) -> PlannerResult<u64> {
        let digits = key.strip_prefix(&self.location_prefix).unwrap_or(key);
        digits
            .parse::<u64>()
            .map_err(|_| IndexError::corrupt(key, "location key has no sequence number").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexBuilder, TextOptions};
    use crate::planner::{AlwaysSelective, NeverSelective};
    use crate::predicate::Operator;
    use crate::schema::{Schema, Value};
    use crate::storage::{frame_blobs, null_bits_for, MemoryBlobStore, MemoryKvStore, RowBatchBuilder};

    const DATA: &str = "0 3 1 0 ORDERKEY\n1 15 0 1 NAME\n";

    fn batch(rows: &[(i64, i32, &str)]) -> Vec<u8> {
        let schema = Schema::parse(DATA).unwrap();
        let mut b = RowBatchBuilder::new("db", "t", DATA);
        for (rid, key, name) in rows {
            let cells = vec![Value::Int32(*key), Value::String(name.to_string())];
            b.push_row(*rid, &null_bits_for(&schema, &cells), &cells);
        }
        b.finish()
    }

    /// orderkey {1,2} in batch 0 and {2,3} in batch 1
    fn object() -> MemoryBlobStore {
        MemoryBlobStore::with_content(frame_blobs([
            batch(&[(10, 1, "b"), (11, 2, "ab")]),
            batch(&[(12, 2, "ab!"), (13, 3, "c")]),
        ]))
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

    fn pred(name: &str, op: Operator, lit: &str) -> Predicate {
        let schema = Schema::parse(DATA).unwrap();
        Predicate::new(schema.resolve(name).unwrap(), op, lit).unwrap()
    }

    fn hits(plan: &ReadPlan) -> Vec<(u64, u32)> {
        plan.iter()
            .flat_map(|(seq, e)| e.rows.iter().map(move |r| (*seq, *r)))
            .collect()
    }

    fn orderkey_index(unique: bool) -> IndexDescriptor {
        IndexDescriptor::record(Schema::parse("0 3 1 0 ORDERKEY").unwrap(), unique).unwrap()
    }

    #[test]
    fn test_index_exists_after_build() {
        let config = EngineConfig::default();
        let (mut kv, mut blobs) = (MemoryKvStore::new(), object());
        let desc = orderkey_index(false);
        {
            let planner = IndexPlanner::new(&kv, &blobs, &config, &AlwaysSelective, "db", "t");
            assert!(!planner.index_exists(&planner.content_prefix(&desc)).unwrap());
        }
        build(&config, &mut kv, &mut blobs, &desc);
        let planner = IndexPlanner::new(&kv, &blobs, &config, &AlwaysSelective, "db", "t");
        assert!(planner.index_exists(&planner.content_prefix(&desc)).unwrap());
    }

    #[test]
    fn test_use_index_delegates() {
        let config = EngineConfig::default();
        let (kv, blobs) = (MemoryKvStore::new(), object());
        let preds = [pred("ORDERKEY", Operator::Eq, "2")];
        let yes = IndexPlanner::new(&kv, &blobs, &config, &AlwaysSelective, "db", "t");
        assert!(yes.use_index("IDX_REC:db-t:ORDERKEY:", &preds));
        let no = IndexPlanner::new(&kv, &blobs, &config, &NeverSelective, "db", "t");
        assert!(!no.use_index("IDX_REC:db-t:ORDERKEY:", &preds));
    }

    #[test]
    fn test_non_unique_equality() {
        let config = EngineConfig::default();
        let (mut kv, mut blobs) = (MemoryKvStore::new(), object());
        let desc = orderkey_index(false);
        build(&config, &mut kv, &mut blobs, &desc);

        let mut planner = IndexPlanner::new(&kv, &blobs, &config, &AlwaysSelective, "db", "t");
        let plan = planner
            .read_content_index(&desc, &[pred("ORDERKEY", Operator::Eq, "2")], Some(1))
            .unwrap();
        assert_eq!(hits(&plan), vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_ranges_on_fixed_width_keys() {
        let config = EngineConfig::default();
        let (mut kv, mut blobs) = (MemoryKvStore::new(), object());
        let desc = orderkey_index(false);
        build(&config, &mut kv, &mut blobs, &desc);
        let mut planner = IndexPlanner::new(&kv, &blobs, &config, &AlwaysSelective, "db", "t");

        let geq = planner
            .read_content_index(&desc, &[pred("ORDERKEY", Operator::Geq, "2")], Some(2))
            .unwrap();
        assert_eq!(hits(&geq), vec![(0, 1), (1, 0), (1, 1)]);

        let lt = planner
            .read_content_index(&desc, &[pred("ORDERKEY", Operator::Lt, "2")], Some(2))
            .unwrap();
        assert_eq!(hits(&lt), vec![(0, 0)]);

        let gt = planner
            .read_content_index(&desc, &[pred("ORDERKEY", Operator::Gt, "2")], None)
            .unwrap();
        assert_eq!(hits(&gt), vec![(1, 1)]);

        let leq = planner
            .read_content_index(&desc, &[pred("ORDERKEY", Operator::Leq, "2")], None)
            .unwrap();
        assert_eq!(leq.row_count(), 3);
    }

    #[test]
    fn test_unique_index_point_lookups() {
        let config = EngineConfig::default();
        let (mut kv, mut blobs) = (MemoryKvStore::new(), object());
        let desc = IndexDescriptor::row_id();
        build(&config, &mut kv, &mut blobs, &desc);
        let mut planner = IndexPlanner::new(&kv, &blobs, &config, &AlwaysSelective, "db", "t");

        let rid = crate::schema::ColumnDescriptor::row_id();
        let eq = Predicate::new(rid.clone(), Operator::Eq, "12").unwrap();
        assert_eq!(hits(&planner.read_content_index(&desc, &[eq], None).unwrap()), vec![(1, 0)]);

        let geq = Predicate::new(rid, Operator::Geq, "12").unwrap();
        assert_eq!(
            hits(&planner.read_content_index(&desc, &[geq], None).unwrap()),
            vec![(1, 0), (1, 1)]
        );
    }

    #[test]
    fn test_string_range_skips_out_of_order_keys() {
        let config = EngineConfig::default();
        let (mut kv, mut blobs) = (MemoryKvStore::new(), object());
        let desc = IndexDescriptor::record(Schema::parse("1 15 0 1 NAME").unwrap(), false).unwrap();
        build(&config, &mut kv, &mut blobs, &desc);
        let mut planner = IndexPlanner::new(&kv, &blobs, &config, &AlwaysSelective, "db", "t");

        // Key "ab!:ENTRY-" sorts before "ab:ENTRY-" although "ab" < "ab!"
        let plan = planner
            .read_content_index(&desc, &[pred("NAME", Operator::Leq, "ab")], Some(1))
            .unwrap();
        assert_eq!(hits(&plan), vec![(0, 1)]);

        let plan = planner
            .read_content_index(&desc, &[pred("NAME", Operator::Gt, "ab")], Some(1))
            .unwrap();
        assert_eq!(hits(&plan), vec![(0, 0), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_text_word_lookup() {
        let config = EngineConfig::default();
        let (mut kv, mut blobs) = (MemoryKvStore::new(), object());
        let desc = IndexDescriptor::text(Schema::parse("1 15 0 1 NAME").unwrap(), TextOptions::default())
            .unwrap();
        build(&config, &mut kv, &mut blobs, &desc);
        let mut planner = IndexPlanner::new(&kv, &blobs, &config, &AlwaysSelective, "db", "t");
        let plan = planner
            .read_content_index(&desc, &[pred("NAME", Operator::Like, "c")], None)
            .unwrap();
        assert_eq!(hits(&plan), vec![(1, 1)]);
    }

    #[test]
    fn test_text_lookup_takes_containing_tokens() {
        let config = EngineConfig::default();
        let (mut kv, mut blobs) = (MemoryKvStore::new(), object());
        let desc = IndexDescriptor::text(Schema::parse("1 15 0 1 NAME").unwrap(), TextOptions::default())
            .unwrap();
        build(&config, &mut kv, &mut blobs, &desc);
        let mut planner = IndexPlanner::new(&kv, &blobs, &config, &AlwaysSelective, "db", "t");

        // "b", "ab" and "ab!" all contain "b"
        let plan = planner
            .read_content_index(&desc, &[pred("NAME", Operator::Like, "b")], Some(1))
            .unwrap();
        assert_eq!(hits(&plan), vec![(0, 0), (0, 1), (1, 0)]);
    }

    #[test]
    fn test_location_index_tolerates_gaps() {
        let config = EngineConfig::default();
        let (mut kv, mut blobs) = (MemoryKvStore::new(), object());
        let desc = orderkey_index(false);
        build(&config, &mut kv, &mut blobs, &desc);
        kv.remove(&location_key("IDX_FB:db-t:*:", 0));

        let mut planner = IndexPlanner::new(&kv, &blobs, &config, &AlwaysSelective, "db", "t");
        let locations = planner.read_location_index().unwrap();
        assert_eq!(locations.keys().copied().collect::<Vec<_>>(), vec![1]);

        // Rows in the compacted batch drop out of the plan
        let plan = planner
            .read_content_index(&desc, &[pred("ORDERKEY", Operator::Eq, "2")], None)
            .unwrap();
        assert_eq!(hits(&plan), vec![(1, 0)]);
    }

    #[test]
    fn test_location_index_empty_before_build() {
        let config = EngineConfig::default();
        let (kv, blobs) = (MemoryKvStore::new(), object());
        let mut planner = IndexPlanner::new(&kv, &blobs, &config, &AlwaysSelective, "db", "t");
        assert!(planner.read_location_index().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_content_entry() {
        let config = EngineConfig::default();
        let (mut kv, mut blobs) = (MemoryKvStore::new(), object());
        let desc = orderkey_index(true);
        build(&config, &mut kv, &mut blobs, &desc);
        kv.put("IDX_REC:db-t:ORDERKEY:2147483651", b"not json").unwrap();

        let mut planner = IndexPlanner::new(&kv, &blobs, &config, &AlwaysSelective, "db", "t");
        let err = planner
            .read_content_index(&desc, &[pred("ORDERKEY", Operator::Eq, "3")], None)
            .unwrap_err();
        assert_eq!(err.code(), "TAB_DECODE_ERROR");
    }
}
