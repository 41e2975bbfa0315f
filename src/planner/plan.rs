//! Read plans and their boolean combination
//!
//! A read plan maps batch-sequence numbers to the batch's byte range and the
//! row positions to evaluate inside it. Two plans from different indexes may
//! number the same batch differently (each build assigns fresh sequence
//! numbers), so combination matches entries by byte offset.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::index::LocationEntry;

use super::errors::{PlannerError, PlannerResult};

/// How two index read plans are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    /// One index
    #[default]
    Standard,
    /// Rows matched by both indexes
    Intersection,
    /// Rows matched by either index
    Union,
}

/// Rows to read from one row-batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub offset: u64,
    pub len: u64,
    pub rows: BTreeSet<u32>,
}

impl PlanEntry {
    pub fn new(location: LocationEntry) -> Self {
        Self {
            offset: location.offset,
            len: location.len,
            rows: BTreeSet::new(),
        }
    }
}

/// Batch-sequence number to rows-to-read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadPlan {
    entries: BTreeMap<u64, PlanEntry>,
}

impl ReadPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of batches in the plan
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Total row positions across all batches
    pub fn row_count(&self) -> usize {
        self.entries.values().map(|e| e.rows.len()).sum()
    }

    pub fn get(&self, seq: u64) -> Option<&PlanEntry> {
        self.entries.get(&seq)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u64, &PlanEntry)> {
        self.entries.iter()
    }

    /// Records one matching row; repeated sequences merge their positions
    pub fn add_row(&mut self, seq: u64, location: LocationEntry, position: u32) {
        self.entries
            .entry(seq)
            .or_insert_with(|| PlanEntry::new(location))
            .rows
            .insert(position);
    }

    pub fn insert(&mut self, seq: u64, entry: PlanEntry) {
        self.entries.insert(seq, entry);
    }

    /// Combines two plans according to `plan_type`; `Standard` keeps `self`
    pub fn combine(&self, other: &ReadPlan, plan_type: PlanType) -> PlannerResult<ReadPlan> {
        match plan_type {
            PlanType::Standard => Ok(self.clone()),
            PlanType::Intersection => Ok(self.intersect(other)),
            PlanType::Union => self.union(other),
        }
    }

    /// Batches present in both plans, with positions present in both
    pub fn intersect(&self, other: &ReadPlan) -> ReadPlan {
        let by_offset = other.by_offset();
        let mut out = ReadPlan::new();
        for (seq, entry) in &self.entries {
            let Some(theirs) = by_offset.get(&entry.offset) else {
                continue;
            };
            let rows: BTreeSet<u32> = entry.rows.intersection(&theirs.rows).copied().collect();
            if !rows.is_empty() {
                out.insert(
                    *seq,
                    PlanEntry {
                        rows,
                        ..entry.clone()
                    },
                );
            }
        }
        out
    }

    /// Batches present in either plan, with positions present in either
    pub fn union(&self, other: &ReadPlan) -> PlannerResult<ReadPlan> {
        let by_offset = other.by_offset();
        let mut out = ReadPlan::new();

        for (seq, entry) in &self.entries {
            let mut merged = entry.clone();
            if let Some(theirs) = by_offset.get(&entry.offset) {
                merged.rows.extend(theirs.rows.iter().copied());
            }
            if !merged.rows.is_empty() {
                out.insert(*seq, merged);
            }
        }

        let ours = self.by_offset();
        for (seq, entry) in &other.entries {
            if ours.contains_key(&entry.offset) || entry.rows.is_empty() {
                continue;
            }
            if let Some(existing) = out.entries.get(seq) {
                return Err(PlannerError::SequenceConflict {
                    seq: *seq,
                    first: existing.offset,
                    second: entry.offset,
                });
            }
            out.insert(*seq, entry.clone());
        }
        Ok(out)
    }

    fn by_offset(&self) -> HashMap<u64, &PlanEntry> {
        self.entries.values().map(|e| (e.offset, e)).collect()
    }
}
