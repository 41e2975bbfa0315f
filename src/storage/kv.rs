//! Ordered key-value store attached to an object
//!
//! Keys compare lexicographically as opaque byte strings. Index entries,
//! location entries and the index-exists marker all live here.

use std::collections::BTreeMap;
use std::ops::Bound;

use super::errors::StorageResult;

/// Page of entries returned by a ranged fetch, plus whether more remain
pub type KeyPage = (BTreeMap<String, Vec<u8>>, bool);

/// Per-object ordered key-value store
pub trait OrderedStore {
    /// Point lookup; `None` when the key is absent
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    fn put(&mut self, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Writes all entries in one round-trip
    fn put_batch(&mut self, entries: &BTreeMap<String, Vec<u8>>) -> StorageResult<()>;

    /// Fetches up to `limit` entries with keys strictly after `start_after`
    /// and strictly before `end` (if given), in key order.
    fn range(&self, start_after: &str, end: Option<&str>, limit: usize) -> StorageResult<KeyPage>;

    /// Enumerates up to `limit` keys strictly after `start_after`
    fn keys(&self, start_after: &str, limit: usize) -> StorageResult<(Vec<String>, bool)>;
}

/// In-memory ordered store
#[derive(Debug, Default, Clone)]
pub struct MemoryKvStore {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys starting with `prefix`, in order
    pub fn keys_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(k, _)| k.as_str())
            .take_while(move |k| k.starts_with(prefix))
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<u8>> {
        self.entries.remove(key)
    }
}

impl OrderedStore for MemoryKvStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn put_batch(&mut self, entries: &BTreeMap<String, Vec<u8>>) -> StorageResult<()> {
        for (k, v) in entries {
            self.entries.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    fn range(&self, start_after: &str, end: Option<&str>, limit: usize) -> StorageResult<KeyPage> {
        let mut page = BTreeMap::new();
        if limit == 0 {
            return Ok((page, false));
        }
        if let Some(end) = end {
            if end <= start_after {
                return Ok((page, false));
            }
        }

        let upper = match end {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        let mut iter = self
            .entries
            .range::<str, _>((Bound::Excluded(start_after), upper));

        for (k, v) in iter.by_ref().take(limit) {
            page.insert(k.clone(), v.clone());
        }
        let more = iter.next().is_some();
        Ok((page, more))
    }

    fn keys(&self, start_after: &str, limit: usize) -> StorageResult<(Vec<String>, bool)> {
        let mut iter = self
            .entries
            .range::<str, _>((Bound::Excluded(start_after), Bound::Unbounded))
            .map(|(k, _)| k.clone());
        let keys: Vec<String> = iter.by_ref().take(limit).collect();
        let more = iter.next().is_some();
        Ok((keys, more))
    }
}
