//! Byte-range store holding an object's content and attributes

use std::collections::HashMap;

use super::errors::{StorageError, StorageResult};

/// Per-object byte store
pub trait BlobStore {
    /// Reads exactly `len` bytes at `offset`
    fn read(&self, offset: u64, len: u64) -> StorageResult<Vec<u8>>;

    /// Replaces the whole object content
    fn write_full(&mut self, data: &[u8]) -> StorageResult<()>;

    fn size(&self) -> StorageResult<u64>;

    /// Reads a small named attribute
    fn get_attr(&self, name: &str) -> StorageResult<Option<Vec<u8>>>;

    fn set_attr(&mut self, name: &str, value: &[u8]) -> StorageResult<()>;
}

/// In-memory blob store
#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    data: Vec<u8>,
    attrs: HashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with `data`
    pub fn with_content(data: Vec<u8>) -> Self {
        Self {
            data,
            attrs: HashMap::new(),
        }
    }

    /// Appends bytes, returning the offset they start at
    pub fn append(&mut self, data: &[u8]) -> u64 {
        let offset = self.data.len() as u64;
        self.data.extend_from_slice(data);
        offset
    }

    pub fn content(&self) -> &[u8] {
        &self.data
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, offset: u64, len: u64) -> StorageResult<Vec<u8>> {
        let size = self.data.len() as u64;
        let end = offset.checked_add(len).filter(|end| *end <= size);
        match end {
            Some(end) => Ok(self.data[offset as usize..end as usize].to_vec()),
            None => Err(StorageError::RangeOutOfBounds { offset, len, size }),
        }
    }

    fn write_full(&mut self, data: &[u8]) -> StorageResult<()> {
        self.data = data.to_vec();
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.len() as u64)
    }

    fn get_attr(&self, name: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.attrs.get(name).cloned())
    }

    fn set_attr(&mut self, name: &str, value: &[u8]) -> StorageResult<()> {
        self.attrs.insert(name.to_string(), value.to_vec());
        Ok(())
    }
}
