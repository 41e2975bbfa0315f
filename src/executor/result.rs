//! Result types for query execution

use serde::Serialize;

use crate::storage::{frame_blobs, Row, RowBatchView};

use super::errors::ExecutorResult;

/// One output row-batch produced by the row processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultBatch {
    schema_string: String,
    nrows: usize,
    bytes: Vec<u8>,
}

impl ResultBatch {
    pub(crate) fn new(schema_string: String, nrows: usize, bytes: Vec<u8>) -> Self {
        Self {
            schema_string,
            nrows,
            bytes,
        }
    }

    /// Schema of the output rows: the projection, or the aggregate record
    pub fn schema_string(&self) -> &str {
        &self.schema_string
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn is_empty(&self) -> bool {
        self.nrows == 0
    }

    /// Serialized row-batch, same format as stored batches
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn view(&self) -> ExecutorResult<RowBatchView<'_>> {
        Ok(RowBatchView::decode(&self.bytes)?)
    }

    /// Decodes every output row
    pub fn rows(&self) -> ExecutorResult<Vec<Row>> {
        let view = self.view()?;
        (0..view.nrows())
            .map(|pos| view.row(pos).map_err(Into::into))
            .collect()
    }
}

/// Counters describing one query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueryStats {
    pub batches_read: u64,
    /// Live rows the processor evaluated
    pub rows_scanned: u64,
    pub rows_returned: u64,
    /// Indexes whose read plan drove the scan
    pub indexes_used: u32,
}

/// Output of one query invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResponse {
    /// Time spent fetching bytes from the blob store
    pub read_ns: u64,
    /// Time spent decoding and evaluating rows
    pub eval_ns: u64,
    pub batches: Vec<ResultBatch>,
    pub stats: QueryStats,
}

impl QueryResponse {
    /// Result batches framed the same way as object content
    pub fn encode(&self) -> Vec<u8> {
        frame_blobs(self.batches.iter().map(ResultBatch::as_bytes))
    }

    pub fn row_count(&self) -> usize {
        self.batches.iter().map(ResultBatch::nrows).sum()
    }

    /// Every output row across all batches, in order
    pub fn rows(&self) -> ExecutorResult<Vec<Row>> {
        let mut out = Vec::with_capacity(self.row_count());
        for batch in &self.batches {
            out.extend(batch.rows()?);
        }
        Ok(out)
    }
}
