//! Row processor
//!
//! Evaluates one row-batch against a row filter and emits one output
//! batch. Deleted rows are skipped before evaluation. With aggregates the
//! output is a single synthetic record (row-id `AGGREGATE_ROW_ID`) holding
//! the aggregate values in predicate order, and the aggregates are reset
//! for the next batch.

use std::collections::BTreeSet;

use crate::schema::Schema;
use crate::storage::{null_bits_for, RowBatchBuilder, RowBatchView};

use super::errors::{ExecutorError, ExecutorResult};
use super::filters::{CellSource, RowFilter};
use super::result::ResultBatch;

/// Row-id of the synthetic aggregate record
pub const AGGREGATE_ROW_ID: i64 = -1;

/// Projects passing rows of a row-batch onto the query schema
pub struct RowProcessor<'s> {
    query_schema: &'s Schema,
    query_schema_string: String,
    projection: Vec<CellSource>,
}

impl<'s> RowProcessor<'s> {
    /// Resolves every projected column against the table schema
    pub fn new(data_schema: &Schema, query_schema: &'s Schema) -> ExecutorResult<Self> {
        let projection = query_schema
            .iter()
            .map(|col| CellSource::resolve(data_schema, col))
            .collect::<ExecutorResult<Vec<_>>>()?;
        Ok(Self {
            query_schema,
            query_schema_string: query_schema.to_schema_string(),
            projection,
        })
    }

    /// Processes `view`, restricted to `rows` when given.
    ///
    /// Returns the output batch and the number of live rows evaluated. A
    /// position at or past the batch's row count is fatal.
    pub fn process(
        &self,
        view: &RowBatchView<'_>,
        filter: &mut RowFilter,
        rows: Option<&BTreeSet<u32>>,
    ) -> ExecutorResult<(ResultBatch, usize)> {
        let nrows = view.nrows();
        let positions: Vec<usize> = match rows {
            Some(subset) => subset.iter().map(|p| *p as usize).collect(),
            None => (0..nrows).collect(),
        };
        if let Some(bad) = positions.iter().find(|p| **p >= nrows) {
            return Err(ExecutorError::RowIndexOutOfBounds {
                position: *bad,
                nrows,
            });
        }

        let aggregating = filter.has_aggregates();
        let mut out = RowBatchBuilder::new(view.db_name(), view.table_name(), self.query_schema_string.as_str());
        let mut scanned = 0;

        for position in positions {
            if view.is_deleted(position) {
                continue;
            }
            let row = view.row(position)?;
            scanned += 1;
            if !filter.matches(&row)? {
                continue;
            }
            if aggregating {
                filter.accumulate(&row)?;
                continue;
            }
            let cells = self
                .projection
                .iter()
                .zip(self.query_schema.iter())
                .map(|(source, col)| source.read(&row, col))
                .collect::<ExecutorResult<Vec<_>>>()?;
            out.push_row(row.rid, &row.nullbits, &cells);
        }

        if aggregating {
            let schema = filter.aggregate_schema();
            let values = filter.aggregate_values();
            out = RowBatchBuilder::new(view.db_name(), view.table_name(), schema.to_schema_string());
            out.push_row(AGGREGATE_ROW_ID, &null_bits_for(&schema, &values), &values);
            filter.reset_aggregates();
        }

        let batch = ResultBatch::new(out.schema_string().to_string(), out.nrows(), out.finish());
        Ok((batch, scanned))
    }
}
