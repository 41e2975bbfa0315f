//! Predicate filtering for query execution
//!
//! A row passes when every required filter holds and, when alternative
//! groups are present, every filter of at least one group holds. Groups
//! express the union of two index predicate sets. Null cells never match.
//! Aggregates only accumulate over rows that already passed.

use crate::predicate::{has_aggregates, Predicate};
use crate::schema::{ColumnDescriptor, Schema, Value};
use crate::storage::Row;

use super::errors::{ExecutorError, ExecutorResult};

/// Where a column's value comes from in a decoded row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CellSource {
    RowId,
    Position(usize),
}

impl CellSource {
    /// Locates `col` among the cells laid out by `data_schema`
    pub(crate) fn resolve(data_schema: &Schema, col: &ColumnDescriptor) -> ExecutorResult<Self> {
        if col.is_row_id() {
            return Ok(CellSource::RowId);
        }
        data_schema
            .position_of(col.idx)
            .map(CellSource::Position)
            .ok_or_else(|| ExecutorError::ProjectionMismatch {
                column: col.name.clone(),
                reason: format!("no column with index {} in table schema", col.idx),
            })
    }

    pub(crate) fn read(&self, row: &Row, col: &ColumnDescriptor) -> ExecutorResult<Value> {
        match self {
            CellSource::RowId => Ok(Value::UInt64(row.rid as u64)),
            CellSource::Position(pos) => {
                row.cell(*pos)
                    .cloned()
                    .ok_or_else(|| ExecutorError::ProjectionMismatch {
                        column: col.name.clone(),
                        reason: format!("row {} has only {} cells", row.rid, row.cells.len()),
                    })
            }
        }
    }
}

#[derive(Debug, Clone)]
struct BoundPredicate {
    predicate: Predicate,
    source: CellSource,
}

impl BoundPredicate {
    fn bind(data_schema: &Schema, predicate: Predicate) -> ExecutorResult<Self> {
        let source = CellSource::resolve(data_schema, predicate.column())?;
        Ok(Self { predicate, source })
    }

    fn cell(&self, row: &Row) -> ExecutorResult<Value> {
        self.source.read(row, self.predicate.column())
    }

    fn matches(&self, row: &Row) -> ExecutorResult<bool> {
        let cell = self.cell(row)?;
        if cell.is_null() {
            return Ok(false);
        }
        Ok(self.predicate.evaluate(&cell)?)
    }
}

/// Filters and aggregates of one query, bound to the table schema
#[derive(Debug, Clone, Default)]
pub struct RowFilter {
    required: Vec<BoundPredicate>,
    alternatives: Vec<Vec<BoundPredicate>>,
}

impl RowFilter {
    /// Binds `predicates` (AND) and `alternatives` (OR of ANDs)
    pub fn new(
        data_schema: &Schema,
        predicates: Vec<Predicate>,
        alternatives: Vec<Vec<Predicate>>,
    ) -> ExecutorResult<Self> {
        if alternatives.iter().any(|group| has_aggregates(group)) {
            return Err(ExecutorError::invalid("aggregates cannot be alternatives"));
        }
        let required = predicates
            .into_iter()
            .map(|p| BoundPredicate::bind(data_schema, p))
            .collect::<ExecutorResult<Vec<_>>>()?;
        let alternatives = alternatives
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .map(|p| BoundPredicate::bind(data_schema, p))
                    .collect::<ExecutorResult<Vec<_>>>()
            })
            .collect::<ExecutorResult<Vec<_>>>()?;
        Ok(Self {
            required,
            alternatives,
        })
    }

    pub fn has_aggregates(&self) -> bool {
        self.required.iter().any(|b| b.predicate.is_aggregate())
    }

    /// Checks a row against all filters, short-circuiting on the first miss
    pub fn matches(&self, row: &Row) -> ExecutorResult<bool> {
        for bound in self.required.iter().filter(|b| !b.predicate.is_aggregate()) {
            if !bound.matches(row)? {
                return Ok(false);
            }
        }
        if self.alternatives.is_empty() {
            return Ok(true);
        }
        for group in &self.alternatives {
            let mut all = true;
            for bound in group {
                if !bound.matches(row)? {
                    all = false;
                    break;
                }
            }
            if all {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Folds a passing row into every aggregate
    pub fn accumulate(&mut self, row: &Row) -> ExecutorResult<()> {
        for bound in self.required.iter_mut().filter(|b| b.predicate.is_aggregate()) {
            let cell = bound.cell(row)?;
            bound.predicate.accumulate(&cell)?;
        }
        Ok(())
    }

    /// Current aggregate values, in predicate order
    pub fn aggregate_values(&self) -> Vec<Value> {
        self.aggregates().map(|p| p.running().clone()).collect()
    }

    /// Schema of the synthetic aggregate record: one column per aggregate,
    /// named `<op>_<column>` and typed by its widened running value
    pub fn aggregate_schema(&self) -> Schema {
        let columns = self
            .aggregates()
            .enumerate()
            .map(|(i, p)| {
                ColumnDescriptor::new(
                    i as i32,
                    p.running().scalar_type().unwrap_or(p.scalar_type()),
                    false,
                    false,
                    format!("{}_{}", p.op(), p.column().name),
                )
            })
            .collect();
        Schema::new(columns)
    }

    pub fn reset_aggregates(&mut self) {
        for bound in self.required.iter_mut() {
            bound.predicate.reset();
        }
    }

    fn aggregates(&self) -> impl Iterator<Item = &Predicate> {
        self.required
            .iter()
            .map(|b| &b.predicate)
            .filter(|p| p.is_aggregate())
    }
}
