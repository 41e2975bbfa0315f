//! Query executor for aerotab
//!
//! Execution flow (strict order):
//! 1. Parse the schemas and predicate strings of the request
//! 2. For each requested index: check the marker, ask the selectivity
//!    strategy, and read a plan if the predicates are expressible
//! 3. Combine the plans by the plan type
//! 4. Fold every index's predicates into the row filter
//! 5. Pick the byte ranges: the read plan if non-empty, else the location
//!    index when memory-constrained, else the whole object
//! 6. Read each range, decode its row-batches and run the row processor
//!
//! Index predicates are always re-applied, so an index only narrows what is
//! read and never changes which rows are returned.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, instrument};

use crate::config::EngineConfig;
use crate::index::IndexDescriptor;
use crate::observability::Timer;
use crate::planner::{IndexPlanner, PlanType, PlannerError, ReadPlan, SelectivityModel};
use crate::predicate::{parse_predicates, predicates_to_string, Predicate};
use crate::schema::Schema;
use crate::storage::{iter_blobs, BlobStore, OrderedStore, RowBatchView};

use super::errors::ExecutorResult;
use super::filters::RowFilter;
use super::processor::RowProcessor;
use super::request::QueryRequest;
use super::result::QueryResponse;

/// Runs query requests against one object
pub struct QueryExecutor<'a, K: ?Sized, B: ?Sized> {
    kv: &'a K,
    blobs: &'a B,
    config: &'a EngineConfig,
    selectivity: &'a dyn SelectivityModel,
}

impl<'a, K, B> QueryExecutor<'a, K, B>
where
    K: OrderedStore + ?Sized,
    B: BlobStore + ?Sized,
{
    pub fn new(
        kv: &'a K,
        blobs: &'a B,
        config: &'a EngineConfig,
        selectivity: &'a dyn SelectivityModel,
    ) -> Self {
        Self {
            kv,
            blobs,
            config,
            selectivity,
        }
    }

    /// Executes one request.
    ///
    /// Same request and same object content always give the same rows,
    /// whichever read path is taken.
    #[instrument(
        name = "executor::execute",
        level = "debug",
        skip_all,
        fields(db = %request.db, table = %request.table, plan_type = ?request.plan_type)
    )]
    pub fn execute(&self, request: &QueryRequest) -> ExecutorResult<QueryResponse> {
        request.validate()?;
        let data_schema = Schema::parse(&request.data_schema)?;
        let query_schema = data_schema.project(&request.query_schema)?;
        let predicates = parse_predicates(&data_schema, &request.predicates)?;

        let mut planner = IndexPlanner::new(
            self.kv,
            self.blobs,
            self.config,
            self.selectivity,
            &request.db,
            &request.table,
        );

        let mut plans = Vec::with_capacity(request.indexes.len());
        let mut index_predicates = Vec::with_capacity(request.indexes.len());
        for usage in &request.indexes {
            let descriptor = usage.descriptor()?;
            descriptor.validate(&data_schema)?;
            let preds = usage.parse_predicates(&data_schema)?;
            debug!(
                index = %planner.content_prefix(&descriptor),
                predicates = %predicates_to_string(&preds),
                "index requested"
            );
            let plan = plan_index(&mut planner, &descriptor, &preds, usage.batch_size, request.debug)?;
            plans.push(plan);
            index_predicates.push(preds);
        }
        let (plan, indexes_used) = combine_plans(request.plan_type, plans)?;

        let mut filter = match request.plan_type {
            PlanType::Union => RowFilter::new(&data_schema, predicates, index_predicates)?,
            _ => {
                let mut all: Vec<Predicate> = index_predicates.into_iter().flatten().collect();
                all.extend(predicates);
                RowFilter::new(&data_schema, all, Vec::new())?
            }
        };
        let processor = RowProcessor::new(&data_schema, &query_schema)?;

        let mut response = QueryResponse::default();
        response.stats.indexes_used = indexes_used;

        match plan {
            Some(plan) if !plan.is_empty() => {
                log_decision(request.debug, "read plan", plan.len(), plan.row_count());
                for (_, entry) in plan.iter() {
                    self.process_range(
                        entry.offset,
                        entry.len,
                        Some(&entry.rows),
                        &processor,
                        &mut filter,
                        &mut response,
                    )?;
                }
            }
            _ if request.mem_constrained => {
                let locations = planner.read_location_index()?;
                let ranges: BTreeMap<u64, u64> =
                    locations.values().map(|loc| (loc.offset, loc.len)).collect();
                log_decision(request.debug, "location index", ranges.len(), 0);
                self.process_ranges(&ranges, &processor, &mut filter, &mut response)?;
            }
            _ => {
                log_decision(request.debug, "full object", 1, 0);
                let size = self.blobs.size()?;
                if size > 0 {
                    self.process_range(0, size, None, &processor, &mut filter, &mut response)?;
                }
            }
        }

        if request.debug {
            info!(
                batches = response.stats.batches_read,
                scanned = response.stats.rows_scanned,
                returned = response.stats.rows_returned,
                read_ns = response.read_ns,
                eval_ns = response.eval_ns,
                "query finished"
            );
        }
        Ok(response)
    }

    /// Reads the given ranges in offset order, then whatever the object
    /// holds past the last one
    fn process_ranges(
        &self,
        ranges: &BTreeMap<u64, u64>,
        processor: &RowProcessor<'_>,
        filter: &mut RowFilter,
        response: &mut QueryResponse,
    ) -> ExecutorResult<()> {
        let mut end = 0;
        for (offset, len) in ranges {
            self.process_range(*offset, *len, None, processor, filter, response)?;
            end = end.max(offset + len);
        }
        let size = self.blobs.size()?;
        if size > end {
            debug!(offset = end, len = size - end, "reading unindexed tail");
            self.process_range(end, size - end, None, processor, filter, response)?;
        }
        Ok(())
    }

    fn process_range(
        &self,
        offset: u64,
        len: u64,
        rows: Option<&BTreeSet<u32>>,
        processor: &RowProcessor<'_>,
        filter: &mut RowFilter,
        response: &mut QueryResponse,
    ) -> ExecutorResult<()> {
        let timer = Timer::new();
        let bytes = self.blobs.read(offset, len)?;
        response.read_ns += timer.elapsed_ns();

        let timer = Timer::new();
        for frame in iter_blobs(&bytes, offset) {
            let frame = frame?;
            let view = RowBatchView::decode(frame.payload)?;
            let (batch, scanned) = processor.process(&view, filter, rows)?;
            response.stats.batches_read += 1;
            response.stats.rows_scanned += scanned as u64;
            response.stats.rows_returned += batch.nrows() as u64;
            response.batches.push(batch);
        }
        response.eval_ns += timer.elapsed_ns();
        Ok(())
    }
}

/// Reads a plan through one index, or `None` when the index is absent,
/// unselective or cannot express the predicates
fn plan_index<K, B>(
    planner: &mut IndexPlanner<'_, K, B>,
    descriptor: &IndexDescriptor,
    predicates: &[Predicate],
    batch_size: Option<usize>,
    verbose: bool,
) -> ExecutorResult<Option<ReadPlan>>
where
    K: OrderedStore + ?Sized,
    B: BlobStore + ?Sized,
{
    let prefix = planner.content_prefix(descriptor);
    if !planner.index_exists(&prefix)? {
        log_skip(verbose, &prefix, "index not built");
        return Ok(None);
    }
    if !planner.use_index(&prefix, predicates) {
        log_skip(verbose, &prefix, "predicates not selective");
        return Ok(None);
    }
    match planner.read_content_index(descriptor, predicates, batch_size) {
        Ok(plan) => Ok(Some(plan)),
        Err(PlannerError::NotUsable(reason)) => {
            log_skip(verbose, &prefix, &reason);
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Applies the plan type to up to two index plans; returns the plan and
/// how many indexes it reflects
fn combine_plans(
    plan_type: PlanType,
    plans: Vec<Option<ReadPlan>>,
) -> ExecutorResult<(Option<ReadPlan>, u32)> {
    let mut plans = plans.into_iter();
    let first = plans.next().flatten();
    let second = plans.next().flatten();

    let combined = match (plan_type, first, second) {
        (PlanType::Standard, Some(plan), _) => (Some(plan), 1),
        (PlanType::Intersection, Some(a), Some(b)) => (Some(a.combine(&b, plan_type)?), 2),
        // A lone intersection side still narrows the read; both predicate
        // sets are re-applied
        (PlanType::Intersection, Some(plan), None) | (PlanType::Intersection, None, Some(plan)) => {
            (Some(plan), 1)
        }
        (PlanType::Union, Some(a), Some(b)) => (Some(a.combine(&b, plan_type)?), 2),
        _ => (None, 0),
    };
    Ok(combined)
}

fn log_skip(verbose: bool, prefix: &str, reason: &str) {
    if verbose {
        info!(prefix, reason, "index not used");
    } else {
        debug!(prefix, reason, "index not used");
    }
}

fn log_decision(verbose: bool, source: &str, ranges: usize, rows: usize) {
    if verbose {
        info!(source, ranges, rows, "read ranges chosen");
    } else {
        debug!(source, ranges, rows, "read ranges chosen");
    }
}
