//! Engine facade
//!
//! Owns the configuration, metrics and selectivity strategy shared by every
//! invocation. Each call works on the stores it is handed and keeps no
//! per-object state, so calls on different objects are independent.

use crate::config::{ConfigError, EngineConfig};
use crate::executor::{ExecutorResult, QueryExecutor, QueryRequest, QueryResponse};
use crate::index::{BuildSummary, IndexBuilder, IndexDescriptor, IndexResult};
use crate::observability::{MetricsRegistry, ObservationScope};
use crate::planner::{AlwaysSelective, IndexPlanner, PlannerResult, SelectivityModel};
use crate::schema::Schema;
use crate::storage::{BlobStore, OrderedStore};

/// Entry point for index builds and queries
pub struct Engine {
    config: EngineConfig,
    metrics: MetricsRegistry,
    selectivity: Box<dyn SelectivityModel>,
}

impl Engine {
    /// Engine that trusts every index
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            metrics: MetricsRegistry::new(),
            selectivity: Box::new(AlwaysSelective),
        }
    }

    /// Loads and validates a JSON configuration
    pub fn from_json_config(json: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(EngineConfig::from_json(json)?))
    }

    /// Replaces the selectivity strategy
    pub fn with_selectivity(mut self, selectivity: Box<dyn SelectivityModel>) -> Self {
        self.selectivity = selectivity;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Builds `descriptor` over every row-batch of the object
    pub fn build_index<K, B>(
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
        let kind = format!("{:?}", descriptor.kind());
        let scope = ObservationScope::with_fields(
            "INDEX_BUILD",
            &[("db", db), ("table", table), ("kind", kind.as_str())],
        );

        match IndexBuilder::new(&self.config).build(kv, blobs, db, table, data_schema, descriptor) {
            Ok(summary) => {
                self.metrics.increment_index_builds();
                self.metrics.add_index_entries(summary.entries_written);
                scope.complete_with_fields(&[
                    ("batches", summary.batches.to_string().as_str()),
                    ("entries", summary.entries_written.to_string().as_str()),
                    ("next_seq", summary.next_seq.to_string().as_str()),
                ]);
                Ok(summary)
            }
            Err(err) => {
                scope.fail(err.code(), &err.to_string());
                Err(err)
            }
        }
    }

    /// True when `descriptor` has been built on the object
    pub fn index_exists<K, B>(
        &self,
        kv: &K,
        blobs: &B,
        db: &str,
        table: &str,
        descriptor: &IndexDescriptor,
    ) -> PlannerResult<bool>
    where
        K: OrderedStore + ?Sized,
        B: BlobStore + ?Sized,
    {
        let planner = IndexPlanner::new(kv, blobs, &self.config, self.selectivity.as_ref(), db, table);
        planner.index_exists(&planner.content_prefix(descriptor))
    }

    /// Runs one query request against the object
    pub fn execute_query<K, B>(
        &self,
        kv: &K,
        blobs: &B,
        request: &QueryRequest,
    ) -> ExecutorResult<QueryResponse>
    where
        K: OrderedStore + ?Sized,
        B: BlobStore + ?Sized,
    {
        let scope = ObservationScope::with_fields(
            "QUERY",
            &[("db", request.db.as_str()), ("table", request.table.as_str())],
        );

        let executor = QueryExecutor::new(kv, blobs, &self.config, self.selectivity.as_ref());
        match executor.execute(request) {
            Ok(response) => {
                let stats = response.stats;
                self.metrics.increment_queries_executed();
                if stats.indexes_used > 0 {
                    self.metrics.increment_index_queries();
                }
                self.metrics.add_batches_read(stats.batches_read);
                self.metrics.add_rows_scanned(stats.rows_scanned);
                self.metrics.add_rows_returned(stats.rows_returned);
                scope.complete_with_fields(&[
                    ("rows", stats.rows_returned.to_string().as_str()),
                    ("read_ns", response.read_ns.to_string().as_str()),
                    ("eval_ns", response.eval_ns.to_string().as_str()),
                ]);
                Ok(response)
            }
            Err(err) => {
                self.metrics.increment_queries_failed();
                scope.fail(err.code(), &err.to_string());
                Err(err)
            }
        }
    }

    /// Parses a JSON request and runs it
    pub fn execute_json<K, B>(&self, kv: &K, blobs: &B, json: &str) -> ExecutorResult<QueryResponse>
    where
        K: OrderedStore + ?Sized,
        B: BlobStore + ?Sized,
    {
        let request = match QueryRequest::from_json(json) {
            Ok(request) => request,
            Err(err) => {
                self.metrics.increment_queries_failed();
                return Err(err);
            }
        };
        self.execute_query(kv, blobs, &request)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
