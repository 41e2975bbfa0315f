//! Query request contract
//!
//! Requests arrive as JSON:
//!
//! ```text
//! {
//!   "db": "tpch", "table": "lineitem",
//!   "data_schema": "0 3 1 0 ORDERKEY\n1 15 0 1 COMMENT\n",
//!   "query_schema": "ORDERKEY",
//!   "predicates": "|ORDERKEY,geq,2|",
//!   "indexes": [{ "kind": "record", "schema": "0 3 1 0 ORDERKEY", "predicates": "|ORDERKEY,geq,2|" }],
//!   "plan_type": "standard",
//!   "mem_constrained": false,
//!   "debug": false
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::index::{IndexDescriptor, TextOptions};
use crate::keys::IndexKind;
use crate::planner::PlanType;
use crate::predicate::{has_aggregates, parse_predicates, Predicate};
use crate::schema::{Schema, PROJECT_ALL};

use super::errors::{ExecutorError, ExecutorResult};

/// At most this many indexes can drive one query
pub const MAX_INDEXES: usize = 2;

fn default_projection() -> String {
    PROJECT_ALL.to_string()
}

/// One index the caller would like the query to use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexUsage {
    pub kind: IndexKind,
    /// Index key columns as a schema string; empty for the row-id index
    #[serde(default)]
    pub schema: String,
    /// Predicates the index should answer, in predicate-string form
    pub predicates: String,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub text: TextOptions,
}

impl IndexUsage {
    /// Builds the index descriptor this usage names
    pub fn descriptor(&self) -> ExecutorResult<IndexDescriptor> {
        let schema = if self.schema.trim().is_empty() {
            Schema::default()
        } else {
            Schema::parse(&self.schema)?
        };
        let descriptor =
            IndexDescriptor::from_parts(self.kind, schema, self.unique, self.text.clone())?;
        Ok(match self.batch_size {
            Some(n) => descriptor.with_batch_size(n),
            None => descriptor,
        })
    }

    /// Parses the index predicates against the table schema
    pub fn parse_predicates(&self, data_schema: &Schema) -> ExecutorResult<Vec<Predicate>> {
        let preds = parse_predicates(data_schema, &self.predicates)?;
        if has_aggregates(&preds) {
            return Err(ExecutorError::invalid("index predicates cannot aggregate"));
        }
        Ok(preds)
    }
}

/// One query invocation against one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub db: String,
    #[serde(default)]
    pub table: String,
    /// Table schema string
    pub data_schema: String,
    /// Projection: `*`, `RID`, or a comma-separated column-name list
    #[serde(default = "default_projection")]
    pub query_schema: String,
    /// Filter and aggregate predicates
    #[serde(default)]
    pub predicates: String,
    #[serde(default)]
    pub indexes: Vec<IndexUsage>,
    #[serde(default)]
    pub plan_type: PlanType,
    /// Read batch by batch through the location index instead of reading
    /// the whole object at once
    #[serde(default)]
    pub mem_constrained: bool,
    /// Log the plan at INFO
    #[serde(default)]
    pub debug: bool,
}

impl QueryRequest {
    /// Request scanning `data_schema` with no filters and no indexes
    pub fn new(db: &str, table: &str, data_schema: &str) -> Self {
        Self {
            db: db.to_string(),
            table: table.to_string(),
            data_schema: data_schema.to_string(),
            query_schema: default_projection(),
            predicates: String::new(),
            indexes: Vec::new(),
            plan_type: PlanType::Standard,
            mem_constrained: false,
            debug: false,
        }
    }

    pub fn from_json(json: &str) -> ExecutorResult<Self> {
        let request: QueryRequest =
            serde_json::from_str(json).map_err(|e| ExecutorError::invalid(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    pub fn to_json(&self) -> ExecutorResult<String> {
        serde_json::to_string(self).map_err(|e| ExecutorError::invalid(e.to_string()))
    }

    /// Checks that the index list agrees with the plan type
    pub fn validate(&self) -> ExecutorResult<()> {
        if self.indexes.len() > MAX_INDEXES {
            return Err(ExecutorError::invalid(format!(
                "{} indexes requested, at most {} supported",
                self.indexes.len(),
                MAX_INDEXES
            )));
        }
        match (self.plan_type, self.indexes.len()) {
            (PlanType::Standard, 0 | 1) => Ok(()),
            (PlanType::Intersection | PlanType::Union, 2) => Ok(()),
            (plan_type, n) => Err(ExecutorError::invalid(format!(
                "plan type {:?} with {} indexes",
                plan_type, n
            ))),
        }
    }

    pub fn with_projection(mut self, query_schema: &str) -> Self {
        self.query_schema = query_schema.to_string();
        self
    }

    pub fn with_predicates(mut self, predicates: &str) -> Self {
        self.predicates = predicates.to_string();
        self
    }

    pub fn with_index(mut self, usage: IndexUsage) -> Self {
        self.indexes.push(usage);
        self
    }

    pub fn with_plan_type(mut self, plan_type: PlanType) -> Self {
        self.plan_type = plan_type;
        self
    }

    pub fn mem_constrained(mut self, on: bool) -> Self {
        self.mem_constrained = on;
        self
    }
}
