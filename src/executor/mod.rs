//! Query executor subsystem for aerotab
//!
//! Consumes a query request, optionally narrows the read through one or
//! two indexes, and runs every selected row-batch through the row
//! processor.
//!
//! # Invariants
//!
//! - Deleted rows are never evaluated or returned
//! - Filters use AND semantics in list order; aggregates never gate rows
//! - Every processed batch yields one well-formed output batch, possibly
//!   empty
//! - A row position outside its batch is fatal (TAB_ROW_INDEX_OOB)

mod errors;
#[allow(clippy::module_inception)]
mod executor;
mod filters;
mod processor;
mod request;
mod result;

pub use errors::{ExecutorError, ExecutorResult};
pub use executor::QueryExecutor;
pub use filters::RowFilter;
pub use processor::{RowProcessor, AGGREGATE_ROW_ID};
pub use request::{IndexUsage, QueryRequest, MAX_INDEXES};
pub use result::{QueryResponse, QueryStats, ResultBatch};
