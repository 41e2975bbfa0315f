//! Index planner subsystem for aerotab
//!
//! Reads secondary indexes into read plans: which row-batches to fetch and
//! which row positions inside them to evaluate.
//!
//! # Flow
//!
//! 1. Check the index-exists marker
//! 2. Ask the selectivity strategy whether the index is worth scanning
//! 3. Derive scan bounds from the predicates; give up if not expressible
//! 4. Scan content entries and resolve them through the location index
//! 5. Combine two plans by intersection or union when requested
//!
//! # Invariants
//!
//! - A plan never decides correctness: predicates are always re-applied
//!   to the rows it selects
//! - Missing location entries are gaps, not errors

mod bounds;
mod errors;
mod plan;
#[allow(clippy::module_inception)]
mod planner;
mod selectivity;

pub use bounds::{Bound, ScanBounds};
pub use errors::{PlannerError, PlannerResult};
pub use plan::{PlanEntry, PlanType, ReadPlan};
pub use planner::IndexPlanner;
pub use selectivity::{AlwaysSelective, NeverSelective, SelectivityModel, SELECTIVITY_THRESHOLD};
