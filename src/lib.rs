//! aerotab - in-storage tabular query and secondary index engine
//!
//! Evaluates filter, projection and aggregate predicates over row-batches
//! stored in an object, and maintains ordered-key secondary indexes next
//! to them so selective queries read only the batches they need.

pub mod config;
pub mod engine;
pub mod executor;
pub mod index;
pub mod keys;
pub mod observability;
pub mod planner;
pub mod predicate;
pub mod schema;
pub mod storage;

pub use config::EngineConfig;
pub use engine::Engine;
