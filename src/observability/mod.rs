//! Observability subsystem for aerotab
//!
//! - Structured logging through `tracing`
//! - Lifecycle events via `ObservationScope`
//! - Monotonic counters via `MetricsRegistry`
//!
//! Observability is read-only: nothing here changes query results.
//!
//! # Usage
//!
//! ```ignore
//! use aerotab::observability::{MetricsRegistry, ObservationScope};
//!
//! let metrics = MetricsRegistry::new();
//! let scope = ObservationScope::new("QUERY");
//! // ... do work ...
//! metrics.increment_queries_executed();
//! scope.complete();
//! ```

mod metrics;
mod scope;

pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};
