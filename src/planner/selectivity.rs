//! Index selectivity strategies
//!
//! The planner asks a `SelectivityModel` whether an index is worth using.
//! No statistics are kept yet; `AlwaysSelective` trusts every index.

use crate::predicate::Predicate;

/// Estimated matching fraction at or below which an index is used
pub const SELECTIVITY_THRESHOLD: f64 = 0.10;

/// Estimates the fraction of rows a predicate matches through an index
pub trait SelectivityModel: Send + Sync {
    /// Fraction in `0.0..=1.0` of rows `predicate` matches in the index
    /// under `prefix`
    fn estimate(&self, prefix: &str, predicate: &Predicate) -> f64;

    /// Whether every predicate is selective enough to drive an index scan
    fn is_selective(&self, prefix: &str, predicates: &[Predicate]) -> bool {
        !predicates.is_empty()
            && predicates
                .iter()
                .all(|p| self.estimate(prefix, p) <= SELECTIVITY_THRESHOLD)
    }
}

/// Treats every predicate as highly selective
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysSelective;

impl SelectivityModel for AlwaysSelective {
    fn estimate(&self, _prefix: &str, _predicate: &Predicate) -> f64 {
        0.0
    }
}

/// Treats every predicate as unselective; forces table scans
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverSelective;

impl SelectivityModel for NeverSelective {
    fn estimate(&self, _prefix: &str, _predicate: &Predicate) -> f64 {
        1.0
    }
}
