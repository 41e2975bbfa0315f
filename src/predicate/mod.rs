//! Predicate engine
//!
//! Typed filter and aggregate predicates. A predicate binds a column, an
//! operator and a literal parsed into the column's scalar type; dispatch is
//! on the column's type tag. Filters are applied in list order with AND
//! semantics. Aggregates never gate a row, they only accumulate over rows
//! that passed every filter.

mod compare;
mod errors;
mod operator;
mod parse;
#[allow(clippy::module_inception)]
mod predicate;

pub use compare::{compare_bool, compare_date, compare_f64, compare_i64, compare_str, compare_u64};
pub use errors::{PredicateError, PredicateResult};
pub use operator::Operator;
pub use parse::{
    has_aggregates, parse_predicates, predicates_to_string, PRED_DELIM_INNER,
    PRED_DELIM_OUTER, SELECT_ALL,
};
pub use predicate::Predicate;
