//! Predicate strings
//!
//! ```text
//! |ORDERKEY,geq,2|COMMENT,like,quick|QUANTITY,sum,0|
//! ```
//!
//! `*` or an empty string means no predicates. Column `RID` addresses the
//! row-id. Aggregates are moved behind all filters, keeping relative order.

use crate::schema::Schema;

use super::errors::{PredicateError, PredicateResult};
use super::operator::Operator;
use super::predicate::Predicate;

/// Separates predicate items
pub const PRED_DELIM_OUTER: &str = "|";
/// Separates the fields of one item
pub const PRED_DELIM_INNER: &str = ",";
/// Predicate string meaning "no predicates"
pub const SELECT_ALL: &str = "*";

/// Parses a predicate string against `schema`
pub fn parse_predicates(schema: &Schema, preds: &str) -> PredicateResult<Vec<Predicate>> {
    let trimmed = preds.trim();
    if trimmed.is_empty() || trimmed == SELECT_ALL {
        return Ok(Vec::new());
    }

    let mut filters = Vec::new();
    let mut aggregates = Vec::new();

    for item in trimmed.split(PRED_DELIM_OUTER) {
        if item.trim().is_empty() {
            continue;
        }
        let mut fields = item.splitn(3, PRED_DELIM_INNER);
        let (Some(col), Some(op), Some(literal)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(PredicateError::bad_item(item, "expected col,op,value"));
        };
        if col.trim().is_empty() {
            return Err(PredicateError::bad_item(item, "missing column name"));
        }

        let column = schema.resolve(col)?;
        let op = Operator::from_name(op)?;
        let pred = Predicate::new(column, op, literal)?;

        if pred.is_aggregate() {
            aggregates.push(pred);
        } else {
            filters.push(pred);
        }
    }

    filters.extend(aggregates);
    Ok(filters)
}

/// Serializes predicates back to the string form accepted by `parse_predicates`
pub fn predicates_to_string(preds: &[Predicate]) -> String {
    if preds.is_empty() {
        return SELECT_ALL.to_string();
    }
    let items: Vec<String> = preds.iter().map(Predicate::to_item_string).collect();
    format!(
        "{}{}{}",
        PRED_DELIM_OUTER,
        items.join(PRED_DELIM_OUTER),
        PRED_DELIM_OUTER
    )
}

/// True if any predicate carries an aggregate
pub fn has_aggregates(preds: &[Predicate]) -> bool {
    preds.iter().any(Predicate::is_aggregate)
}
