//! Scan bounds for content-index lookups
//!
//! An index can answer a predicate set when:
//! - every predicate is `eq`/`lt`/`leq`/`gt`/`geq` on an index column, and
//! - either all are `eq` and cover every index column exactly once, or the
//!   index has one column with at most one lower and one upper bound
//!
//! Text indexes answer one `like` predicate whose pattern is a plain word.
//! `like` is a partial match, so the scan takes every token containing the
//! word, not only the token equal to it. Words that a tokenizer delimiter
//! or a removed stopword could hide are not expressible.
//! Anything else is not expressible and the index is left unused.

use std::cmp::Ordering;

use crate::config::EngineConfig;
use crate::index::IndexDescriptor;
use crate::keys::{build_key_data, compare_keys, join_key_data, key_width, IndexKind};
use crate::predicate::{Operator, Predicate};
use crate::schema::{ColumnDescriptor, ScalarType};

use super::errors::{PlannerError, PlannerResult};

/// One end of a key range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub key_data: String,
    pub inclusive: bool,
}

/// Key-data range scanned in a content index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanBounds {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
    /// Lower and upper are the same inclusive key
    pub exact: bool,
    /// Key data has a fixed width, so key order equals value order and a
    /// scan may stop at the first key past the upper bound
    pub fixed_width: bool,
    /// Text scans: substring every taken token must contain
    pub contains: Option<String>,
}

impl ScanBounds {
    /// Bounds matching exactly one key-data value
    pub fn exact(key_data: String, fixed_width: bool) -> Self {
        let bound = Bound {
            key_data,
            inclusive: true,
        };
        Self {
            lower: Some(bound.clone()),
            upper: Some(bound),
            exact: true,
            fixed_width,
            contains: None,
        }
    }

    /// Whole-prefix scan taking tokens that contain `word`
    pub fn containing(word: String) -> Self {
        Self {
            lower: None,
            upper: None,
            exact: false,
            fixed_width: false,
            contains: Some(word),
        }
    }

    /// Derives bounds for `predicates` against `descriptor`'s key columns.
    ///
    /// Returns `NotUsable` when the predicates are not expressible as one
    /// bounded scan. `config` supplies the default text delimiters and the
    /// stopword list.
    pub fn for_index(
        descriptor: &IndexDescriptor,
        predicates: &[Predicate],
        config: &EngineConfig,
    ) -> PlannerResult<ScanBounds> {
        if predicates.is_empty() {
            return Err(not_usable("no predicates on index columns"));
        }
        if descriptor.kind() == IndexKind::Text {
            return text_bounds(descriptor, predicates, config);
        }

        let columns = descriptor.schema().columns();
        for pred in predicates {
            if !pred.op().is_index_bound() {
                return Err(not_usable(format!("operator {} on {}", pred.op(), pred.column().name)));
            }
            if !columns.iter().any(|c| same_column(c, pred.column())) {
                return Err(not_usable(format!("{} is not an index column", pred.column().name)));
            }
        }

        if predicates.iter().all(|p| p.op() == Operator::Eq) {
            return exact_bounds(columns, predicates);
        }

        if columns.len() != 1 {
            return Err(not_usable("range predicates need a single-column index"));
        }
        let col = &columns[0];
        let fixed_width = is_fixed_width(col.scalar_type);

        let mut lower: Option<Bound> = None;
        let mut upper: Option<Bound> = None;
        for pred in predicates {
            let key_data = build_key_data(col.scalar_type, pred.literal())?;
            let (slot, inclusive) = match pred.op() {
                Operator::Gt => (&mut lower, false),
                Operator::Geq => (&mut lower, true),
                Operator::Lt => (&mut upper, false),
                Operator::Leq => (&mut upper, true),
                _ => return Err(not_usable("equality mixed with a range")),
            };
            if slot.is_some() {
                return Err(not_usable("more than one bound on one side"));
            }
            *slot = Some(Bound {
                key_data,
                inclusive,
            });
        }

        Ok(ScanBounds {
            lower,
            upper,
            exact: false,
            fixed_width,
            contains: None,
        })
    }

    /// True when `value` lies below the lower bound
    pub fn below_lower(&self, value: &str) -> bool {
        match &self.lower {
            Some(b) => match compare_keys(value, &b.key_data) {
                Ordering::Less => true,
                Ordering::Equal => !b.inclusive,
                Ordering::Greater => false,
            },
            None => false,
        }
    }

    /// True when `value` lies above the upper bound
    pub fn above_upper(&self, value: &str) -> bool {
        match &self.upper {
            Some(b) => match compare_keys(value, &b.key_data) {
                Ordering::Greater => true,
                Ordering::Equal => !b.inclusive,
                Ordering::Less => false,
            },
            None => false,
        }
    }

    /// False when a text scan's token lacks the searched word
    pub fn admits_token(&self, value: &str) -> bool {
        match &self.contains {
            Some(word) => value.contains(word.as_str()),
            None => true,
        }
    }
}

fn not_usable(reason: impl Into<String>) -> PlannerError {
    PlannerError::NotUsable(reason.into())
}

/// Dates are validated `YYYY-MM-DD`, so they sort like fixed-width numbers
fn is_fixed_width(ty: ScalarType) -> bool {
    key_width(ty).is_some() || ty == ScalarType::Date
}

fn same_column(index_col: &ColumnDescriptor, pred_col: &ColumnDescriptor) -> bool {
    if index_col.is_row_id() || pred_col.is_row_id() {
        return index_col.is_row_id() && pred_col.is_row_id();
    }
    index_col.idx == pred_col.idx
}

fn exact_bounds(columns: &[ColumnDescriptor], predicates: &[Predicate]) -> PlannerResult<ScanBounds> {
    if predicates.len() != columns.len() {
        return Err(not_usable("equality must cover every index column once"));
    }
    let mut parts = Vec::with_capacity(columns.len());
    for col in columns {
        let pred = predicates
            .iter()
            .find(|p| same_column(col, p.column()))
            .ok_or_else(|| not_usable(format!("no equality on index column {}", col.name)))?;
        parts.push(build_key_data(col.scalar_type, pred.literal())?);
    }
    let fixed_width = columns.iter().all(|c| is_fixed_width(c.scalar_type));
    Ok(ScanBounds::exact(join_key_data(&parts), fixed_width))
}

fn text_bounds(
    descriptor: &IndexDescriptor,
    predicates: &[Predicate],
    config: &EngineConfig,
) -> PlannerResult<ScanBounds> {
    let [pred] = predicates else {
        return Err(not_usable("text index answers one word at a time"));
    };
    if pred.op() != Operator::Like {
        return Err(not_usable("text index answers like predicates"));
    }
    let word = pred.literal().to_literal();
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !plain {
        return Err(not_usable(format!("pattern {:?} is not a plain word", word)));
    }

    let options = descriptor.text_options();
    let delimiters = if options.delimiters.is_empty() {
        config.text_delimiters.as_str()
    } else {
        options.delimiters.as_str()
    };
    if word.chars().any(|c| delimiters.contains(c)) {
        return Err(not_usable(format!("{:?} spans a token delimiter", word)));
    }
    if options.remove_stopwords
        && config
            .stopwords
            .iter()
            .any(|s| s.trim().to_lowercase().contains(word.as_str()))
    {
        return Err(not_usable(format!("{:?} may sit inside a removed stopword", word)));
    }
    Ok(ScanBounds::containing(word))
}
