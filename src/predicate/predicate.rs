//! Typed predicates with in-place aggregate state

use regex::Regex;

use crate::schema::{ColumnDescriptor, ScalarType, Value};

use super::compare;
use super::errors::{PredicateError, PredicateResult};
use super::operator::Operator;

/// One filter or aggregate condition bound to a column.
///
/// Aggregate predicates carry a running value seeded from the literal. The
/// running value is widened (signed to `Int64`, unsigned to `UInt64`,
/// floating to `Double`; `cnt` is always `UInt64`).
#[derive(Debug, Clone)]
pub struct Predicate {
    column: ColumnDescriptor,
    op: Operator,
    literal: Value,
    seed: Value,
    running: Value,
    pattern: Option<Regex>,
}

impl Predicate {
    /// Builds a predicate from its textual literal, validating the operator
    /// against the column type.
    pub fn new(column: ColumnDescriptor, op: Operator, literal: &str) -> PredicateResult<Self> {
        let ty = column.scalar_type;

        if op.is_aggregate() {
            op.check_aggregate(ty)?;
            let literal = if op == Operator::Cnt {
                Value::parse_literal(ScalarType::UInt64, literal)?
            } else {
                Value::parse_literal(ty, literal)?
            };
            let seed = widen(&literal);
            return Ok(Self {
                column,
                op,
                literal,
                running: seed.clone(),
                seed,
                pattern: None,
            });
        }

        if !op.is_defined_for(ty) {
            return Err(PredicateError::ComparisonNotDefined { op, scalar_type: ty });
        }

        let pattern = if op == Operator::Like {
            let re = Regex::new(literal).map_err(|e| PredicateError::BadRegex {
                pattern: literal.to_string(),
                reason: e.to_string(),
            })?;
            Some(re)
        } else {
            None
        };

        // `like` literals are patterns, not values of the column type
        let literal = if op == Operator::Like {
            Value::String(literal.to_string())
        } else {
            Value::parse_literal(ty, literal)?
        };

        Ok(Self {
            column,
            op,
            literal,
            seed: Value::Null,
            running: Value::Null,
            pattern,
        })
    }

    pub fn column(&self) -> &ColumnDescriptor {
        &self.column
    }

    /// Cell index of the bound column (`-1` for the row-id)
    pub fn col_idx(&self) -> i32 {
        self.column.idx
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.column.scalar_type
    }

    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn literal(&self) -> &Value {
        &self.literal
    }

    /// Current aggregate value; `Null` for filter predicates
    pub fn running(&self) -> &Value {
        &self.running
    }

    pub fn is_aggregate(&self) -> bool {
        self.op.is_aggregate()
    }

    /// Tests a cell against this filter predicate
    pub fn evaluate(&self, cell: &Value) -> PredicateResult<bool> {
        if self.is_aggregate() {
            return Ok(true);
        }
        compare::evaluate(
            self.column.scalar_type,
            self.op,
            cell,
            &self.literal,
            self.pattern.as_ref(),
        )
    }

    /// Folds a cell into the running aggregate. Null cells are skipped.
    pub fn accumulate(&mut self, cell: &Value) -> PredicateResult<()> {
        if !self.is_aggregate() || cell.is_null() {
            return Ok(());
        }
        let ty = self.column.scalar_type;
        if cell.scalar_type() != Some(ty) {
            return Err(PredicateError::TypeMismatch {
                expected: ty,
                found: cell
                    .scalar_type()
                    .map(|t| t.type_name().to_string())
                    .unwrap_or_default(),
            });
        }

        // Each aggregate kind is its own branch; a min that does not improve
        // never reaches the max update.
        let next = match self.op {
            Operator::Cnt => match self.running {
                Value::UInt64(n) => Value::UInt64(n.wrapping_add(1)),
                _ => Value::UInt64(1),
            },
            Operator::Min => match (&self.running, widen(cell)) {
                (Value::Int64(r), Value::Int64(c)) => Value::Int64((*r).min(c)),
                (Value::UInt64(r), Value::UInt64(c)) => Value::UInt64((*r).min(c)),
                (Value::Double(r), Value::Double(c)) => Value::Double(r.min(c)),
                _ => return Err(self.unsupported()),
            },
            Operator::Max => match (&self.running, widen(cell)) {
                (Value::Int64(r), Value::Int64(c)) => Value::Int64((*r).max(c)),
                (Value::UInt64(r), Value::UInt64(c)) => Value::UInt64((*r).max(c)),
                (Value::Double(r), Value::Double(c)) => Value::Double(r.max(c)),
                _ => return Err(self.unsupported()),
            },
            Operator::Sum => match (&self.running, widen(cell)) {
                (Value::Int64(r), Value::Int64(c)) => Value::Int64(r.wrapping_add(c)),
                (Value::UInt64(r), Value::UInt64(c)) => Value::UInt64(r.wrapping_add(c)),
                (Value::Double(r), Value::Double(c)) => Value::Double(r + c),
                _ => return Err(self.unsupported()),
            },
            _ => return Ok(()),
        };
        self.running = next;
        Ok(())
    }

    /// Restores the running aggregate to its seed
    pub fn reset(&mut self) {
        self.running = self.seed.clone();
    }

    /// `col,op,literal` form used in predicate strings
    pub fn to_item_string(&self) -> String {
        format!("{},{},{}", self.column.name, self.op, self.literal.to_literal())
    }

    fn unsupported(&self) -> PredicateError {
        PredicateError::UnsupportedAggType {
            op: self.op,
            scalar_type: self.column.scalar_type,
        }
    }
}

/// Widens a numeric value to its 64-bit family
fn widen(value: &Value) -> Value {
    if let Some(v) = value.as_u64() {
        Value::UInt64(v)
    } else if let Some(v) = value.as_i64() {
        Value::Int64(v)
    } else if let Some(v) = value.as_f64() {
        Value::Double(v)
    } else {
        value.clone()
    }
}
