//! Predicate operators and their per-type applicability

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::ScalarType;

use super::errors::{PredicateError, PredicateResult};

/// A predicate operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Lt,
    Gt,
    Eq,
    Ne,
    Leq,
    Geq,
    Like,
    Before,
    After,
    LogicalOr,
    LogicalAnd,
    LogicalNot,
    LogicalNor,
    LogicalXor,
    LogicalNand,
    BitwiseAnd,
    BitwiseOr,
    Min,
    Max,
    Sum,
    Cnt,
}

impl Operator {
    pub const ALL: [Operator; 21] = [
        Operator::Lt,
        Operator::Gt,
        Operator::Eq,
        Operator::Ne,
        Operator::Leq,
        Operator::Geq,
        Operator::Like,
        Operator::Before,
        Operator::After,
        Operator::LogicalOr,
        Operator::LogicalAnd,
        Operator::LogicalNot,
        Operator::LogicalNor,
        Operator::LogicalXor,
        Operator::LogicalNand,
        Operator::BitwiseAnd,
        Operator::BitwiseOr,
        Operator::Min,
        Operator::Max,
        Operator::Sum,
        Operator::Cnt,
    ];

    /// Parses an operator name as it appears in predicate strings
    pub fn from_name(name: &str) -> PredicateResult<Self> {
        let trimmed = name.trim();
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| PredicateError::UnknownOperator(trimmed.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operator::Lt => "lt",
            Operator::Gt => "gt",
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Leq => "leq",
            Operator::Geq => "geq",
            Operator::Like => "like",
            Operator::Before => "before",
            Operator::After => "after",
            Operator::LogicalOr => "logical_or",
            Operator::LogicalAnd => "logical_and",
            Operator::LogicalNot => "logical_not",
            Operator::LogicalNor => "logical_nor",
            Operator::LogicalXor => "logical_xor",
            Operator::LogicalNand => "logical_nand",
            Operator::BitwiseAnd => "bitwise_and",
            Operator::BitwiseOr => "bitwise_or",
            Operator::Min => "min",
            Operator::Max => "max",
            Operator::Sum => "sum",
            Operator::Cnt => "cnt",
        }
    }

    /// lt, gt, eq, ne, leq, geq
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            Operator::Lt | Operator::Gt | Operator::Eq | Operator::Ne | Operator::Leq | Operator::Geq
        )
    }

    /// Operators an ordered index can answer with a bounded scan
    pub fn is_index_bound(&self) -> bool {
        matches!(
            self,
            Operator::Lt | Operator::Gt | Operator::Eq | Operator::Leq | Operator::Geq
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(
            self,
            Operator::LogicalOr
                | Operator::LogicalAnd
                | Operator::LogicalNot
                | Operator::LogicalNor
                | Operator::LogicalXor
                | Operator::LogicalNand
        )
    }

    pub fn is_bitwise(&self) -> bool {
        matches!(self, Operator::BitwiseAnd | Operator::BitwiseOr)
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, Operator::Min | Operator::Max | Operator::Sum | Operator::Cnt)
    }

    /// Whether a filter with this operator can be applied to a column of `ty`.
    ///
    /// Aggregates are checked separately by `check_aggregate`.
    pub fn is_defined_for(&self, ty: ScalarType) -> bool {
        if self.is_ordering() {
            return true;
        }
        match ty {
            ScalarType::Int8 | ScalarType::Int16 | ScalarType::Int32 | ScalarType::Int64 => {
                self.is_logical()
            }
            ScalarType::UInt8 | ScalarType::UInt16 | ScalarType::UInt32 | ScalarType::UInt64 => {
                self.is_logical() || self.is_bitwise()
            }
            ScalarType::Char => self.is_logical() || *self == Operator::Like,
            ScalarType::UChar => {
                self.is_logical() || self.is_bitwise() || *self == Operator::Like
            }
            ScalarType::Bool => self.is_logical() || self.is_bitwise(),
            ScalarType::Float | ScalarType::Double => false,
            ScalarType::Date => matches!(self, Operator::Before | Operator::After),
            ScalarType::String => *self == Operator::Like,
        }
    }

    /// Validates an aggregate operator against the column type
    pub fn check_aggregate(&self, ty: ScalarType) -> PredicateResult<()> {
        let supported = match self {
            Operator::Cnt => true,
            Operator::Min | Operator::Max | Operator::Sum => ty.is_aggregatable(),
            _ => false,
        };
        if supported {
            Ok(())
        } else {
            Err(PredicateError::UnsupportedAggType {
                op: *self,
                scalar_type: ty,
            })
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
