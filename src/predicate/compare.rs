//! Type-specific comparison semantics
//!
//! Signed integers and `char` compare as `i64`, unsigned integers and `uchar`
//! as `u64`, floating types as `f64`, dates as calendar dates. Logical
//! operators treat non-zero integers as true.

use chrono::NaiveDate;
use regex::Regex;

use crate::schema::{ScalarType, Value, DATE_FORMAT};

use super::errors::{PredicateError, PredicateResult};
use super::operator::Operator;

fn logical(a: bool, b: bool, op: Operator) -> Option<bool> {
    Some(match op {
        Operator::LogicalOr => a || b,
        Operator::LogicalAnd => a && b,
        Operator::LogicalNot => !a && !b,
        Operator::LogicalNor => !(a || b),
        Operator::LogicalNand => !(a && b),
        Operator::LogicalXor => a != b,
        _ => return None,
    })
}

fn ordering<T: PartialOrd>(a: T, b: T, op: Operator) -> Option<bool> {
    Some(match op {
        Operator::Lt => a < b,
        Operator::Gt => a > b,
        Operator::Eq => a == b,
        Operator::Ne => a != b,
        Operator::Leq => a <= b,
        Operator::Geq => a >= b,
        _ => return None,
    })
}

/// Compares two signed values
pub fn compare_i64(a: i64, b: i64, op: Operator) -> Option<bool> {
    ordering(a, b, op).or_else(|| logical(a != 0, b != 0, op))
}

/// Compares two unsigned values
pub fn compare_u64(a: u64, b: u64, op: Operator) -> Option<bool> {
    ordering(a, b, op)
        .or_else(|| logical(a != 0, b != 0, op))
        .or_else(|| match op {
            Operator::BitwiseAnd => Some(a & b != 0),
            Operator::BitwiseOr => Some(a | b != 0),
            _ => None,
        })
}

/// Compares two floating values
pub fn compare_f64(a: f64, b: f64, op: Operator) -> Option<bool> {
    ordering(a, b, op)
}

pub fn compare_bool(a: bool, b: bool, op: Operator) -> Option<bool> {
    ordering(a, b, op)
        .or_else(|| logical(a, b, op))
        .or_else(|| match op {
            Operator::BitwiseAnd => Some(a & b),
            Operator::BitwiseOr => Some(a | b),
            _ => None,
        })
}

/// Compares two `YYYY-MM-DD` dates
pub fn compare_date(a: &str, b: &str, op: Operator) -> PredicateResult<Option<bool>> {
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| PredicateError::BadValue {
            scalar_type: ScalarType::Date,
            value: s.to_string(),
        })
    };
    let (d1, d2) = (parse(a)?, parse(b)?);
    Ok(match op {
        Operator::Before => Some(d1 < d2),
        Operator::After => Some(d1 > d2),
        _ => ordering(d1, d2, op),
    })
}

/// Compares two strings; `like` is a regex partial match against `pattern`
pub fn compare_str(a: &str, b: &str, op: Operator, pattern: Option<&Regex>) -> Option<bool> {
    match (op, pattern) {
        (Operator::Like, Some(re)) => Some(re.is_match(a)),
        (Operator::Like, None) => None,
        _ => ordering(a, b, op),
    }
}

/// Applies a filter operator to a cell of a column of type `ty`.
///
/// `literal` must carry the column's type; `pattern` is the compiled literal
/// for `like`. Null cells never satisfy a filter.
pub fn evaluate(
    ty: ScalarType,
    op: Operator,
    cell: &Value,
    literal: &Value,
    pattern: Option<&Regex>,
) -> PredicateResult<bool> {
    if cell.is_null() {
        return Ok(false);
    }

    let mismatch = || PredicateError::TypeMismatch {
        expected: ty,
        found: cell
            .scalar_type()
            .map(|t| t.type_name().to_string())
            .unwrap_or_else(|| "null".to_string()),
    };
    if cell.scalar_type() != Some(ty) {
        return Err(mismatch());
    }

    let outcome = match ty {
        ScalarType::Char | ScalarType::UChar if op == Operator::Like => {
            compare_str(&cell.to_literal(), "", op, pattern)
        }
        ScalarType::Int8
        | ScalarType::Int16
        | ScalarType::Int32
        | ScalarType::Int64
        | ScalarType::Char => match (cell.as_i64(), literal.as_i64()) {
            (Some(a), Some(b)) => compare_i64(a, b, op),
            _ => return Err(mismatch()),
        },
        ScalarType::UInt8
        | ScalarType::UInt16
        | ScalarType::UInt32
        | ScalarType::UInt64
        | ScalarType::UChar => match (cell.as_u64(), literal.as_u64()) {
            (Some(a), Some(b)) => compare_u64(a, b, op),
            _ => return Err(mismatch()),
        },
        ScalarType::Float | ScalarType::Double => match (cell.as_f64(), literal.as_f64()) {
            (Some(a), Some(b)) => compare_f64(a, b, op),
            _ => return Err(mismatch()),
        },
        ScalarType::Bool => match (cell.as_bool(), literal.as_bool()) {
            (Some(a), Some(b)) => compare_bool(a, b, op),
            _ => return Err(mismatch()),
        },
        ScalarType::Date => match (cell.as_str(), literal.as_str()) {
            (Some(a), Some(b)) => compare_date(a, b, op)?,
            _ => return Err(mismatch()),
        },
        ScalarType::String => match (cell.as_str(), literal.as_str()) {
            (Some(a), Some(b)) => compare_str(a, b, op, pattern),
            _ => return Err(mismatch()),
        },
    };

    outcome.ok_or(PredicateError::ComparisonNotDefined {
        op,
        scalar_type: ty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_comparisons() {
        assert_eq!(compare_i64(-5, 3, Operator::Lt), Some(true));
        assert_eq!(compare_i64(3, 3, Operator::Geq), Some(true));
        assert_eq!(compare_i64(0, 7, Operator::LogicalOr), Some(true));
        assert_eq!(compare_i64(0, 0, Operator::LogicalNot), Some(true));
        assert_eq!(compare_i64(1, 0, Operator::LogicalXor), Some(true));
        assert_eq!(compare_i64(1, 1, Operator::LogicalNand), Some(false));
        assert_eq!(compare_i64(1, 1, Operator::BitwiseAnd), None);
    }

    #[test]
    fn test_unsigned_bitwise() {
        assert_eq!(compare_u64(0b1010, 0b0010, Operator::BitwiseAnd), Some(true));
        assert_eq!(compare_u64(0b1000, 0b0010, Operator::BitwiseAnd), Some(false));
        assert_eq!(compare_u64(0, 0, Operator::BitwiseOr), Some(false));
    }

    #[test]
    fn test_float_only_orders() {
        assert_eq!(compare_f64(1.5, 2.5, Operator::Leq), Some(true));
        assert_eq!(compare_f64(1.5, 2.5, Operator::LogicalAnd), None);
    }

    #[test]
    fn test_dates() {
        assert_eq!(
            compare_date("1995-01-01", "1996-01-01", Operator::Before).unwrap(),
            Some(true)
        );
        assert_eq!(
            compare_date("1995-01-01", "1995-01-01", Operator::Geq).unwrap(),
            Some(true)
        );
        let err = compare_date("1995/01/01", "1995-01-01", Operator::Eq).unwrap_err();
        assert_eq!(err.code(), "TAB_DECODE_ERROR");
    }

    #[test]
    fn test_like_is_partial_match() {
        let re = Regex::new("qu.ck").unwrap();
        assert_eq!(
            compare_str("the quick fox", "", Operator::Like, Some(&re)),
            Some(true)
        );
        assert_eq!(compare_str("slow", "", Operator::Like, Some(&re)), Some(false));
    }

    #[test]
    fn test_evaluate_null_and_mismatch() {
        let lit = Value::Int32(5);
        assert!(!evaluate(ScalarType::Int32, Operator::Eq, &Value::Null, &lit, None).unwrap());
        let err = evaluate(ScalarType::Int32, Operator::Eq, &Value::Int64(5), &lit, None)
            .unwrap_err();
        assert_eq!(err.code(), "TAB_UNSUPPORTED_TYPE");
    }

    #[test]
    fn test_evaluate_char_like() {
        let re = Regex::new("[a-c]").unwrap();
        let lit = Value::Char(b'a' as i8);
        assert!(evaluate(
            ScalarType::Char,
            Operator::Like,
            &Value::Char(b'b' as i8),
            &lit,
            Some(&re)
        )
        .unwrap());
    }
}
