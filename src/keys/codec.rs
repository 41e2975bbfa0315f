//! Order-preserving key encoding for the ordered key-value store
//!
//! ```text
//! prefix   = {kind}:{db}-{table}:{col[-col...] | *}:
//! record   = prefix + key-data                              (unique)
//!          = prefix + key-data + :ENTRY- + rid              (non-unique)
//! text     = prefix + token + :ENTRY- + rid + - + word-pos
//! location = IDX_FB:{db}-{table}:*: + seq
//! ```
//!
//! Numeric key-data is a zero-padded decimal string whose width covers the
//! type's full range, so lexicographic order equals numeric order. The build
//! and read paths both go through `build_key_data`; widths must never change.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::schema::{ScalarType, Value};

use super::errors::{KeyError, KeyResult};

/// Separates prefix fields and the uniqueness suffix
pub const KEY_DELIM_OUTER: &str = ":";
/// Separates values inside one field
pub const KEY_DELIM_INNER: &str = "-";
/// Marks the uniqueness suffix of non-unique entries
pub const KEY_DELIM_UNIQUE: &str = "ENTRY";
/// Column list used when a prefix names no columns
pub const KEY_COLS_DEFAULT: &str = "*";
/// Substituted for an empty db or table name
pub const NAME_DEFAULT: &str = "*";

/// Width of 64-bit key data; also used for row-ids and batch sequences
const WIDTH_64: usize = 20;
/// Width of word positions in text keys
const WIDTH_WORD_POS: usize = 10;

/// Kind of index a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Batch sequence number to byte range
    Location,
    /// Row-id to row reference
    RowId,
    /// One or more column values to row reference
    Record,
    /// Text tokens to row reference
    Text,
}

impl IndexKind {
    /// Tag that opens every key of this kind
    pub fn tag(&self) -> &'static str {
        match self {
            IndexKind::Location => "IDX_FB",
            IndexKind::RowId => "IDX_RID",
            IndexKind::Record => "IDX_REC",
            IndexKind::Text => "IDX_TXT",
        }
    }
}

/// Builds the deterministic key prefix shared by writes and bounded scans.
///
/// Empty db/table names become `*`; an empty column list (and every
/// location prefix) uses `*`.
pub fn build_prefix(kind: IndexKind, db: &str, table: &str, columns: &[&str]) -> String {
    let db = non_empty_or_default(db);
    let table = non_empty_or_default(table);

    let cols = if kind == IndexKind::Location || columns.is_empty() {
        KEY_COLS_DEFAULT.to_string()
    } else {
        columns.join(KEY_DELIM_INNER)
    };

    format!(
        "{tag}{o}{db}{i}{table}{o}{cols}{o}",
        tag = kind.tag(),
        o = KEY_DELIM_OUTER,
        i = KEY_DELIM_INNER,
    )
}

fn non_empty_or_default(name: &str) -> &str {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        NAME_DEFAULT
    } else {
        trimmed
    }
}

/// Decimal width of the key data for integral and floating types
pub fn key_width(ty: ScalarType) -> Option<usize> {
    match ty {
        ScalarType::Bool => Some(1),
        ScalarType::Int8 | ScalarType::UInt8 | ScalarType::Char | ScalarType::UChar => Some(3),
        ScalarType::Int16 | ScalarType::UInt16 => Some(5),
        ScalarType::Int32 | ScalarType::UInt32 => Some(10),
        ScalarType::Int64 | ScalarType::UInt64 | ScalarType::Float | ScalarType::Double => {
            Some(WIDTH_64)
        }
        ScalarType::Date | ScalarType::String => None,
    }
}

/// Zero-pads an unsigned value to `width` digits
pub fn pad_u64(value: u64, width: usize) -> String {
    format!("{:0width$}", value, width = width)
}

/// Key data for a batch sequence number (location index)
pub fn sequence_key_data(seq: u64) -> String {
    pad_u64(seq, WIDTH_64)
}

/// Encodes a value as order-preserving key data for a column of type `ty`
pub fn build_key_data(ty: ScalarType, value: &Value) -> KeyResult<String> {
    let mismatch = || KeyError::TypeMismatch {
        expected: ty,
        found: value
            .scalar_type()
            .map(|t| t.type_name().to_string())
            .unwrap_or_else(|| "null".to_string()),
    };

    if value.is_null() {
        return Err(KeyError::NullKey);
    }

    let encoded = match (ty, value) {
        (ScalarType::Bool, Value::Bool(v)) => pad_u64(u64::from(*v), 1),
        (ScalarType::Int8, Value::Int8(v)) | (ScalarType::Char, Value::Char(v)) => {
            pad_u64((*v as i64 - i8::MIN as i64) as u64, 3)
        }
        (ScalarType::Int16, Value::Int16(v)) => pad_u64((*v as i64 - i16::MIN as i64) as u64, 5),
        (ScalarType::Int32, Value::Int32(v)) => pad_u64((*v as i64 - i32::MIN as i64) as u64, 10),
        (ScalarType::Int64, Value::Int64(v)) => pad_u64((*v as u64) ^ (1 << 63), WIDTH_64),
        (ScalarType::UInt8, Value::UInt8(v)) | (ScalarType::UChar, Value::UChar(v)) => {
            pad_u64(*v as u64, 3)
        }
        (ScalarType::UInt16, Value::UInt16(v)) => pad_u64(*v as u64, 5),
        (ScalarType::UInt32, Value::UInt32(v)) => pad_u64(*v as u64, 10),
        (ScalarType::UInt64, Value::UInt64(v)) => pad_u64(*v, WIDTH_64),
        (ScalarType::Float, Value::Float(v)) => pad_u64(ordered_float_bits(*v as f64), WIDTH_64),
        (ScalarType::Double, Value::Double(v)) => pad_u64(ordered_float_bits(*v), WIDTH_64),
        (ScalarType::Date, Value::Date(s)) | (ScalarType::String, Value::String(s)) => s.clone(),
        _ => return Err(mismatch()),
    };
    Ok(encoded)
}

/// Decodes key data produced by `build_key_data`
pub fn decode_key_data(ty: ScalarType, key_data: &str) -> KeyResult<Value> {
    let malformed = |reason: &str| KeyError::Malformed {
        scalar_type: ty,
        key_data: key_data.to_string(),
        reason: reason.to_string(),
    };

    let Some(width) = key_width(ty) else {
        return Ok(match ty {
            ScalarType::Date => Value::Date(key_data.to_string()),
            _ => Value::String(key_data.to_string()),
        });
    };

    if key_data.len() != width || !key_data.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("expected fixed-width decimal digits"));
    }
    let raw: u64 = key_data.parse().map_err(|_| malformed("out of range"))?;
    let out_of_range = || malformed("out of range for type");

    let value = match ty {
        ScalarType::Bool => match raw {
            0 => Value::Bool(false),
            1 => Value::Bool(true),
            _ => return Err(out_of_range()),
        },
        ScalarType::Int8 => Value::Int8(unbias(raw, i8::MIN as i64).try_into().map_err(|_| out_of_range())?),
        ScalarType::Char => Value::Char(unbias(raw, i8::MIN as i64).try_into().map_err(|_| out_of_range())?),
        ScalarType::Int16 => Value::Int16(unbias(raw, i16::MIN as i64).try_into().map_err(|_| out_of_range())?),
        ScalarType::Int32 => Value::Int32(unbias(raw, i32::MIN as i64).try_into().map_err(|_| out_of_range())?),
        ScalarType::Int64 => Value::Int64((raw ^ (1 << 63)) as i64),
        ScalarType::UInt8 => Value::UInt8(raw.try_into().map_err(|_| out_of_range())?),
        ScalarType::UChar => Value::UChar(raw.try_into().map_err(|_| out_of_range())?),
        ScalarType::UInt16 => Value::UInt16(raw.try_into().map_err(|_| out_of_range())?),
        ScalarType::UInt32 => Value::UInt32(raw.try_into().map_err(|_| out_of_range())?),
        ScalarType::UInt64 => Value::UInt64(raw),
        ScalarType::Float => Value::Float(f64_from_ordered_bits(raw) as f32),
        ScalarType::Double => Value::Double(f64_from_ordered_bits(raw)),
        ScalarType::Date | ScalarType::String => return Err(malformed("textual types have no width")),
    };
    Ok(value)
}

fn unbias(raw: u64, min: i64) -> i64 {
    raw as i64 + min
}

/// Maps an f64 onto u64 so that unsigned order equals float order.
///
/// Negative floats flip all bits; positive floats flip the sign bit.
/// `-0.0` encodes as `0.0` since the two compare equal, and every NaN
/// encodes as the canonical quiet NaN, which sorts above infinity.
fn ordered_float_bits(v: f64) -> u64 {
    let v = if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    };
    let bits = v.to_bits();
    if (bits >> 63) == 1 {
        !bits
    } else {
        bits ^ (1 << 63)
    }
}

fn f64_from_ordered_bits(ordered: u64) -> f64 {
    let bits = if (ordered >> 63) == 1 {
        ordered ^ (1 << 63)
    } else {
        !ordered
    };
    f64::from_bits(bits)
}

/// Joins per-column key data for a multi-column key
pub fn join_key_data<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(KEY_DELIM_INNER)
}

/// Suffix that keeps duplicate key data distinct: `:ENTRY-<rid>`
pub fn uniqueness_suffix(rid: i64) -> String {
    format!(
        "{}{}{}{}",
        KEY_DELIM_OUTER,
        KEY_DELIM_UNIQUE,
        KEY_DELIM_INNER,
        pad_u64(rid as u64, WIDTH_64)
    )
}

/// Full key of a record or row-id entry
pub fn record_key(prefix: &str, key_data: &str, unique: bool, rid: i64) -> String {
    if unique {
        format!("{}{}", prefix, key_data)
    } else {
        format!("{}{}{}", prefix, key_data, uniqueness_suffix(rid))
    }
}

/// Full key of a text entry; unique across repeated words within and across rows
pub fn text_key(prefix: &str, token: &str, rid: i64, word_pos: u32) -> String {
    format!(
        "{}{}{}{}{}",
        prefix,
        token,
        uniqueness_suffix(rid),
        KEY_DELIM_INNER,
        pad_u64(word_pos as u64, WIDTH_WORD_POS)
    )
}

/// Full key of a location entry
pub fn location_key(location_prefix: &str, seq: u64) -> String {
    format!("{}{}", location_prefix, sequence_key_data(seq))
}

/// Extracts the key-data portion of a stored key.
///
/// Strips `prefix` and any uniqueness suffix; returns `None` when the key
/// belongs to a different prefix.
pub fn key_value<'k>(prefix: &str, key: &'k str) -> Option<&'k str> {
    let rest = key.strip_prefix(prefix)?;
    let marker = format!("{}{}{}", KEY_DELIM_OUTER, KEY_DELIM_UNIQUE, KEY_DELIM_INNER);
    match rest.rfind(&marker) {
        Some(pos) => Some(&rest[..pos]),
        None => Some(rest),
    }
}

/// Lexicographic comparison of keys or key data, used for scan-stop decisions
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    a.as_bytes().cmp(b.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_layout() {
        let prefix = build_prefix(IndexKind::Record, "tpch", "lineitem", &["ORDERKEY", "LINENUMBER"]);
        assert_eq!(prefix, "IDX_REC:tpch-lineitem:ORDERKEY-LINENUMBER:");

        let prefix = build_prefix(IndexKind::Location, "", " ", &["ignored"]);
        assert_eq!(prefix, "IDX_FB:*-*:*:");

        let prefix = build_prefix(IndexKind::Text, "db", "t", &[]);
        assert_eq!(prefix, "IDX_TXT:db-t:*:");
    }

    #[test]
    fn test_fixed_widths() {
        assert_eq!(build_key_data(ScalarType::UInt32, &Value::UInt32(7)).unwrap(), "0000000007");
        assert_eq!(build_key_data(ScalarType::UInt8, &Value::UInt8(255)).unwrap(), "255");
        assert_eq!(build_key_data(ScalarType::Bool, &Value::Bool(true)).unwrap(), "1");
        assert_eq!(
            build_key_data(ScalarType::UInt64, &Value::UInt64(u64::MAX)).unwrap(),
            "18446744073709551615"
        );
        assert_eq!(build_key_data(ScalarType::Int8, &Value::Int8(i8::MIN)).unwrap(), "000");
        assert_eq!(build_key_data(ScalarType::Int16, &Value::Int16(0)).unwrap(), "32768");
    }

    #[test]
    fn test_signed_order_preserved() {
        let values = [i32::MIN, -1000, -1, 0, 1, 999, i32::MAX];
        let keys: Vec<String> = values
            .iter()
            .map(|v| build_key_data(ScalarType::Int32, &Value::Int32(*v)).unwrap())
            .collect();
        for pair in keys.windows(2) {
            assert_eq!(compare_keys(&pair[0], &pair[1]), Ordering::Less);
        }
    }

    #[test]
    fn test_float_order_preserved() {
        let values = [-1e10, -2.5, -0.0001, 0.0, 0.5, 3.25, 1e12];
        let keys: Vec<String> = values
            .iter()
            .map(|v| build_key_data(ScalarType::Double, &Value::Double(*v)).unwrap())
            .collect();
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_signed_zeros_share_key_data() {
        let pos = build_key_data(ScalarType::Double, &Value::Double(0.0)).unwrap();
        let neg = build_key_data(ScalarType::Double, &Value::Double(-0.0)).unwrap();
        assert_eq!(pos, neg);
        let neg_f32 = build_key_data(ScalarType::Float, &Value::Float(-0.0)).unwrap();
        assert_eq!(neg_f32, pos);
    }

    #[test]
    fn test_nan_sorts_above_infinity() {
        let inf = build_key_data(ScalarType::Double, &Value::Double(f64::INFINITY)).unwrap();
        let nan = build_key_data(ScalarType::Double, &Value::Double(f64::NAN)).unwrap();
        let neg_nan = build_key_data(ScalarType::Double, &Value::Double(-f64::NAN)).unwrap();
        assert_eq!(nan, neg_nan);
        assert_eq!(compare_keys(&inf, &nan), Ordering::Less);
    }

    #[test]
    fn test_decode_roundtrip() {
        let samples = [
            (ScalarType::Int8, Value::Int8(-100)),
            (ScalarType::Int64, Value::Int64(i64::MIN)),
            (ScalarType::Int64, Value::Int64(42)),
            (ScalarType::UInt16, Value::UInt16(65535)),
            (ScalarType::Char, Value::Char(b'x' as i8)),
            (ScalarType::Double, Value::Double(-3.5)),
            (ScalarType::Float, Value::Float(1.25)),
            (ScalarType::Date, Value::Date("1998-12-01".into())),
            (ScalarType::String, Value::String("token".into())),
        ];
        for (ty, value) in samples {
            let encoded = build_key_data(ty, &value).unwrap();
            assert_eq!(decode_key_data(ty, &encoded).unwrap(), value);
        }
    }

    #[test]
    fn test_decode_rejects_bad_width() {
        let err = decode_key_data(ScalarType::UInt32, "12").unwrap_err();
        assert_eq!(err.code(), "TAB_DECODE_ERROR");
        assert!(decode_key_data(ScalarType::UInt8, "999").is_err());
        assert!(decode_key_data(ScalarType::UInt8, "0a1").is_err());
    }

    #[test]
    fn test_null_and_mismatch_rejected() {
        assert_eq!(build_key_data(ScalarType::Int32, &Value::Null).unwrap_err(), KeyError::NullKey);
        let err = build_key_data(ScalarType::Int32, &Value::Int64(1)).unwrap_err();
        assert_eq!(err.code(), "TAB_UNSUPPORTED_TYPE");
    }

    #[test]
    fn test_entry_keys_and_value_extraction() {
        let prefix = build_prefix(IndexKind::Record, "db", "t", &["ORDERKEY"]);
        let data = build_key_data(ScalarType::UInt32, &Value::UInt32(2)).unwrap();

        let unique = record_key(&prefix, &data, true, 9);
        assert_eq!(unique, "IDX_REC:db-t:ORDERKEY:0000000002");
        assert_eq!(key_value(&prefix, &unique), Some("0000000002"));

        let dup = record_key(&prefix, &data, false, 9);
        assert_eq!(dup, "IDX_REC:db-t:ORDERKEY:0000000002:ENTRY-00000000000000000009");
        assert_eq!(key_value(&prefix, &dup), Some("0000000002"));

        let txt_prefix = build_prefix(IndexKind::Text, "db", "t", &["COMMENT"]);
        let txt = text_key(&txt_prefix, "quick", 3, 1);
        assert_eq!(txt, "IDX_TXT:db-t:COMMENT:quick:ENTRY-00000000000000000003-0000000001");
        assert_eq!(key_value(&txt_prefix, &txt), Some("quick"));

        assert_eq!(key_value("IDX_RID:db-t:RID:", &dup), None);
    }

    #[test]
    fn test_location_keys_sort_by_sequence() {
        let prefix = build_prefix(IndexKind::Location, "db", "t", &[]);
        let k9 = location_key(&prefix, 9);
        let k10 = location_key(&prefix, 10);
        assert_eq!(compare_keys(&k9, &k10), Ordering::Less);
    }

    #[test]
    fn test_join_key_data() {
        assert_eq!(join_key_data(&["0000000001", "0000000006"]), "0000000001-0000000006");
        assert_eq!(join_key_data(&["abc"]), "abc");
    }
}
