//! Key codec
//!
//! Deterministic, order-preserving string keys for every index entry. The
//! same functions are used when building indexes and when bounding scans, so
//! a key written by the builder is always reachable by the planner.

mod codec;
mod errors;

pub use codec::{
    build_key_data, build_prefix, compare_keys, decode_key_data, join_key_data, key_value,
    key_width, location_key, pad_u64, record_key, sequence_key_data, text_key, uniqueness_suffix,
    IndexKind, KEY_COLS_DEFAULT, KEY_DELIM_INNER, KEY_DELIM_OUTER, KEY_DELIM_UNIQUE, NAME_DEFAULT,
};
pub use errors::{KeyError, KeyResult};
