//! Row-batch encoding
//!
//! A row-batch is one framed blob of object content. All integers are LE:
//!
//! ```text
//! +------------------+
//! | Version          | (u8)
//! +------------------+
//! | DB name          | (u32-length-prefixed string)
//! +------------------+
//! | Table name       | (u32-length-prefixed string)
//! +------------------+
//! | Schema string    | (u32-length-prefixed string)
//! +------------------+
//! | Row count        | (u32)
//! +------------------+
//! | Delete vector    | (u8 per row: 0 = live, 1 = deleted)
//! +------------------+
//! | Row offsets      | (u32 per row, relative to the rows section)
//! +------------------+
//! | Rows length      | (u32)
//! +------------------+
//! | Rows             | rid (i64), null words (u16 count + u64 each),
//! |                  | cells (u16 count + tagged values)
//! +------------------+
//! | Checksum         | (u32 CRC32 over all preceding bytes)
//! +------------------+
//! ```
//!
//! Cell tags are the scalar type codes; tag 0 is a null cell. Rows are
//! decoded lazily, one at a time, through a bounds-checked reader.

use crate::schema::{ScalarType, Schema, Value};

use super::checksum::{compute_checksum, verify_checksum};
use super::errors::{StorageError, StorageResult};

/// Current row-batch format version
pub const BATCH_FORMAT_VERSION: u8 = 1;

const NULL_TAG: u8 = 0;
const CHECKSUM_SIZE: usize = 4;

/// One decoded row
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub rid: i64,
    /// One bit per column index, set when the cell is null
    pub nullbits: Vec<u64>,
    pub cells: Vec<Value>,
}

impl Row {
    /// Cell at `position` within the row
    pub fn cell(&self, position: usize) -> Option<&Value> {
        self.cells.get(position)
    }
}

/// Null bitmap for cells laid out in `schema` column order
pub fn null_bits_for(schema: &Schema, cells: &[Value]) -> Vec<u64> {
    let words = schema.max_index().map_or(1, |max| (max.max(0) as usize) / 64 + 1);
    let mut bits = vec![0u64; words];
    for (col, cell) in schema.iter().zip(cells) {
        if cell.is_null() && col.idx >= 0 {
            let idx = col.idx as usize;
            bits[idx / 64] |= 1 << (idx % 64);
        }
    }
    bits
}

/// Accumulates rows and serializes them as one row-batch
#[derive(Debug, Clone)]
pub struct RowBatchBuilder {
    db: String,
    table: String,
    schema_string: String,
    deleted: Vec<bool>,
    rows: Vec<Vec<u8>>,
}

impl RowBatchBuilder {
    pub fn new(
        db: impl Into<String>,
        table: impl Into<String>,
        schema_string: impl Into<String>,
    ) -> Self {
        Self {
            db: db.into(),
            table: table.into(),
            schema_string: schema_string.into(),
            deleted: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Appends a live row
    pub fn push_row(&mut self, rid: i64, nullbits: &[u64], cells: &[Value]) {
        let mut buf = Vec::new();
        buf.extend_from_slice(&rid.to_le_bytes());
        buf.extend_from_slice(&(nullbits.len() as u16).to_le_bytes());
        for word in nullbits {
            buf.extend_from_slice(&word.to_le_bytes());
        }
        buf.extend_from_slice(&(cells.len() as u16).to_le_bytes());
        for cell in cells {
            encode_cell(cell, &mut buf);
        }
        self.rows.push(buf);
        self.deleted.push(false);
    }

    /// Soft-deletes the row at `position`; false if there is no such row
    pub fn mark_deleted(&mut self, position: usize) -> bool {
        match self.deleted.get_mut(position) {
            Some(flag) => {
                *flag = true;
                true
            }
            None => false,
        }
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn schema_string(&self) -> &str {
        &self.schema_string
    }

    /// Serializes the batch, appending the checksum
    pub fn finish(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.push(BATCH_FORMAT_VERSION);
        put_str(&mut buf, &self.db);
        put_str(&mut buf, &self.table);
        put_str(&mut buf, &self.schema_string);
        buf.extend_from_slice(&(self.rows.len() as u32).to_le_bytes());

        for deleted in &self.deleted {
            buf.push(u8::from(*deleted));
        }

        let mut offset = 0u32;
        for row in &self.rows {
            buf.extend_from_slice(&offset.to_le_bytes());
            offset += row.len() as u32;
        }
        buf.extend_from_slice(&offset.to_le_bytes());
        for row in &self.rows {
            buf.extend_from_slice(row);
        }

        let checksum = compute_checksum(&buf);
        buf.extend_from_slice(&checksum.to_le_bytes());
        buf
    }
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

fn encode_cell(cell: &Value, buf: &mut Vec<u8>) {
    let Some(ty) = cell.scalar_type() else {
        buf.push(NULL_TAG);
        return;
    };
    buf.push(ty.code());
    match cell {
        Value::Null => {}
        Value::Int8(v) | Value::Char(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Int16(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Int32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Int64(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::UInt8(v) | Value::UChar(v) => buf.push(*v),
        Value::UInt16(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::UInt32(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::UInt64(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Bool(v) => buf.push(u8::from(*v)),
        Value::Float(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Double(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Value::Date(s) | Value::String(s) => put_str(buf, s),
    }
}

/// Bounds-checked cursor over a byte slice.
///
/// Every read validates the remaining length and reports the failing
/// position as a decode error.
#[derive(Debug)]
pub struct BatchReader<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Position of `buf[0]` in the enclosing blob, for error reporting
    base: usize,
}

impl<'a> BatchReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_base(buf, 0)
    }

    fn with_base(buf: &'a [u8], base: usize) -> Self {
        Self { buf, pos: 0, base }
    }

    pub fn position(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn bytes(&mut self, n: usize) -> StorageResult<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.buf.len());
        let Some(end) = end else {
            return Err(StorageError::decode(
                self.position(),
                format!("need {} bytes, {} remain", n, self.remaining()),
            ));
        };
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> StorageResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> StorageResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub fn u16(&mut self) -> StorageResult<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> StorageResult<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn u64(&mut self) -> StorageResult<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    pub fn i64(&mut self) -> StorageResult<i64> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    /// u32-length-prefixed UTF-8 string
    pub fn string(&mut self) -> StorageResult<String> {
        let len = self.u32()? as usize;
        let at = self.position();
        let raw = self.bytes(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| StorageError::decode(at, "invalid utf-8"))
    }

    fn cell(&mut self) -> StorageResult<Value> {
        let at = self.position();
        let tag = self.u8()?;
        if tag == NULL_TAG {
            return Ok(Value::Null);
        }
        let ty = ScalarType::from_code(tag as i64)
            .map_err(|_| StorageError::decode(at, format!("unknown cell tag {}", tag)))?;
        let value = match ty {
            ScalarType::Int8 => Value::Int8(i8::from_le_bytes(self.array()?)),
            ScalarType::Int16 => Value::Int16(i16::from_le_bytes(self.array()?)),
            ScalarType::Int32 => Value::Int32(i32::from_le_bytes(self.array()?)),
            ScalarType::Int64 => Value::Int64(self.i64()?),
            ScalarType::UInt8 => Value::UInt8(self.u8()?),
            ScalarType::UInt16 => Value::UInt16(self.u16()?),
            ScalarType::UInt32 => Value::UInt32(self.u32()?),
            ScalarType::UInt64 => Value::UInt64(self.u64()?),
            ScalarType::Char => Value::Char(i8::from_le_bytes(self.array()?)),
            ScalarType::UChar => Value::UChar(self.u8()?),
            ScalarType::Bool => match self.u8()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => {
                    return Err(StorageError::decode(at, format!("bad bool byte {}", other)))
                }
            },
            ScalarType::Float => Value::Float(f32::from_le_bytes(self.array()?)),
            ScalarType::Double => Value::Double(f64::from_le_bytes(self.array()?)),
            ScalarType::Date => Value::Date(self.string()?),
            ScalarType::String => Value::String(self.string()?),
        };
        Ok(value)
    }
}

/// Decoded header of a row-batch with lazy access to its rows
#[derive(Debug, Clone)]
pub struct RowBatchView<'a> {
    version: u8,
    db: String,
    table: String,
    schema_string: String,
    deleted: Vec<bool>,
    row_offsets: Vec<u32>,
    rows: &'a [u8],
    rows_base: usize,
}

impl<'a> RowBatchView<'a> {
    /// Verifies the checksum and decodes the header
    pub fn decode(blob: &'a [u8]) -> StorageResult<Self> {
        if blob.len() < CHECKSUM_SIZE {
            return Err(StorageError::decode(0, "row-batch shorter than checksum"));
        }
        let (body, tail) = blob.split_at(blob.len() - CHECKSUM_SIZE);
        let mut stored = [0u8; CHECKSUM_SIZE];
        stored.copy_from_slice(tail);
        let stored = u32::from_le_bytes(stored);
        if !verify_checksum(body, stored) {
            return Err(StorageError::ChecksumMismatch {
                stored,
                computed: compute_checksum(body),
            });
        }

        let mut reader = BatchReader::new(body);
        let version = reader.u8()?;
        if version != BATCH_FORMAT_VERSION {
            return Err(StorageError::decode(0, format!("unsupported version {}", version)));
        }
        let db = reader.string()?;
        let table = reader.string()?;
        let schema_string = reader.string()?;
        let nrows = reader.u32()? as usize;

        let deleted = reader
            .bytes(nrows)?
            .iter()
            .map(|b| *b != 0)
            .collect::<Vec<_>>();

        let mut row_offsets = Vec::with_capacity(nrows.min(reader.remaining() / 4));
        for _ in 0..nrows {
            row_offsets.push(reader.u32()?);
        }

        let rows_len = reader.u32()? as usize;
        let rows_base = reader.position();
        let rows = reader.bytes(rows_len)?;
        if reader.remaining() != 0 {
            return Err(StorageError::decode(reader.position(), "trailing bytes after rows"));
        }
        if let Some(bad) = row_offsets.iter().find(|o| **o as usize >= rows_len) {
            return Err(StorageError::decode(
                rows_base,
                format!("row offset {} outside rows section of {} bytes", bad, rows_len),
            ));
        }

        Ok(Self {
            version,
            db,
            table,
            schema_string,
            deleted,
            row_offsets,
            rows,
            rows_base,
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn db_name(&self) -> &str {
        &self.db
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn schema_string(&self) -> &str {
        &self.schema_string
    }

    pub fn nrows(&self) -> usize {
        self.row_offsets.len()
    }

    pub fn is_deleted(&self, position: usize) -> bool {
        self.deleted.get(position).copied().unwrap_or(false)
    }

    /// Delete markers, one per row
    pub fn deleted(&self) -> &[bool] {
        &self.deleted
    }

    /// Decodes the row at `position`
    pub fn row(&self, position: usize) -> StorageResult<Row> {
        let Some(offset) = self.row_offsets.get(position) else {
            return Err(StorageError::decode(
                self.rows_base,
                format!("row {} of {}", position, self.nrows()),
            ));
        };
        let offset = *offset as usize;
        let mut reader = BatchReader::with_base(&self.rows[offset..], self.rows_base + offset);

        let rid = reader.i64()?;
        let nwords = reader.u16()? as usize;
        let mut nullbits = Vec::with_capacity(nwords);
        for _ in 0..nwords {
            nullbits.push(reader.u64()?);
        }
        let ncells = reader.u16()? as usize;
        let mut cells = Vec::with_capacity(ncells);
        for _ in 0..ncells {
            cells.push(reader.cell()?);
        }
        Ok(Row {
            rid,
            nullbits,
            cells,
        })
    }
}
