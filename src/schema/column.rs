//! Column descriptors and schema strings
//!
//! A schema string holds one column per line (or `;`-separated):
//!
//! ```text
//! <idx> <type-code> <is_key> <nullable> <name>
//! 0 3 1 0 ORDERKEY
//! 1 3 0 0 PARTKEY
//! ```

use std::fmt;

use super::errors::{SchemaError, SchemaResult};
use super::types::ScalarType;

/// Column index reserved for the row-id pseudo-column
pub const RID_COLUMN_INDEX: i32 = -1;

/// Name of the row-id pseudo-column
pub const RID_COLUMN_NAME: &str = "RID";

/// Projection string selecting every column
pub const PROJECT_ALL: &str = "*";

/// Number of whitespace-separated fields per column descriptor
const COL_INFO_FIELDS: usize = 5;

/// Describes one table column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Position of the column's cell within a row
    pub idx: i32,
    /// Scalar type of the column
    pub scalar_type: ScalarType,
    /// Whether the column is part of the table key
    pub is_key: bool,
    /// Whether the column may hold nulls
    pub nullable: bool,
    /// Column name
    pub name: String,
}

impl ColumnDescriptor {
    /// Creates a column descriptor
    pub fn new(
        idx: i32,
        scalar_type: ScalarType,
        is_key: bool,
        nullable: bool,
        name: impl Into<String>,
    ) -> Self {
        Self {
            idx,
            scalar_type,
            is_key,
            nullable,
            name: name.into(),
        }
    }

    /// The row-id pseudo-column
    pub fn row_id() -> Self {
        Self::new(
            RID_COLUMN_INDEX,
            ScalarType::UInt64,
            true,
            false,
            RID_COLUMN_NAME,
        )
    }

    /// Returns true for the row-id pseudo-column
    pub fn is_row_id(&self) -> bool {
        self.idx == RID_COLUMN_INDEX
    }

    /// Case-insensitive name comparison
    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }

    /// Parses a single `"<idx> <type> <is_key> <nullable> <name>"` descriptor
    pub fn parse(line: &str) -> SchemaResult<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != COL_INFO_FIELDS {
            return Err(SchemaError::bad_line(
                line,
                format!("expected {} fields, found {}", COL_INFO_FIELDS, fields.len()),
            ));
        }

        let idx: i32 = fields[0]
            .parse()
            .map_err(|_| SchemaError::bad_line(line, "column index is not an integer"))?;
        let code: i64 = fields[1]
            .parse()
            .map_err(|_| SchemaError::bad_line(line, "type code is not an integer"))?;
        let scalar_type = ScalarType::from_code(code)?;

        Ok(Self {
            idx,
            scalar_type,
            is_key: parse_flag(line, fields[2])?,
            nullable: parse_flag(line, fields[3])?,
            name: fields[4].to_string(),
        })
    }
}

fn parse_flag(line: &str, field: &str) -> SchemaResult<bool> {
    match field {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(SchemaError::bad_line(
            line,
            format!("flag must be 0 or 1, found {:?}", other),
        )),
    }
}

impl fmt::Display for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.idx,
            self.scalar_type.code(),
            u8::from(self.is_key),
            u8::from(self.nullable),
            self.name
        )
    }
}

/// Ordered sequence of column descriptors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnDescriptor>,
}

impl Schema {
    /// Creates a schema from descriptors
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self { columns }
    }

    /// Parses a schema string.
    ///
    /// Descriptors are separated by `;` when present, else by newlines.
    /// Blank pieces are ignored; a string with no descriptor at all is an error.
    pub fn parse(schema: &str) -> SchemaResult<Self> {
        let sep = if schema.contains(';') { ';' } else { '\n' };

        let columns = schema
            .split(sep)
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(ColumnDescriptor::parse)
            .collect::<SchemaResult<Vec<_>>>()?;

        if columns.is_empty() {
            return Err(SchemaError::EmptySchema);
        }
        Ok(Self { columns })
    }

    /// Serializes back into the newline-separated schema string
    pub fn to_schema_string(&self) -> String {
        let mut out = String::new();
        for col in &self.columns {
            out.push_str(&col.to_string());
            out.push('\n');
        }
        out
    }

    /// Builds a projection schema from a column-name list.
    ///
    /// `"*"` selects all columns, `"RID"` selects the row-id pseudo-column,
    /// anything else is a comma-separated list resolved in the given order.
    pub fn project(&self, col_names: &str) -> SchemaResult<Schema> {
        let col_names = col_names.trim();
        if col_names == PROJECT_ALL {
            return Ok(self.clone());
        }
        if col_names.eq_ignore_ascii_case(RID_COLUMN_NAME) {
            return Ok(Schema::new(vec![ColumnDescriptor::row_id()]));
        }

        let mut columns = Vec::new();
        for name in col_names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let col = self
                .column_named(name)
                .ok_or_else(|| SchemaError::ColumnNotPresent(name.to_string()))?;
            columns.push(col.clone());
        }

        if columns.is_empty() {
            return Err(SchemaError::EmptySchema);
        }
        Ok(Schema::new(columns))
    }

    /// Looks up a column by name (case-insensitive)
    pub fn column_named(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.has_name(name))
    }

    /// Resolves a column name, falling back to the row-id pseudo-column
    pub fn resolve(&self, name: &str) -> SchemaResult<ColumnDescriptor> {
        if let Some(col) = self.column_named(name) {
            return Ok(col.clone());
        }
        if name.trim().eq_ignore_ascii_case(RID_COLUMN_NAME) {
            return Ok(ColumnDescriptor::row_id());
        }
        Err(SchemaError::ColumnNotPresent(name.trim().to_string()))
    }

    /// Looks up a column by its cell index
    pub fn column_at(&self, idx: i32) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.idx == idx)
    }

    /// Ordinal position of a cell index within this schema
    pub fn position_of(&self, idx: i32) -> Option<usize> {
        self.columns.iter().position(|c| c.idx == idx)
    }

    /// Largest cell index, or `None` for an empty schema
    pub fn max_index(&self) -> Option<i32> {
        self.columns.iter().map(|c| c.idx).max()
    }

    /// Column names in schema order
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
