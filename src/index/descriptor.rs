//! Secondary index definitions

use crate::keys::{build_prefix, IndexKind};
use crate::schema::{ColumnDescriptor, Schema, RID_COLUMN_NAME};

use super::errors::{IndexError, IndexResult};
use super::text::TextOptions;

/// Defines one secondary index on an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescriptor {
    kind: IndexKind,
    /// Key columns (record) or text columns (text), in key order
    schema: Schema,
    unique: bool,
    /// Flush threshold while building, page size while scanning; `None`
    /// defers to the engine config
    batch_size: Option<usize>,
    text: TextOptions,
}

impl IndexDescriptor {
    /// Index on the row-id
    pub fn row_id() -> Self {
        Self {
            kind: IndexKind::RowId,
            schema: Schema::new(vec![ColumnDescriptor::row_id()]),
            unique: true,
            batch_size: None,
            text: TextOptions::default(),
        }
    }

    /// Index on one or more columns
    pub fn record(schema: Schema, unique: bool) -> IndexResult<Self> {
        if schema.is_empty() {
            return Err(IndexError::InvalidDescriptor(
                "record index needs at least one key column".into(),
            ));
        }
        Ok(Self {
            kind: IndexKind::Record,
            schema,
            unique,
            batch_size: None,
            text: TextOptions::default(),
        })
    }

    /// Index on the tokens of one or more text columns
    pub fn text(schema: Schema, options: TextOptions) -> IndexResult<Self> {
        if schema.is_empty() {
            return Err(IndexError::InvalidDescriptor(
                "text index needs at least one text column".into(),
            ));
        }
        if let Some(col) = schema.iter().find(|c| !c.scalar_type.is_textual()) {
            return Err(IndexError::UnsupportedType {
                column: col.name.clone(),
                scalar_type: col.scalar_type,
            });
        }
        Ok(Self {
            kind: IndexKind::Text,
            schema,
            unique: false,
            batch_size: None,
            text: options,
        })
    }

    /// Builds a descriptor from its request form
    pub fn from_parts(
        kind: IndexKind,
        schema: Schema,
        unique: bool,
        text: TextOptions,
    ) -> IndexResult<Self> {
        match kind {
            IndexKind::RowId => Ok(Self::row_id()),
            IndexKind::Record => Self::record(schema, unique),
            IndexKind::Text => Self::text(schema, text),
            IndexKind::Location => Err(IndexError::InvalidDescriptor(
                "location index is maintained implicitly".into(),
            )),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn batch_size(&self) -> Option<usize> {
        self.batch_size
    }

    pub fn text_options(&self) -> &TextOptions {
        &self.text
    }

    /// Key column names in key order
    pub fn column_names(&self) -> Vec<&str> {
        match self.kind {
            IndexKind::RowId => vec![RID_COLUMN_NAME],
            _ => self.schema.names(),
        }
    }

    /// Content-index prefix; also the key of the index-exists marker
    pub fn prefix(&self, db: &str, table: &str) -> String {
        build_prefix(self.kind, db, table, &self.column_names())
    }

    /// Checks every key column against the table schema
    pub fn validate(&self, data_schema: &Schema) -> IndexResult<()> {
        for col in self.schema.iter().filter(|c| !c.is_row_id()) {
            let Some(data_col) = data_schema.column_at(col.idx) else {
                return Err(IndexError::ColumnMismatch {
                    column: col.name.clone(),
                    reason: format!("no column with index {} in table schema", col.idx),
                });
            };
            if data_col.scalar_type != col.scalar_type {
                return Err(IndexError::ColumnMismatch {
                    column: col.name.clone(),
                    reason: format!(
                        "declared {} but table column is {}",
                        col.scalar_type, data_col.scalar_type
                    ),
                });
            }
        }
        Ok(())
    }
}
