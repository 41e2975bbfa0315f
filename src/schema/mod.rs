//! Schema catalog for aerotab
//!
//! Column descriptors are built from schema strings at query start and are
//! immutable afterwards. Three schemas travel with a request: the table
//! (data) schema, the projection (query) schema, and the index schema.

mod column;
mod errors;
mod types;
mod value;

pub use column::{ColumnDescriptor, Schema, PROJECT_ALL, RID_COLUMN_INDEX, RID_COLUMN_NAME};
pub use errors::{SchemaError, SchemaResult};
pub use types::ScalarType;
pub use value::{Value, DATE_FORMAT};
