// Module declarations
pub mod error;
pub mod value;
pub mod data_type;
pub mod column;
pub mod row;

// Re-exports for convenience
pub use error::DatabaseError;
pub use value::Value;
pub use data_type::{ColumnSpec, LogicalType, TypeFamily, TypeParam};
pub use column::{ColumnDescriptor, Schema};
pub use row::Row;
