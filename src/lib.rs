// fluentdb - fluent, schema-aware query builder over PostgreSQL and flat files
// One chained vocabulary, two backends: SQL through a connection pool,
// delimited text files through read-modify-rewrite

// Clippy configuration - allow non-critical warnings
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::future_not_send)]
#![allow(clippy::multiple_crate_versions)]

// Values, rows, column metadata, errors
pub mod core;

// Short path for the core types used across modules
pub mod types {
    pub use crate::core::*;
}

// nom parsers (identifiers, catalog default expressions)
pub mod parser;

// Identifier, type and precision rules
pub mod validator;

// Fluent vocabulary and the captured intent
pub mod builder;

// SQL and flat-file executors, aggregates
pub mod executor;

// Connection scopes and pinned transactions
pub mod transaction;

// Delimited text codec and table files
pub mod storage;

// Store handles and configuration
pub mod store;
pub mod config;

// Re-export commonly used types for convenience
pub use crate::core::{ColumnDescriptor, ColumnSpec, DatabaseError, Row, Value};
pub use builder::{col, JoinType, OnClause, Operand, QueryBuilder};
pub use executor::{Aggregate, CsvTable, Executable, SqlTable, Statement};
pub use transaction::{Connection, ConnectionPool};
pub use store::{CsvStore, SqlStore};
pub use crate::config::StoreConfig;
