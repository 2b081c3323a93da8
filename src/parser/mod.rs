// Parsing helpers built on nom:
// - common: identifiers and qualified column references
// - defaults: catalog default expressions
pub mod common;
pub mod defaults;

pub use common::{identifier, is_identifier, is_qualified_identifier, qualified_identifier, split_qualified};
pub use defaults::DefaultExpr;
