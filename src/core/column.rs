use super::data_type::TypeFamily;
use super::value::Value;

/// Snapshot of one column's metadata, fetched fresh per operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub sql_type: String,
    pub nullable: bool,
    /// Parsed default. `has_default` stays true for defaults that are
    /// expressions (sequences, `now()`) and have no literal value.
    pub default_value: Option<Value>,
    pub has_default: bool,
    pub is_primary_key: bool,
}

impl ColumnDescriptor {
    /// Column as the file backend sees it: text, nullable, optional default.
    #[must_use]
    pub fn text(name: impl Into<String>, default_value: Option<Value>) -> Self {
        Self {
            name: name.into(),
            sql_type: "text".to_string(),
            nullable: true,
            has_default: default_value.is_some(),
            default_value,
            is_primary_key: false,
        }
    }

    /// Non-nullable and no default: must be supplied on insert.
    #[must_use]
    pub const fn is_mandatory(&self) -> bool {
        !self.nullable && !self.has_default
    }

    #[must_use]
    pub fn family(&self) -> TypeFamily {
        TypeFamily::of_catalog_type(&self.sql_type)
    }
}

/// Helpers over a fetched schema.
pub trait Schema {
    fn column(&self, name: &str) -> Option<&ColumnDescriptor>;
    fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
    fn primary_keys(&self) -> Vec<&ColumnDescriptor>;
}

impl Schema for [ColumnDescriptor] {
    fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.iter().find(|c| c.name == name)
    }

    fn primary_keys(&self) -> Vec<&ColumnDescriptor> {
        self.iter().filter(|c| c.is_primary_key).collect()
    }
}
