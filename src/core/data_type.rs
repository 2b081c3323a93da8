use super::value::Value;

/// Coarse grouping used by the conversion rules of `modify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    Numeric,
    Text,
    DateTime,
    Boolean,
    Other,
}

impl TypeFamily {
    /// Classifies a type name as reported by `information_schema.columns`.
    #[must_use]
    pub fn of_catalog_type(sql_type: &str) -> Self {
        let lower = sql_type.trim().to_ascii_lowercase();
        match lower.as_str() {
            "smallint" | "integer" | "bigint" | "int" | "int2" | "int4" | "int8" | "numeric"
            | "decimal" | "real" | "double precision" | "float4" | "float8" | "serial"
            | "bigserial" | "smallserial" => Self::Numeric,
            "text" | "character varying" | "varchar" | "character" | "char" | "bpchar" => {
                Self::Text
            }
            "boolean" | "bool" => Self::Boolean,
            _ if lower.starts_with("timestamp")
                || lower.starts_with("time")
                || lower == "date"
                || lower == "interval" =>
            {
                Self::DateTime
            }
            _ if lower.starts_with("numeric") || lower.starts_with("decimal") => Self::Numeric,
            _ if lower.starts_with("character") || lower.starts_with("varchar") => Self::Text,
            _ => Self::Other,
        }
    }
}

/// Parameters a logical type may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeParam {
    Length,
    Precision,
    Scale,
}

impl TypeParam {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::Precision => "precision",
            Self::Scale => "scale",
        }
    }
}

/// One entry of the logical type table: name, required parameters, family
/// and the function rendering the backend type.
pub struct LogicalType {
    pub name: &'static str,
    pub required: &'static [TypeParam],
    pub family: TypeFamily,
    pub primary_key: bool,
    render: fn(&ColumnSpec) -> String,
}

impl LogicalType {
    /// Renders the PostgreSQL type. Callers validate the spec first, so
    /// missing parameters fall back to zero here.
    #[must_use]
    pub fn render(&self, spec: &ColumnSpec) -> String {
        (self.render)(spec)
    }

    #[must_use]
    pub fn lookup(name: &str) -> Option<&'static Self> {
        LOGICAL_TYPES
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Debug for LogicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogicalType")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("family", &self.family)
            .finish_non_exhaustive()
    }
}

pub static LOGICAL_TYPES: &[LogicalType] = &[
    LogicalType {
        name: "string",
        required: &[TypeParam::Length],
        family: TypeFamily::Text,
        primary_key: false,
        render: |spec| format!("VARCHAR({})", spec.length.unwrap_or(0)),
    },
    LogicalType {
        name: "int",
        required: &[],
        family: TypeFamily::Numeric,
        primary_key: false,
        render: |_| "INTEGER".to_string(),
    },
    LogicalType {
        name: "float",
        required: &[TypeParam::Precision, TypeParam::Scale],
        family: TypeFamily::Numeric,
        primary_key: false,
        render: |spec| {
            format!(
                "NUMERIC({}, {})",
                spec.precision.unwrap_or(0),
                spec.scale.unwrap_or(0)
            )
        },
    },
    LogicalType {
        name: "date",
        required: &[],
        family: TypeFamily::DateTime,
        primary_key: false,
        render: |_| "DATE".to_string(),
    },
    LogicalType {
        name: "time",
        required: &[],
        family: TypeFamily::DateTime,
        primary_key: false,
        render: |_| "TIME".to_string(),
    },
    LogicalType {
        name: "timestamp",
        required: &[],
        family: TypeFamily::DateTime,
        primary_key: false,
        render: |_| "TIMESTAMP".to_string(),
    },
    LogicalType {
        name: "pk",
        required: &[],
        family: TypeFamily::Numeric,
        primary_key: true,
        render: |_| "SERIAL".to_string(),
    },
];

/// Column definition passed to `add`, `modify` and `create`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub type_name: String,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub nullable: bool,
    pub default: Option<Value>,
}

impl ColumnSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            length: None,
            precision: None,
            scale: None,
            nullable: true,
            default: None,
        }
    }

    #[must_use]
    pub const fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    #[must_use]
    pub const fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub const fn param(&self, param: TypeParam) -> Option<u32> {
        match param {
            TypeParam::Length => self.length,
            TypeParam::Precision => self.precision,
            TypeParam::Scale => self.scale,
        }
    }
}
