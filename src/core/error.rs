use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),
    #[error("Invalid predicate: {0}")]
    InvalidPredicateShape(String),
    #[error("Unknown column '{0}'")]
    UnknownColumn(String),
    #[error("Missing mandatory column '{0}'")]
    MissingMandatoryColumn(String),
    #[error("Column '{0}' already exists")]
    DuplicateColumn(String),
    #[error("Column '{0}' not found")]
    ColumnNotFound(String),
    #[error("Unsupported type '{0}'")]
    UnsupportedType(String),
    #[error("Invalid column definition for '{column}': {reason}")]
    InvalidColumnSpec { column: String, reason: String },
    #[error("Column '{column}' of type {from} cannot be converted to {to}")]
    IllegalTypeConversion {
        column: String,
        from: String,
        to: String,
    },
    #[error("Precision {0} out of range (0..=100)")]
    PrecisionOutOfRange(u32),
    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),
    #[error("Table '{0}' not found")]
    TableNotFound(String),
    #[error("Call order violation: {0}")]
    CallOrderViolation(String),
    #[error("No values given for {0}")]
    NoValues(&'static str),
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Malformed file '{path}': {reason}")]
    MalformedFile { path: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

impl DatabaseError {
    /// True for errors raised by validation before any I/O took place.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(
            self,
            Self::Connection(_)
                | Self::Backend(_)
                | Self::MalformedFile { .. }
                | Self::Io(_)
                | Self::Serialization(_)
                | Self::Config(_)
        )
    }
}

// Builder errors are recorded in the intent and re-raised later, so the
// error type needs to be cloneable for the non-I/O kinds.
impl Clone for DatabaseError {
    fn clone(&self) -> Self {
        match self {
            Self::InvalidIdentifier(s) => Self::InvalidIdentifier(s.clone()),
            Self::InvalidPredicateShape(s) => Self::InvalidPredicateShape(s.clone()),
            Self::UnknownColumn(s) => Self::UnknownColumn(s.clone()),
            Self::MissingMandatoryColumn(s) => Self::MissingMandatoryColumn(s.clone()),
            Self::DuplicateColumn(s) => Self::DuplicateColumn(s.clone()),
            Self::ColumnNotFound(s) => Self::ColumnNotFound(s.clone()),
            Self::UnsupportedType(s) => Self::UnsupportedType(s.clone()),
            Self::InvalidColumnSpec { column, reason } => Self::InvalidColumnSpec {
                column: column.clone(),
                reason: reason.clone(),
            },
            Self::IllegalTypeConversion { column, from, to } => Self::IllegalTypeConversion {
                column: column.clone(),
                from: from.clone(),
                to: to.clone(),
            },
            Self::PrecisionOutOfRange(p) => Self::PrecisionOutOfRange(*p),
            Self::TableAlreadyExists(s) => Self::TableAlreadyExists(s.clone()),
            Self::TableNotFound(s) => Self::TableNotFound(s.clone()),
            Self::CallOrderViolation(s) => Self::CallOrderViolation(s.clone()),
            Self::NoValues(s) => Self::NoValues(s),
            Self::TypeMismatch(s) => Self::TypeMismatch(s.clone()),
            Self::Connection(s) => Self::Connection(s.clone()),
            Self::Backend(s) => Self::Backend(s.clone()),
            Self::MalformedFile { path, reason } => Self::MalformedFile {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), e.to_string())),
            Self::Serialization(e) => Self::Backend(e.to_string()),
            Self::Config(e) => Self::Backend(e.to_string()),
        }
    }
}
