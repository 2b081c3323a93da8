use crate::types::{DatabaseError, Value};
use super::operand::{Operand, Predicate};

/// How a predicate attaches to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Predicates in registration order. The connector of the first entry is
/// never rendered.
pub type Conditions = Vec<(Connector, Predicate)>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// `select` was never called.
    #[default]
    NotSelected,
    All,
    Columns(Vec<String>),
}

impl Selection {
    #[must_use]
    pub fn columns(&self) -> &[String] {
        match self {
            Self::Columns(cols) => cols,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl JoinType {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    pub join_type: JoinType,
    pub table: String,
    pub on: Conditions,
}

/// Column marked by `alter`, with the default used to pad existing rows.
#[derive(Debug, Clone, PartialEq)]
pub struct AlterTarget {
    pub name: String,
    pub default: Option<Value>,
}

/// The accumulated, not yet executed description of an operation.
///
/// Chained builder calls only mutate this record; the first invalid call
/// is kept in `error` and reported by the next terminal call before any
/// I/O happens.
#[derive(Debug, Clone, Default)]
pub struct QueryIntent {
    pub selection: Selection,
    pub predicates: Conditions,
    pub join: Option<JoinSpec>,
    pub order_by: Vec<String>,
    pub descending: bool,
    pub limit: Option<usize>,
    pub returning: Vec<String>,
    pub alter_targets: Vec<AlterTarget>,
    pub error: Option<DatabaseError>,
}

impl QueryIntent {
    /// Keeps the first error only, later ones are usually consequences.
    pub fn record_error(&mut self, error: DatabaseError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub fn record<T>(&mut self, result: Result<T, DatabaseError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.record_error(e);
                None
            }
        }
    }

    /// Appends a predicate. `and`/`or` require an earlier `filter`.
    pub fn push_predicate(
        &mut self,
        connector: Option<Connector>,
        column: &str,
        op: Option<&str>,
        rhs: Operand,
    ) {
        if let Some(connector) = connector {
            if self.predicates.is_empty() {
                self.record_error(DatabaseError::CallOrderViolation(format!(
                    "{}() requires a preceding filter()",
                    connector.as_sql().to_lowercase()
                )));
                return;
            }
        }
        if let Some(predicate) = self.record(Predicate::build(column, op, rhs)) {
            self.predicates
                .push((connector.unwrap_or(Connector::And), predicate));
        }
    }

    /// Surfaces the recorded builder error, if any.
    pub fn into_checked(mut self) -> Result<Self, DatabaseError> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }

    #[must_use]
    pub fn has_join(&self) -> bool {
        self.join.is_some()
    }

    /// All columns named anywhere in the read side of the intent.
    pub fn referenced_columns(&self) -> impl Iterator<Item = &str> {
        self.selection
            .columns()
            .iter()
            .map(String::as_str)
            .chain(self.predicates.iter().flat_map(|(_, p)| p.columns()))
            .chain(self.order_by.iter().map(String::as_str))
    }
}
