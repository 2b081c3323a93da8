use crate::types::DatabaseError;
use super::intent::{Conditions, Connector};
use super::operand::{Operand, Predicate};

/// Join condition builder handed to the `*_join` callbacks.
///
/// ```ignore
/// users.inner_join("orders", |j| {
///     j.on("users.id", col("orders.user_id"))
///         .on_or("orders.status", "open")
/// });
/// ```
#[derive(Debug, Default)]
pub struct OnClause {
    conditions: Conditions,
    error: Option<DatabaseError>,
}

impl OnClause {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on(self, left: &str, rhs: impl Into<Operand>) -> Self {
        self.push(None, left, None, rhs.into())
    }

    #[must_use]
    pub fn on_op(self, left: &str, op: &str, rhs: impl Into<Operand>) -> Self {
        self.push(None, left, Some(op), rhs.into())
    }

    #[must_use]
    pub fn on_and(self, left: &str, rhs: impl Into<Operand>) -> Self {
        self.push(Some(Connector::And), left, None, rhs.into())
    }

    #[must_use]
    pub fn on_and_op(self, left: &str, op: &str, rhs: impl Into<Operand>) -> Self {
        self.push(Some(Connector::And), left, Some(op), rhs.into())
    }

    #[must_use]
    pub fn on_or(self, left: &str, rhs: impl Into<Operand>) -> Self {
        self.push(Some(Connector::Or), left, None, rhs.into())
    }

    #[must_use]
    pub fn on_or_op(self, left: &str, op: &str, rhs: impl Into<Operand>) -> Self {
        self.push(Some(Connector::Or), left, Some(op), rhs.into())
    }

    // A repeated `on` joins the previous conditions with AND.
    fn push(
        mut self,
        connector: Option<Connector>,
        left: &str,
        op: Option<&str>,
        rhs: Operand,
    ) -> Self {
        if self.error.is_some() {
            return self;
        }
        if let Some(connector) = connector {
            if self.conditions.is_empty() {
                self.error = Some(DatabaseError::CallOrderViolation(format!(
                    "on_{}() requires a preceding on()",
                    connector.as_sql().to_lowercase()
                )));
                return self;
            }
        }
        match Predicate::build(left, op, rhs) {
            Ok(predicate) => self
                .conditions
                .push((connector.unwrap_or(Connector::And), predicate)),
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Consumes the builder; a join without any condition is rejected.
    pub fn finish(self) -> Result<Conditions, DatabaseError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if self.conditions.is_empty() {
            return Err(DatabaseError::CallOrderViolation(
                "join requires at least one on() condition".to_string(),
            ));
        }
        Ok(self.conditions)
    }
}
