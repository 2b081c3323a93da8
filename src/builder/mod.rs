/// Fluent query vocabulary shared by both backends.
///
/// Table handles implement [`QueryBuilder`] by exposing their intent; every
/// chaining method below only mutates that intent and never performs I/O.
/// Mistakes (bad identifiers, unknown operators, `and` before `filter`) are
/// recorded and raised by the next terminal call.
pub mod intent;
pub mod on_clause;
pub mod operand;

pub use intent::{AlterTarget, Conditions, Connector, JoinSpec, JoinType, QueryIntent, Selection};
pub use on_clause::OnClause;
pub use operand::{col, CompareOp, Operand, Predicate, Test};

use crate::types::Value;
use crate::validator::{validate_column_ref, validate_identifier};

pub trait QueryBuilder {
    fn intent_mut(&mut self) -> &mut QueryIntent;

    /// Restricts the result to the given columns; no columns means all.
    fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let intent = self.intent_mut();
        for c in &columns {
            intent.record(validate_column_ref(c));
        }
        intent.selection = if columns.is_empty() {
            Selection::All
        } else {
            Selection::Columns(columns)
        };
        self
    }

    fn select_all(&mut self) -> &mut Self {
        self.intent_mut().selection = Selection::All;
        self
    }

    /// `filter("job", "rat")`, `filter("job", ["chemist", "rat"])`,
    /// `filter("job", Value::Null)`.
    fn filter(&mut self, column: &str, rhs: impl Into<Operand>) -> &mut Self {
        self.intent_mut().push_predicate(None, column, None, rhs.into());
        self
    }

    /// `filter_op("age", ">=", 30)`.
    fn filter_op(&mut self, column: &str, op: &str, rhs: impl Into<Operand>) -> &mut Self {
        self.intent_mut()
            .push_predicate(None, column, Some(op), rhs.into());
        self
    }

    fn and(&mut self, column: &str, rhs: impl Into<Operand>) -> &mut Self {
        self.intent_mut()
            .push_predicate(Some(Connector::And), column, None, rhs.into());
        self
    }

    fn and_op(&mut self, column: &str, op: &str, rhs: impl Into<Operand>) -> &mut Self {
        self.intent_mut()
            .push_predicate(Some(Connector::And), column, Some(op), rhs.into());
        self
    }

    fn or(&mut self, column: &str, rhs: impl Into<Operand>) -> &mut Self {
        self.intent_mut()
            .push_predicate(Some(Connector::Or), column, None, rhs.into());
        self
    }

    fn or_op(&mut self, column: &str, op: &str, rhs: impl Into<Operand>) -> &mut Self {
        self.intent_mut()
            .push_predicate(Some(Connector::Or), column, Some(op), rhs.into());
        self
    }

    fn join<F>(&mut self, join_type: JoinType, table: &str, build: F) -> &mut Self
    where
        F: FnOnce(OnClause) -> OnClause,
    {
        let intent = self.intent_mut();
        if intent.record(validate_identifier(table)).is_none() {
            return self;
        }
        if let Some(on) = intent.record(build(OnClause::new()).finish()) {
            intent.join = Some(JoinSpec {
                join_type,
                table: table.to_string(),
                on,
            });
        }
        self
    }

    fn inner_join<F>(&mut self, table: &str, build: F) -> &mut Self
    where
        F: FnOnce(OnClause) -> OnClause,
    {
        self.join(JoinType::Inner, table, build)
    }

    fn left_join<F>(&mut self, table: &str, build: F) -> &mut Self
    where
        F: FnOnce(OnClause) -> OnClause,
    {
        self.join(JoinType::Left, table, build)
    }

    fn right_join<F>(&mut self, table: &str, build: F) -> &mut Self
    where
        F: FnOnce(OnClause) -> OnClause,
    {
        self.join(JoinType::Right, table, build)
    }

    /// Inline form: `inner_join_on("orders", "users.id", col("orders.user_id"))`.
    fn inner_join_on(&mut self, table: &str, left: &str, rhs: impl Into<Operand>) -> &mut Self {
        let rhs = rhs.into();
        self.join(JoinType::Inner, table, |j| j.on(left, rhs))
    }

    fn left_join_on(&mut self, table: &str, left: &str, rhs: impl Into<Operand>) -> &mut Self {
        let rhs = rhs.into();
        self.join(JoinType::Left, table, |j| j.on(left, rhs))
    }

    fn right_join_on(&mut self, table: &str, left: &str, rhs: impl Into<Operand>) -> &mut Self {
        let rhs = rhs.into();
        self.join(JoinType::Right, table, |j| j.on(left, rhs))
    }

    fn order_by<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let intent = self.intent_mut();
        for c in columns {
            let c = c.into();
            if intent.record(validate_column_ref(&c)).is_some() {
                intent.order_by.push(c);
            }
        }
        self
    }

    fn desc(&mut self) -> &mut Self {
        self.intent_mut().descending = true;
        self
    }

    fn limit(&mut self, n: usize) -> &mut Self {
        self.intent_mut().limit = Some(n);
        self
    }

    fn returning<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let intent = self.intent_mut();
        for c in columns {
            let c = c.into();
            if intent.record(validate_identifier(&c)).is_some() {
                intent.returning.push(c);
            }
        }
        self
    }

    /// Marks columns for `add_columns` / `remove_columns`.
    fn alter<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let intent = self.intent_mut();
        for c in columns {
            let name = c.into();
            if intent.record(validate_identifier(&name)).is_some() {
                intent.alter_targets.push(AlterTarget { name, default: None });
            }
        }
        self
    }

    /// Marks a column to add, padding existing rows with `default`.
    fn alter_with_default(&mut self, column: &str, default: impl Into<Value>) -> &mut Self {
        let intent = self.intent_mut();
        if intent.record(validate_identifier(column)).is_some() {
            intent.alter_targets.push(AlterTarget {
                name: column.to_string(),
                default: Some(default.into()),
            });
        }
        self
    }
}
