/// Condition evaluation for filters and join conditions
///
/// Predicates are combined the way SQL combines the same clause text:
/// AND binds tighter than OR, so `a OR b AND c` is `a OR (b AND c)`.
/// A comparison involving NULL is never true.

use std::collections::HashSet;

use crate::builder::{Conditions, Connector, Predicate, Test};
use crate::parser::split_qualified;
use crate::types::{DatabaseError, Row, Value};

pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Evaluate a whole condition list against a row. No conditions match
    /// every row.
    #[must_use]
    pub fn evaluate(conditions: &Conditions, row: &Row) -> bool {
        if conditions.is_empty() {
            return true;
        }
        let mut any_group = false;
        let mut group = true;
        for (i, (connector, predicate)) in conditions.iter().enumerate() {
            if i > 0 && *connector == Connector::Or {
                any_group |= group;
                group = true;
            }
            group = group && Self::evaluate_predicate(predicate, row);
        }
        any_group || group
    }

    #[must_use]
    pub fn evaluate_predicate(predicate: &Predicate, row: &Row) -> bool {
        let value = lookup(row, &predicate.column);
        match &predicate.test {
            Test::Compare(op, expected) => value
                .and_then(|v| v.compare(expected))
                .is_some_and(|ordering| op.matches(ordering)),
            Test::CompareColumn(op, other) => match (value, lookup(row, other)) {
                (Some(a), Some(b)) => a.compare(b).is_some_and(|ordering| op.matches(ordering)),
                _ => false,
            },
            Test::In(values) => value.is_some_and(|v| values.iter().any(|e| v.loose_eq(e))),
            Test::IsNull => value.is_none_or(Value::is_null),
            Test::IsNotNull => value.is_some_and(|v| !v.is_null()),
        }
    }
}

/// Column names a statement over one table, or one joined pair, may use:
/// every key of the working rows, plus `table.column` for each column a
/// table contributes. Qualifiers naming any other table do not resolve.
#[derive(Debug, Clone, Default)]
pub struct ColumnScope {
    names: HashSet<String>,
}

impl ColumnScope {
    #[must_use]
    pub fn single(table: &str, header: &[String]) -> Self {
        let mut scope = Self::default();
        scope.add_table(table, header.iter().map(|c| (c.as_str(), c.as_str())));
        scope
    }

    /// Registers `table`'s columns as `(name in the file, key in the row)`.
    pub fn add_table<'a, I>(&mut self, table: &str, columns: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (original, key) in columns {
            self.names.insert(key.to_string());
            self.names.insert(format!("{table}.{original}"));
        }
    }

    #[must_use]
    pub fn resolves(&self, column: &str) -> bool {
        self.names.contains(column)
    }

    /// Fails with `UnknownColumn` for the first column out of scope.
    pub fn check<'a, I>(&self, columns: I) -> Result<(), DatabaseError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for column in columns {
            if !self.resolves(column) {
                return Err(DatabaseError::UnknownColumn(column.to_string()));
            }
        }
        Ok(())
    }
}

/// Finds a column in a (possibly joined) row. `t.c` matches a key stored
/// under its qualified name first, then the bare column name.
#[must_use]
pub fn lookup<'a>(row: &'a Row, column: &str) -> Option<&'a Value> {
    row.get(column).or_else(|| match split_qualified(column) {
        (Some(_), bare) => row.get(bare),
        (None, _) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{col, Operand, QueryIntent};

    fn person() -> Row {
        Row::new()
            .with("name", "Micah")
            .with("job", "rat")
            .with("age", "29")
            .with("salary", Value::Null)
    }

    fn conditions(build: impl FnOnce(&mut QueryIntent)) -> Conditions {
        let mut intent = QueryIntent::default();
        build(&mut intent);
        intent.into_checked().unwrap().predicates
    }

    #[test]
    fn test_equals_and_numeric_text() {
        let c = conditions(|i| i.push_predicate(None, "age", None, Operand::from(29)));
        assert!(ConditionEvaluator::evaluate(&c, &person()));
        let c = conditions(|i| i.push_predicate(None, "age", Some(">"), Operand::from(100)));
        assert!(!ConditionEvaluator::evaluate(&c, &person()));
        // "29" < "100" numerically even though it sorts after as text
        let c = conditions(|i| i.push_predicate(None, "age", Some("<"), Operand::from("100")));
        assert!(ConditionEvaluator::evaluate(&c, &person()));
    }

    #[test]
    fn test_in_list_and_null_tests() {
        let c = conditions(|i| i.push_predicate(None, "job", None, Operand::from(["chemist", "rat"])));
        assert!(ConditionEvaluator::evaluate(&c, &person()));

        let c = conditions(|i| i.push_predicate(None, "salary", None, Operand::Null));
        assert!(ConditionEvaluator::evaluate(&c, &person()));
        let c = conditions(|i| i.push_predicate(None, "salary", Some("!="), Operand::Null));
        assert!(!ConditionEvaluator::evaluate(&c, &person()));
    }

    #[test]
    fn test_null_never_compares() {
        let c = conditions(|i| i.push_predicate(None, "salary", Some("!="), Operand::from(5)));
        assert!(!ConditionEvaluator::evaluate(&c, &person()));
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        // name = 'Jesse' OR job = 'rat' AND age > 30  ->  false OR (true AND false)
        let c = conditions(|i| {
            i.push_predicate(None, "name", None, Operand::from("Jesse"));
            i.push_predicate(Some(Connector::Or), "job", None, Operand::from("rat"));
            i.push_predicate(Some(Connector::And), "age", Some(">"), Operand::from(30));
        });
        assert!(!ConditionEvaluator::evaluate(&c, &person()));

        // name = 'Micah' OR job = 'chemist' AND age > 30  ->  true OR (...)
        let c = conditions(|i| {
            i.push_predicate(None, "name", None, Operand::from("Micah"));
            i.push_predicate(Some(Connector::Or), "job", None, Operand::from("chemist"));
            i.push_predicate(Some(Connector::And), "age", Some(">"), Operand::from(30));
        });
        assert!(ConditionEvaluator::evaluate(&c, &person()));
    }

    #[test]
    fn test_qualified_lookup_and_column_operand() {
        let joined = Row::new()
            .with("id", "1")
            .with("name", "Micah")
            .with("orders.id", "7")
            .with("user_id", "1");
        assert_eq!(lookup(&joined, "users.id"), Some(&Value::from("1")));
        assert_eq!(lookup(&joined, "orders.id"), Some(&Value::from("7")));

        let c = conditions(|i| i.push_predicate(None, "users.id", None, col("orders.user_id")));
        assert!(ConditionEvaluator::evaluate(&c, &joined));
    }

    #[test]
    fn test_scope_of_single_table() {
        let header = vec!["name".to_string(), "age".to_string()];
        let scope = ColumnScope::single("people", &header);
        assert!(scope.check(["name", "people.age"]).is_ok());
        assert!(matches!(
            scope.check(["salary"]),
            Err(DatabaseError::UnknownColumn(c)) if c == "salary"
        ));
        assert!(matches!(
            scope.check(["nosuchtable.name"]),
            Err(DatabaseError::UnknownColumn(c)) if c == "nosuchtable.name"
        ));
    }

    #[test]
    fn test_scope_of_joined_tables() {
        let mut scope = ColumnScope::single("users", &["id".to_string(), "name".to_string()]);
        scope.add_table("orders", [("id", "orders.id"), ("user_id", "user_id")]);

        assert!(scope.check(["users.id", "orders.id", "orders.user_id", "user_id", "name"]).is_ok());
        assert!(!scope.resolves("orders.name"));
        assert!(!scope.resolves("users.user_id"));
    }
}
