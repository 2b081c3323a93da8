/// Clause compilation for the SQL backend.
///
/// Each clause renders to a string (empty when the intent does not use it)
/// and binds its values through [`Params`]. Clause order for SELECT:
/// select, join, on, where, order by, limit.

use crate::builder::{Conditions, JoinSpec, Predicate, QueryIntent, Selection, Test};
use super::statement::{Params, Statement};

pub fn select_clause(table: &str, selection: &Selection) -> String {
    match selection {
        Selection::Columns(cols) => format!("SELECT {} FROM {table}", cols.join(", ")),
        Selection::All | Selection::NotSelected => format!("SELECT * FROM {table}"),
    }
}

pub fn join_clause(join: Option<&JoinSpec>) -> String {
    join.map_or_else(String::new, |j| format!("{} {}", j.join_type.as_sql(), j.table))
}

pub fn on_clause(join: Option<&JoinSpec>, params: &mut Params) -> String {
    join.map_or_else(String::new, |j| {
        format!("ON {}", conditions(&j.on, params))
    })
}

pub fn where_clause(predicates: &Conditions, params: &mut Params) -> String {
    if predicates.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions(predicates, params))
    }
}

pub fn order_clause(order_by: &[String], descending: bool) -> String {
    if order_by.is_empty() {
        return String::new();
    }
    let suffix = if descending { " DESC" } else { "" };
    let cols: Vec<String> = order_by.iter().map(|c| format!("{c}{suffix}")).collect();
    format!("ORDER BY {}", cols.join(", "))
}

pub fn limit_clause(limit: Option<usize>) -> String {
    limit.map_or_else(String::new, |n| format!("LIMIT {n}"))
}

pub fn returning_clause(returning: &[String]) -> String {
    if returning.is_empty() {
        String::new()
    } else {
        format!("RETURNING {}", returning.join(", "))
    }
}

fn conditions(conditions: &Conditions, params: &mut Params) -> String {
    let mut sql = String::new();
    for (i, (connector, predicate)) in conditions.iter().enumerate() {
        if i > 0 {
            sql.push(' ');
            sql.push_str(connector.as_sql());
            sql.push(' ');
        }
        sql.push_str(&self::predicate(predicate, params));
    }
    sql
}

fn predicate(predicate: &Predicate, params: &mut Params) -> String {
    let column = &predicate.column;
    match &predicate.test {
        Test::Compare(op, value) => {
            format!("{column} {} {}", op.as_sql(), params.bind(value.clone()))
        }
        Test::CompareColumn(op, other) => format!("{column} {} {other}", op.as_sql()),
        Test::In(values) => {
            let placeholders: Vec<String> =
                values.iter().map(|v| params.bind(v.clone())).collect();
            format!("{column} IN ({})", placeholders.join(", "))
        }
        Test::IsNull => format!("{column} IS NULL"),
        Test::IsNotNull => format!("{column} IS NOT NULL"),
    }
}

/// Full SELECT for `get`, `first` and `last`.
#[must_use]
pub fn select(table: &str, intent: &QueryIntent) -> Statement {
    let mut params = Params::new();
    let join = intent.join.as_ref();
    let clauses = [
        select_clause(table, &intent.selection),
        join_clause(join),
        on_clause(join, &mut params),
        where_clause(&intent.predicates, &mut params),
        order_clause(&intent.order_by, intent.descending),
        limit_clause(intent.limit),
    ];
    params.finish(&clauses)
}

/// `SELECT <expr> AS <alias> FROM ...` honoring join and filter.
#[must_use]
pub fn aggregate(table: &str, expression: &str, alias: &str, intent: &QueryIntent) -> Statement {
    let mut params = Params::new();
    let join = intent.join.as_ref();
    let clauses = [
        format!("SELECT {expression} AS {alias} FROM {table}"),
        join_clause(join),
        on_clause(join, &mut params),
        where_clause(&intent.predicates, &mut params),
    ];
    params.finish(&clauses)
}
