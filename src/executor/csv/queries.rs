/// SELECT over table files
///
/// Pipeline: join (nested loop) → column check → filter → sort → reverse
/// for `desc()` → limit → project.

use std::cmp::Ordering;

use crate::builder::{JoinSpec, JoinType, QueryIntent, Selection};
use crate::types::{DatabaseError, Row, Value};
use super::catalog::CsvCatalog;
use super::conditions::{lookup, ColumnScope, ConditionEvaluator};

/// Rows that passed the filter, before projection, with the column names
/// they can be addressed by (both tables when a join is active).
#[derive(Debug)]
pub struct Selected {
    pub scope: ColumnScope,
    pub rows: Vec<Row>,
}

pub struct QueryExecutor;

impl QueryExecutor {
    /// Full `get()` pipeline.
    pub async fn select(
        catalog: &CsvCatalog,
        table: &str,
        intent: &QueryIntent,
    ) -> Result<Vec<Row>, DatabaseError> {
        let selected = Self::filter(catalog, table, intent).await?;
        let mut rows = selected.rows;

        if !intent.order_by.is_empty() {
            Self::sort(&mut rows, &intent.order_by);
        }
        if intent.descending {
            rows.reverse();
        }
        if let Some(limit) = intent.limit {
            rows.truncate(limit);
        }

        Ok(match &intent.selection {
            Selection::Columns(columns) => rows
                .iter()
                .map(|row| Self::project(row, columns))
                .collect(),
            Selection::All | Selection::NotSelected => rows,
        })
    }

    /// Join and filter only. Unknown columns anywhere in the intent fail
    /// here, before any row is evaluated.
    pub async fn filter(
        catalog: &CsvCatalog,
        table: &str,
        intent: &QueryIntent,
    ) -> Result<Selected, DatabaseError> {
        let data = catalog.file(table)?.read().await?;
        let (scope, rows) = match &intent.join {
            Some(join) => {
                let other = catalog.file(&join.table)?.read().await?;
                Self::join(table, data.header, data.rows, join, other.header, other.rows)?
            }
            None => (ColumnScope::single(table, &data.header), data.rows),
        };

        scope.check(intent.referenced_columns())?;

        let rows = rows
            .into_iter()
            .filter(|row| ConditionEvaluator::evaluate(&intent.predicates, row))
            .collect();
        Ok(Selected { scope, rows })
    }

    /// Nested-loop join. Left columns keep their names; right columns are
    /// renamed `other.col` only when the left side already has `col`.
    fn join(
        table: &str,
        left_header: Vec<String>,
        left_rows: Vec<Row>,
        join: &JoinSpec,
        right_header: Vec<String>,
        right_rows: Vec<Row>,
    ) -> Result<(ColumnScope, Vec<Row>), DatabaseError> {
        if join.table == table {
            return Err(DatabaseError::CallOrderViolation(format!(
                "cannot join table '{table}' with itself"
            )));
        }

        let right_names: Vec<String> = right_header
            .iter()
            .map(|c| {
                if left_header.contains(c) {
                    format!("{}.{c}", join.table)
                } else {
                    c.clone()
                }
            })
            .collect();

        let mut scope = ColumnScope::single(table, &left_header);
        scope.add_table(
            &join.table,
            right_header
                .iter()
                .map(String::as_str)
                .zip(right_names.iter().map(String::as_str)),
        );
        scope.check(join.on.iter().flat_map(|(_, p)| p.columns()))?;

        let width = left_header.len() + right_header.len();
        let merge = |left: Option<&Row>, right: Option<&Row>| -> Row {
            let mut row = Row::with_capacity(width);
            for column in &left_header {
                row.set(column.clone(), left.and_then(|r| r.get(column)).cloned().unwrap_or(Value::Null));
            }
            for (original, renamed) in right_header.iter().zip(&right_names) {
                row.set(renamed.clone(), right.and_then(|r| r.get(original)).cloned().unwrap_or(Value::Null));
            }
            row
        };

        let mut rows = Vec::new();
        match join.join_type {
            JoinType::Inner | JoinType::Left => {
                for left in &left_rows {
                    let before = rows.len();
                    for right in &right_rows {
                        let merged = merge(Some(left), Some(right));
                        if ConditionEvaluator::evaluate(&join.on, &merged) {
                            rows.push(merged);
                        }
                    }
                    if join.join_type == JoinType::Left && rows.len() == before {
                        rows.push(merge(Some(left), None));
                    }
                }
            }
            JoinType::Right => {
                for right in &right_rows {
                    let before = rows.len();
                    for left in &left_rows {
                        let merged = merge(Some(left), Some(right));
                        if ConditionEvaluator::evaluate(&join.on, &merged) {
                            rows.push(merged);
                        }
                    }
                    if rows.len() == before {
                        rows.push(merge(None, Some(right)));
                    }
                }
            }
        }

        Ok((scope, rows))
    }

    /// Stable sort on every order column in turn. NULLs sort after values.
    fn sort(rows: &mut [Row], order_by: &[String]) {
        rows.sort_by(|a, b| {
            order_by
                .iter()
                .map(|column| Self::compare_nullable(lookup(a, column), lookup(b, column)))
                .find(|ordering| *ordering != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }

    fn compare_nullable(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        let a = a.filter(|v| !v.is_null());
        let b = b.filter(|v| !v.is_null());
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.compare(b).unwrap_or(Ordering::Equal),
        }
    }

    /// Requested columns in the requested order, resolving qualified names.
    #[must_use]
    pub fn project(row: &Row, columns: &[String]) -> Row {
        columns
            .iter()
            .map(|c| (c.clone(), lookup(row, c).cloned().unwrap_or(Value::Null)))
            .collect()
    }
}
