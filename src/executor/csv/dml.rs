/// DML and DDL on table files
///
/// Inserts append; everything else reads the whole file, changes it in
/// memory and writes it back.

use std::collections::HashSet;

use tracing::info;

use crate::builder::{AlterTarget, QueryIntent};
use crate::storage::CsvData;
use crate::types::{DatabaseError, Row, Value};
use crate::validator::validate_identifiers;
use super::catalog::CsvCatalog;
use super::conditions::{ColumnScope, ConditionEvaluator};
use super::queries::QueryExecutor;

pub struct DmlExecutor;

impl DmlExecutor {
    /// Appends rows. Omitted columns take the tracked default, or stay empty.
    pub async fn insert(
        catalog: &CsvCatalog,
        table: &str,
        rows: &[Row],
        returning: &[String],
    ) -> Result<Vec<Row>, DatabaseError> {
        if rows.is_empty() {
            return Err(DatabaseError::NoValues("insert"));
        }
        let file = catalog.file(table)?;
        let data = file.read().await?;
        Self::check_targets(&data, rows.iter().flat_map(Row::columns))?;
        ColumnScope::single(table, &data.header).check(returning.iter().map(String::as_str))?;

        let defaults = catalog.defaults(table).await;
        let completed: Vec<Row> = rows
            .iter()
            .map(|row| {
                data.header
                    .iter()
                    .map(|column| {
                        let value = row
                            .get(column)
                            .or_else(|| defaults.get(column))
                            .cloned()
                            .unwrap_or(Value::Null);
                        (column.clone(), value)
                    })
                    .collect()
            })
            .collect();

        let appended = CsvData {
            header: data.header,
            rows: completed,
        };
        file.append(&appended).await?;
        Ok(Self::returned(&appended.rows, returning))
    }

    /// Sets `values` on every matching row.
    pub async fn update(
        catalog: &CsvCatalog,
        table: &str,
        values: &Row,
        intent: &QueryIntent,
    ) -> Result<Vec<Row>, DatabaseError> {
        if values.is_empty() {
            return Err(DatabaseError::NoValues("update"));
        }
        let file = catalog.file(table)?;
        let mut data = file.read().await?;
        Self::check_targets(&data, values.columns())?;
        Self::check_intent(table, &data, intent)?;

        let mut affected = Vec::new();
        for row in &mut data.rows {
            if ConditionEvaluator::evaluate(&intent.predicates, row) {
                for (column, value) in values.iter() {
                    row.set(column, value.clone());
                }
                affected.push(row.clone());
            }
        }

        file.write(&data).await?;
        Ok(Self::returned(&affected, &intent.returning))
    }

    /// Keeps only the rows that do not match.
    pub async fn delete(
        catalog: &CsvCatalog,
        table: &str,
        intent: &QueryIntent,
    ) -> Result<Vec<Row>, DatabaseError> {
        let file = catalog.file(table)?;
        let mut data = file.read().await?;
        Self::check_intent(table, &data, intent)?;

        let (removed, kept): (Vec<Row>, Vec<Row>) = std::mem::take(&mut data.rows)
            .into_iter()
            .partition(|row| ConditionEvaluator::evaluate(&intent.predicates, row));
        data.rows = kept;

        file.write(&data).await?;
        Ok(Self::returned(&removed, &intent.returning))
    }

    /// Adds the `alter` targets to the header, padding existing rows with
    /// each target's default.
    pub async fn add_columns(
        catalog: &CsvCatalog,
        table: &str,
        targets: &[AlterTarget],
    ) -> Result<(), DatabaseError> {
        if targets.is_empty() {
            return Err(DatabaseError::NoValues("add_columns, call alter() first"));
        }
        let file = catalog.file(table)?;
        let mut data = file.read().await?;

        let mut seen = HashSet::new();
        for target in targets {
            if data.has_column(&target.name) || !seen.insert(target.name.as_str()) {
                return Err(DatabaseError::DuplicateColumn(target.name.clone()));
            }
        }

        for target in targets {
            let pad = target.default.clone().unwrap_or(Value::Null);
            data.header.push(target.name.clone());
            for row in &mut data.rows {
                row.set(target.name.clone(), pad.clone());
            }
        }

        file.write(&data).await?;
        for target in targets {
            if let Some(default) = &target.default {
                catalog.set_default(table, &target.name, default.clone()).await;
            }
        }
        info!(table, columns = targets.len(), "added columns");
        Ok(())
    }

    pub async fn remove_columns(
        catalog: &CsvCatalog,
        table: &str,
        targets: &[AlterTarget],
    ) -> Result<(), DatabaseError> {
        if targets.is_empty() {
            return Err(DatabaseError::NoValues("remove_columns, call alter() first"));
        }
        let file = catalog.file(table)?;
        let mut data = file.read().await?;

        if let Some(missing) = targets.iter().find(|t| !data.has_column(&t.name)) {
            return Err(DatabaseError::ColumnNotFound(missing.name.clone()));
        }

        data.header
            .retain(|column| !targets.iter().any(|t| t.name == *column));
        for row in &mut data.rows {
            for target in targets {
                row.remove(&target.name);
            }
        }

        file.write(&data).await?;
        for target in targets {
            catalog.remove_default(table, &target.name).await;
        }
        info!(table, columns = targets.len(), "removed columns");
        Ok(())
    }

    /// Writes a header-only file.
    pub async fn create(
        catalog: &CsvCatalog,
        table: &str,
        columns: &[String],
    ) -> Result<(), DatabaseError> {
        if columns.is_empty() {
            return Err(DatabaseError::NoValues("create table"));
        }
        validate_identifiers(columns)?;
        let mut seen = HashSet::new();
        for column in columns {
            if !seen.insert(column.as_str()) {
                return Err(DatabaseError::DuplicateColumn(column.clone()));
            }
        }
        catalog.file(table)?.create(columns).await
    }

    pub async fn drop(catalog: &CsvCatalog, table: &str) -> Result<(), DatabaseError> {
        catalog.file(table)?.remove().await?;
        catalog.forget(table).await;
        Ok(())
    }

    /// Columns being written must be header names as they are, since rows
    /// are stored by exact key.
    fn check_targets<'a, I>(data: &CsvData, columns: I) -> Result<(), DatabaseError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for column in columns {
            if !data.has_column(column) {
                return Err(DatabaseError::UnknownColumn(column.to_string()));
            }
        }
        Ok(())
    }

    fn check_intent(table: &str, data: &CsvData, intent: &QueryIntent) -> Result<(), DatabaseError> {
        let scope = ColumnScope::single(table, &data.header);
        scope.check(intent.predicates.iter().flat_map(|(_, p)| p.columns()))?;
        scope.check(intent.returning.iter().map(String::as_str))
    }

    /// Affected rows projected to `returning`; nothing when it is empty.
    fn returned(rows: &[Row], returning: &[String]) -> Vec<Row> {
        if returning.is_empty() {
            return Vec::new();
        }
        rows.iter().map(|row| QueryExecutor::project(row, returning)).collect()
    }
}
