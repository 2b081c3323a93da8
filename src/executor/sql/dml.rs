/// DML (Data Manipulation Language) statements
///
/// INSERT (plus the ON CONFLICT upsert form), UPDATE and DELETE, validated
/// against a freshly fetched schema before anything is sent.

use crate::builder::QueryIntent;
use crate::types::{ColumnDescriptor, DatabaseError, Row, Schema};
use super::compiler::{returning_clause, where_clause};
use super::statement::{Params, Statement};

pub struct DmlCompiler;

impl DmlCompiler {
    /// INSERT, or upsert against the first primary key when `upsert` is set
    /// and the table has one.
    ///
    /// Validates:
    /// - every supplied column exists
    /// - every mandatory column carries a non-empty value
    pub fn insert(
        table: &str,
        schema: &[ColumnDescriptor],
        rows: &[Row],
        returning: &[String],
        upsert: bool,
    ) -> Result<Statement, DatabaseError> {
        if rows.is_empty() {
            return Err(DatabaseError::NoValues("insert"));
        }

        Self::validate_known_columns(schema, rows.iter().flat_map(Row::columns))?;

        let primary_keys = schema.primary_keys();
        let pk_supplied = rows.iter().any(|row| {
            primary_keys
                .iter()
                .any(|pk| row.get(&pk.name).is_some_and(|v| !v.is_null()))
        });

        for row in rows {
            Self::validate_mandatory(schema, row)?;
        }

        // Schema order, restricted to what the rows actually carry. Keys are
        // left to the backend unless the caller supplied one.
        let columns: Vec<&ColumnDescriptor> = schema
            .iter()
            .filter(|c| pk_supplied || !c.is_primary_key)
            .filter(|c| rows.iter().any(|row| row.contains(&c.name)))
            .collect();

        let mut params = Params::new();
        let mut clauses = Vec::with_capacity(4);

        if columns.is_empty() {
            if rows.len() > 1 {
                return Err(DatabaseError::NoValues("multi-row insert without columns"));
            }
            clauses.push(format!("INSERT INTO {table} DEFAULT VALUES"));
        } else {
            let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
            let tuples: Vec<String> = rows
                .iter()
                .map(|row| {
                    let values: Vec<String> = columns
                        .iter()
                        .map(|c| match row.get(&c.name) {
                            Some(v) => params.bind(v.clone()),
                            None => "DEFAULT".to_string(),
                        })
                        .collect();
                    format!("({})", values.join(", "))
                })
                .collect();
            clauses.push(format!(
                "INSERT INTO {table} ({}) VALUES {}",
                names.join(", "),
                tuples.join(", ")
            ));
        }

        if upsert {
            if let Some(conflict_key) = primary_keys.first() {
                clauses.push(Self::conflict_clause(schema, &conflict_key.name));
            }
        }

        clauses.push(returning_clause(returning));
        Ok(params.finish(&clauses))
    }

    fn conflict_clause(schema: &[ColumnDescriptor], conflict_key: &str) -> String {
        let updates: Vec<String> = schema
            .iter()
            .filter(|c| !c.is_primary_key)
            .map(|c| format!("{0} = EXCLUDED.{0}", c.name))
            .collect();
        if updates.is_empty() {
            format!("ON CONFLICT ({conflict_key}) DO NOTHING")
        } else {
            format!(
                "ON CONFLICT ({conflict_key}) DO UPDATE SET {}",
                updates.join(", ")
            )
        }
    }

    /// UPDATE ... SET from `values`, scoped by the intent's filter.
    pub fn update(
        table: &str,
        schema: &[ColumnDescriptor],
        values: &Row,
        intent: &QueryIntent,
    ) -> Result<Statement, DatabaseError> {
        if values.is_empty() {
            return Err(DatabaseError::NoValues("update"));
        }
        Self::validate_known_columns(schema, values.columns())?;

        let mut params = Params::new();
        let assignments: Vec<String> = values
            .iter()
            .map(|(column, value)| format!("{column} = {}", params.bind(value.clone())))
            .collect();

        let clauses = [
            format!("UPDATE {table} SET {}", assignments.join(", ")),
            where_clause(&intent.predicates, &mut params),
            returning_clause(&intent.returning),
        ];
        Ok(params.finish(&clauses))
    }

    #[must_use]
    pub fn delete(table: &str, intent: &QueryIntent) -> Statement {
        let mut params = Params::new();
        let clauses = [
            format!("DELETE FROM {table}"),
            where_clause(&intent.predicates, &mut params),
            returning_clause(&intent.returning),
        ];
        params.finish(&clauses)
    }

    fn validate_known_columns<'a, I>(schema: &[ColumnDescriptor], columns: I) -> Result<(), DatabaseError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for column in columns {
            if !schema.has_column(column) {
                return Err(DatabaseError::UnknownColumn(column.to_string()));
            }
        }
        Ok(())
    }

    // A key without a default is mandatory like any other column; keys the
    // backend generates carry a default and are skipped by `is_mandatory`.
    fn validate_mandatory(schema: &[ColumnDescriptor], row: &Row) -> Result<(), DatabaseError> {
        for column in schema.iter().filter(|c| c.is_mandatory()) {
            if !row.get(&column.name).is_some_and(crate::types::Value::is_truthy) {
                return Err(DatabaseError::MissingMandatoryColumn(column.name.clone()));
            }
        }
        Ok(())
    }
}
