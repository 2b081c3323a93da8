/// Live schema lookups against `information_schema`.
///
/// Nothing is cached: every operation that needs metadata asks the server
/// again, so DDL issued elsewhere is picked up on the next call.

use crate::parser::DefaultExpr;
use crate::transaction::Connection;
use crate::types::{ColumnDescriptor, DatabaseError, Row, Value};
use super::statement::{Params, Statement};

pub struct Catalog;

impl Catalog {
    #[must_use]
    pub fn columns_query(table: &str) -> Statement {
        let mut params = Params::new();
        let clauses = [
            "SELECT column_name, data_type, is_nullable, column_default \
             FROM information_schema.columns"
                .to_string(),
            format!(
                "WHERE table_schema = current_schema() AND table_name = {}",
                params.bind(Value::from(table))
            ),
            "ORDER BY ordinal_position".to_string(),
        ];
        params.finish(&clauses)
    }

    #[must_use]
    pub fn primary_keys_query(table: &str) -> Statement {
        let mut params = Params::new();
        let clauses = [
            "SELECT kcu.column_name FROM information_schema.table_constraints tc \
             JOIN information_schema.key_column_usage kcu \
             ON tc.constraint_name = kcu.constraint_name \
             AND tc.table_schema = kcu.table_schema"
                .to_string(),
            format!(
                "WHERE tc.constraint_type = 'PRIMARY KEY' \
                 AND tc.table_schema = current_schema() AND tc.table_name = {}",
                params.bind(Value::from(table))
            ),
            "ORDER BY kcu.ordinal_position".to_string(),
        ];
        params.finish(&clauses)
    }

    #[must_use]
    pub fn exists_query(table: &str) -> Statement {
        let mut params = Params::new();
        let clauses = [format!(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = {}) AS exists",
            params.bind(Value::from(table))
        )];
        params.finish(&clauses)
    }

    /// Column descriptors in ordinal order. A table without columns is
    /// reported as missing.
    pub async fn columns(
        conn: &mut dyn Connection,
        table: &str,
    ) -> Result<Vec<ColumnDescriptor>, DatabaseError> {
        let rows = conn.query(&Self::columns_query(table)).await?;
        if rows.is_empty() {
            return Err(DatabaseError::TableNotFound(table.to_string()));
        }
        let keys = Self::primary_keys(conn, table).await?;

        rows.iter()
            .map(|row| {
                let mut column = Self::descriptor(row)?;
                column.is_primary_key = keys.contains(&column.name);
                Ok(column)
            })
            .collect()
    }

    pub async fn primary_keys(
        conn: &mut dyn Connection,
        table: &str,
    ) -> Result<Vec<String>, DatabaseError> {
        let rows = conn.query(&Self::primary_keys_query(table)).await?;
        rows.iter()
            .map(|row| text_field(row, "column_name"))
            .collect()
    }

    pub async fn exists(conn: &mut dyn Connection, table: &str) -> Result<bool, DatabaseError> {
        let rows = conn.query(&Self::exists_query(table)).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("exists"))
            .is_some_and(|v| match v {
                Value::Boolean(b) => *b,
                Value::Text(s) => matches!(s.as_str(), "t" | "true"),
                _ => false,
            }))
    }

    fn descriptor(row: &Row) -> Result<ColumnDescriptor, DatabaseError> {
        let name = text_field(row, "column_name")?;
        let sql_type = text_field(row, "data_type")?;
        let nullable = text_field(row, "is_nullable")?.eq_ignore_ascii_case("YES");

        let default_expr = row
            .get("column_default")
            .and_then(Value::as_text)
            .map(DefaultExpr::parse);
        let has_default = match &default_expr {
            Some(DefaultExpr::Literal(v)) => !v.is_null(),
            Some(DefaultExpr::Expression(_)) => true,
            None => false,
        };
        let default_value = default_expr
            .and_then(DefaultExpr::into_value)
            .filter(|v| !v.is_null());

        Ok(ColumnDescriptor {
            name,
            sql_type,
            nullable,
            default_value,
            has_default,
            is_primary_key: false,
        })
    }
}

fn text_field(row: &Row, column: &str) -> Result<String, DatabaseError> {
    row.get(column)
        .and_then(Value::as_text)
        .map(str::to_string)
        .ok_or_else(|| DatabaseError::Backend(format!("catalog row without {column}")))
}
