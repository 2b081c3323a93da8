/// DDL (Data Definition Language) statements
///
/// ADD / ALTER / RENAME / DROP COLUMN, CREATE TABLE, DROP TABLE.
/// Column definitions go through the logical type table first; DDL does
/// not take bind parameters, so defaults are rendered as escaped literals.

use crate::types::{ColumnDescriptor, ColumnSpec, DatabaseError, LogicalType, Schema};
use crate::validator::{check_conversion, resolve_type, validate_identifier};
use super::statement::Statement;

pub struct DdlCompiler;

impl DdlCompiler {
    /// ALTER TABLE ADD COLUMN
    pub fn add_column(
        table: &str,
        schema: &[ColumnDescriptor],
        spec: &ColumnSpec,
    ) -> Result<Statement, DatabaseError> {
        let logical = resolve_type(spec)?;
        if schema.has_column(&spec.name) {
            return Err(DatabaseError::DuplicateColumn(spec.name.clone()));
        }
        Ok(Statement::new(format!(
            "ALTER TABLE {table} ADD COLUMN {};",
            Self::column_definition(spec, logical)
        )))
    }

    /// ALTER TABLE ALTER COLUMN: type (with USING cast), nullability and
    /// default in one statement.
    pub fn modify_column(
        table: &str,
        schema: &[ColumnDescriptor],
        spec: &ColumnSpec,
    ) -> Result<Statement, DatabaseError> {
        let logical = resolve_type(spec)?;
        let current = schema
            .column(&spec.name)
            .ok_or_else(|| DatabaseError::ColumnNotFound(spec.name.clone()))?;
        check_conversion(current, logical)?;

        let name = &spec.name;
        let target = if logical.primary_key {
            "INTEGER".to_string()
        } else {
            logical.render(spec)
        };

        let mut actions = vec![format!(
            "ALTER COLUMN {name} TYPE {target} USING {name}::{target}"
        )];

        if logical.primary_key {
            actions.push(format!("ALTER COLUMN {name} SET NOT NULL"));
            if !current.is_primary_key {
                actions.push(format!("ADD PRIMARY KEY ({name})"));
            }
        } else {
            actions.push(if spec.nullable {
                format!("ALTER COLUMN {name} DROP NOT NULL")
            } else {
                format!("ALTER COLUMN {name} SET NOT NULL")
            });
            actions.push(match &spec.default {
                Some(default) => format!(
                    "ALTER COLUMN {name} SET DEFAULT {}",
                    default.to_sql_literal()
                ),
                None => format!("ALTER COLUMN {name} DROP DEFAULT"),
            });
        }

        Ok(Statement::new(format!(
            "ALTER TABLE {table} {};",
            actions.join(", ")
        )))
    }

    /// ALTER TABLE RENAME COLUMN
    pub fn rename_column(
        table: &str,
        schema: &[ColumnDescriptor],
        old_name: &str,
        new_name: &str,
    ) -> Result<Statement, DatabaseError> {
        validate_identifier(old_name)?;
        validate_identifier(new_name)?;
        if !schema.has_column(old_name) {
            return Err(DatabaseError::ColumnNotFound(old_name.to_string()));
        }
        if schema.has_column(new_name) {
            return Err(DatabaseError::DuplicateColumn(new_name.to_string()));
        }
        Ok(Statement::new(format!(
            "ALTER TABLE {table} RENAME COLUMN {old_name} TO {new_name};"
        )))
    }

    /// ALTER TABLE DROP COLUMN
    pub fn drop_column(
        table: &str,
        schema: &[ColumnDescriptor],
        column: &str,
    ) -> Result<Statement, DatabaseError> {
        validate_identifier(column)?;
        if !schema.has_column(column) {
            return Err(DatabaseError::ColumnNotFound(column.to_string()));
        }
        Ok(Statement::new(format!(
            "ALTER TABLE {table} DROP COLUMN {column};"
        )))
    }

    /// CREATE TABLE. Existence is checked by the caller against the catalog.
    pub fn create_table(table: &str, specs: &[ColumnSpec]) -> Result<Statement, DatabaseError> {
        if specs.is_empty() {
            return Err(DatabaseError::NoValues("create table"));
        }
        let mut definitions = Vec::with_capacity(specs.len());
        for (i, spec) in specs.iter().enumerate() {
            let logical = resolve_type(spec)?;
            if specs[..i].iter().any(|s| s.name == spec.name) {
                return Err(DatabaseError::DuplicateColumn(spec.name.clone()));
            }
            definitions.push(Self::column_definition(spec, logical));
        }
        Ok(Statement::new(format!(
            "CREATE TABLE {table} ({});",
            definitions.join(", ")
        )))
    }

    #[must_use]
    pub fn drop_table(table: &str) -> Statement {
        Statement::new(format!("DROP TABLE {table};"))
    }

    fn column_definition(spec: &ColumnSpec, logical: &LogicalType) -> String {
        let mut definition = format!("{} {}", spec.name, logical.render(spec));
        if logical.primary_key {
            definition.push_str(" PRIMARY KEY");
            return definition;
        }
        if !spec.nullable {
            definition.push_str(" NOT NULL");
        }
        if let Some(default) = &spec.default {
            definition.push_str(" DEFAULT ");
            definition.push_str(&default.to_sql_literal());
        }
        definition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor {
                name: "name".to_string(),
                sql_type: "character varying".to_string(),
                nullable: false,
                default_value: None,
                has_default: false,
                is_primary_key: false,
            },
            ColumnDescriptor {
                name: "age".to_string(),
                sql_type: "integer".to_string(),
                nullable: true,
                default_value: None,
                has_default: false,
                is_primary_key: false,
            },
        ]
    }

    #[test]
    fn test_add_column_with_default() {
        let spec = ColumnSpec::new("job", "string")
            .length(64)
            .default_value("chemist");
        let st = DdlCompiler::add_column("people", &schema(), &spec).unwrap();
        assert_eq!(
            st.sql,
            "ALTER TABLE people ADD COLUMN job VARCHAR(64) DEFAULT 'chemist';"
        );
    }

    #[test]
    fn test_add_existing_column_fails() {
        let spec = ColumnSpec::new("age", "int");
        assert!(matches!(
            DdlCompiler::add_column("people", &schema(), &spec),
            Err(DatabaseError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_add_column_missing_length_fails() {
        let spec = ColumnSpec::new("job", "string");
        assert!(matches!(
            DdlCompiler::add_column("people", &schema(), &spec),
            Err(DatabaseError::InvalidColumnSpec { .. })
        ));
    }

    #[test]
    fn test_modify_numeric_column() {
        let spec = ColumnSpec::new("age", "float").precision(5, 1).not_null();
        let st = DdlCompiler::modify_column("people", &schema(), &spec).unwrap();
        assert_eq!(
            st.sql,
            "ALTER TABLE people ALTER COLUMN age TYPE NUMERIC(5, 1) USING age::NUMERIC(5, 1), \
             ALTER COLUMN age SET NOT NULL, ALTER COLUMN age DROP DEFAULT;"
        );
    }

    #[test]
    fn test_modify_rejects_cross_family_conversion() {
        let spec = ColumnSpec::new("name", "int");
        assert!(matches!(
            DdlCompiler::modify_column("people", &schema(), &spec),
            Err(DatabaseError::IllegalTypeConversion { .. })
        ));
        let spec = ColumnSpec::new("age", "date");
        assert!(DdlCompiler::modify_column("people", &schema(), &spec).is_err());
    }

    #[test]
    fn test_modify_missing_column() {
        let spec = ColumnSpec::new("salary", "int");
        assert!(matches!(
            DdlCompiler::modify_column("people", &schema(), &spec),
            Err(DatabaseError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_rename_and_drop() {
        let st = DdlCompiler::rename_column("people", &schema(), "age", "years").unwrap();
        assert_eq!(st.sql, "ALTER TABLE people RENAME COLUMN age TO years;");
        assert!(matches!(
            DdlCompiler::rename_column("people", &schema(), "salary", "pay"),
            Err(DatabaseError::ColumnNotFound(_))
        ));
        assert!(matches!(
            DdlCompiler::rename_column("people", &schema(), "age", "name"),
            Err(DatabaseError::DuplicateColumn(_))
        ));
        assert!(matches!(
            DdlCompiler::drop_column("people", &schema(), "salary"),
            Err(DatabaseError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_create_table() {
        let specs = [
            ColumnSpec::new("id", "pk"),
            ColumnSpec::new("name", "string").length(100).not_null(),
            ColumnSpec::new("hired", "date"),
        ];
        let st = DdlCompiler::create_table("people", &specs).unwrap();
        assert_eq!(
            st.sql,
            "CREATE TABLE people (id SERIAL PRIMARY KEY, name VARCHAR(100) NOT NULL, hired DATE);"
        );
    }
}
