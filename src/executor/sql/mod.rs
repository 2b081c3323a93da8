/// SQL backend - PostgreSQL dialect over a pooled or pinned connection
///
/// Structure:
/// - statement: SQL text plus positional parameters
/// - compiler: SELECT clauses and aggregate selects
/// - dml: INSERT/UPSERT/UPDATE/DELETE with schema validation
/// - ddl: column and table definition statements
/// - catalog: live `information_schema` lookups
pub mod catalog;
pub mod compiler;
pub mod ddl;
pub mod dml;
pub mod statement;

pub use catalog::Catalog;
pub use ddl::DdlCompiler;
pub use dml::DmlCompiler;
pub use statement::{Params, Statement};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::builder::{QueryBuilder, QueryIntent, Selection};
use crate::transaction::{Connection, SqlSession};
use crate::types::{ColumnDescriptor, ColumnSpec, DatabaseError, Row, Schema, Value};
use crate::validator::validate_identifier;
use super::aggregate::{scalar, Aggregate};
use super::Executable;

/// Handle on one table of a SQL store.
pub struct SqlTable {
    name: String,
    session: Arc<SqlSession>,
    intent: QueryIntent,
}

impl SqlTable {
    #[must_use]
    pub fn new(name: impl Into<String>, session: Arc<SqlSession>) -> Self {
        Self {
            name: name.into(),
            session,
            intent: QueryIntent::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Takes the intent for one terminal call, leaving a neutral one behind.
    fn take_intent(&mut self) -> Result<QueryIntent, DatabaseError> {
        let intent = std::mem::take(&mut self.intent);
        validate_identifier(&self.name)?;
        intent.into_checked()
    }

    /// Runs a SELECT after checking selected columns against the schema.
    /// Qualified columns and joined queries are left to the server.
    async fn select_rows(
        &self,
        conn: &mut dyn Connection,
        intent: &QueryIntent,
    ) -> Result<Vec<Row>, DatabaseError> {
        let schema = Catalog::columns(conn, &self.name).await?;
        if !intent.has_join() {
            for column in intent.selection.columns() {
                if !column.contains('.') && !schema.has_column(column) {
                    return Err(DatabaseError::UnknownColumn(column.clone()));
                }
            }
        }
        conn.query(&compiler::select(&self.name, intent)).await
    }

    async fn insert_rows(&mut self, rows: Vec<Row>, upsert: bool) -> Result<Vec<Row>, DatabaseError> {
        let intent = self.take_intent()?;
        if rows.is_empty() {
            return Err(DatabaseError::NoValues("insert"));
        }
        let mut scope = self.session.scope().await?;
        let schema = Catalog::columns(&mut scope, &self.name).await?;
        let statement = DmlCompiler::insert(&self.name, &schema, &rows, &intent.returning, upsert)?;
        scope.query(&statement).await
    }

    /// Insert, or update the existing row on a primary-key conflict. Tables
    /// without a primary key get a plain insert.
    pub async fn upsert(&mut self, rows: Vec<Row>) -> Result<Vec<Row>, DatabaseError> {
        self.insert_rows(rows, true).await
    }

    pub async fn exists(&mut self) -> Result<bool, DatabaseError> {
        self.take_intent()?;
        let mut scope = self.session.scope().await?;
        Catalog::exists(&mut scope, &self.name).await
    }

    /// ALTER TABLE ... ADD COLUMN
    pub async fn add(&mut self, spec: ColumnSpec) -> Result<(), DatabaseError> {
        self.take_intent()?;
        let mut scope = self.session.scope().await?;
        let schema = Catalog::columns(&mut scope, &self.name).await?;
        let statement = DdlCompiler::add_column(&self.name, &schema, &spec)?;
        self.run_ddl(&mut scope, &statement).await
    }

    /// ALTER TABLE ... ALTER COLUMN (type, nullability, default)
    pub async fn modify(&mut self, spec: ColumnSpec) -> Result<(), DatabaseError> {
        self.take_intent()?;
        let mut scope = self.session.scope().await?;
        let schema = Catalog::columns(&mut scope, &self.name).await?;
        let statement = DdlCompiler::modify_column(&self.name, &schema, &spec)?;
        self.run_ddl(&mut scope, &statement).await
    }

    pub async fn rename(&mut self, old_name: &str, new_name: &str) -> Result<(), DatabaseError> {
        self.take_intent()?;
        let mut scope = self.session.scope().await?;
        let schema = Catalog::columns(&mut scope, &self.name).await?;
        let statement = DdlCompiler::rename_column(&self.name, &schema, old_name, new_name)?;
        self.run_ddl(&mut scope, &statement).await
    }

    /// ALTER TABLE ... DROP COLUMN
    pub async fn del(&mut self, column: &str) -> Result<(), DatabaseError> {
        self.take_intent()?;
        let mut scope = self.session.scope().await?;
        let schema = Catalog::columns(&mut scope, &self.name).await?;
        let statement = DdlCompiler::drop_column(&self.name, &schema, column)?;
        self.run_ddl(&mut scope, &statement).await
    }

    pub async fn create(&mut self, specs: Vec<ColumnSpec>) -> Result<(), DatabaseError> {
        self.take_intent()?;
        let statement = DdlCompiler::create_table(&self.name, &specs)?;
        let mut scope = self.session.scope().await?;
        if Catalog::exists(&mut scope, &self.name).await? {
            return Err(DatabaseError::TableAlreadyExists(self.name.clone()));
        }
        self.run_ddl(&mut scope, &statement).await
    }

    pub async fn drop(&mut self) -> Result<(), DatabaseError> {
        self.take_intent()?;
        let mut scope = self.session.scope().await?;
        if !Catalog::exists(&mut scope, &self.name).await? {
            return Err(DatabaseError::TableNotFound(self.name.clone()));
        }
        self.run_ddl(&mut scope, &DdlCompiler::drop_table(&self.name)).await
    }

    async fn run_ddl(
        &self,
        conn: &mut dyn Connection,
        statement: &Statement,
    ) -> Result<(), DatabaseError> {
        conn.query(statement).await?;
        info!(table = %self.name, "{}", statement.sql);
        Ok(())
    }
}

impl QueryBuilder for SqlTable {
    fn intent_mut(&mut self) -> &mut QueryIntent {
        &mut self.intent
    }
}

#[async_trait]
impl Executable for SqlTable {
    /// Requires a prior `select`.
    async fn get(&mut self) -> Result<Vec<Row>, DatabaseError> {
        let intent = self.take_intent()?;
        if intent.selection == Selection::NotSelected {
            return Err(DatabaseError::CallOrderViolation(
                "columns not selected, call select() before get()".to_string(),
            ));
        }
        let mut scope = self.session.scope().await?;
        self.select_rows(&mut scope, &intent).await
    }

    async fn first(&mut self) -> Result<Option<Row>, DatabaseError> {
        let mut intent = self.take_intent()?;
        if intent.selection == Selection::NotSelected {
            intent.selection = Selection::All;
        }
        intent.order_by.clear();
        intent.descending = false;
        intent.limit = Some(1);

        let mut scope = self.session.scope().await?;
        Ok(self.select_rows(&mut scope, &intent).await?.into_iter().next())
    }

    async fn last(&mut self) -> Result<Option<Row>, DatabaseError> {
        let mut intent = self.take_intent()?;
        if intent.selection == Selection::NotSelected {
            intent.selection = Selection::All;
        }

        let mut scope = self.session.scope().await?;
        let keys = Catalog::primary_keys(&mut scope, &self.name).await?;
        if keys.is_empty() {
            intent.order_by.clear();
            intent.descending = false;
            intent.limit = None;
            return Ok(self.select_rows(&mut scope, &intent).await?.pop());
        }

        intent.order_by = keys;
        intent.descending = true;
        intent.limit = Some(1);
        Ok(self.select_rows(&mut scope, &intent).await?.into_iter().next())
    }

    async fn insert(&mut self, rows: Vec<Row>) -> Result<Vec<Row>, DatabaseError> {
        self.insert_rows(rows, false).await
    }

    async fn update(&mut self, values: Row) -> Result<Vec<Row>, DatabaseError> {
        let intent = self.take_intent()?;
        let mut scope = self.session.scope().await?;
        let schema = Catalog::columns(&mut scope, &self.name).await?;
        let statement = DmlCompiler::update(&self.name, &schema, &values, &intent)?;
        scope.query(&statement).await
    }

    async fn delete(&mut self) -> Result<Vec<Row>, DatabaseError> {
        let intent = self.take_intent()?;
        let mut scope = self.session.scope().await?;
        scope.query(&DmlCompiler::delete(&self.name, &intent)).await
    }

    async fn aggregate(&mut self, function: Aggregate) -> Result<Value, DatabaseError> {
        let intent = self.take_intent()?;
        function.validate()?;
        let statement = compiler::aggregate(
            &self.name,
            &function.sql_expression(),
            function.alias(),
            &intent,
        );
        let mut scope = self.session.scope().await?;
        let rows = scope.query(&statement).await?;
        Ok(scalar(rows, function.alias()))
    }

    async fn columns(&mut self) -> Result<Vec<ColumnDescriptor>, DatabaseError> {
        self.take_intent()?;
        let mut scope = self.session.scope().await?;
        Catalog::columns(&mut scope, &self.name).await
    }
}
