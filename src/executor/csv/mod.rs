/// Flat-file backend - one delimited text file per table
///
/// Structure:
/// - catalog: table directory, file naming, tracked column defaults
/// - conditions: filter and join condition evaluation
/// - queries: join/filter/sort/limit/project pipeline
/// - dml: append, rewrite, header changes, create/drop
pub mod catalog;
pub mod conditions;
pub mod dml;
pub mod queries;

pub use catalog::CsvCatalog;
pub use conditions::{ColumnScope, ConditionEvaluator};
pub use dml::DmlExecutor;
pub use queries::QueryExecutor;

use std::sync::Arc;

use async_trait::async_trait;

use crate::builder::{QueryBuilder, QueryIntent, Selection};
use crate::types::{ColumnDescriptor, DatabaseError, Row, Value};
use crate::validator::validate_identifier;
use super::aggregate::Aggregate;
use super::Executable;

/// Handle on one table file of a CSV store.
pub struct CsvTable {
    name: String,
    catalog: Arc<CsvCatalog>,
    intent: QueryIntent,
}

impl CsvTable {
    #[must_use]
    pub fn new(name: impl Into<String>, catalog: Arc<CsvCatalog>) -> Self {
        Self {
            name: name.into(),
            catalog,
            intent: QueryIntent::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn take_intent(&mut self) -> Result<QueryIntent, DatabaseError> {
        let intent = std::mem::take(&mut self.intent);
        validate_identifier(&self.name)?;
        intent.into_checked()
    }

    /// Adds the columns marked with `alter` / `alter_with_default`.
    pub async fn add_columns(&mut self) -> Result<(), DatabaseError> {
        let intent = self.take_intent()?;
        DmlExecutor::add_columns(&self.catalog, &self.name, &intent.alter_targets).await
    }

    /// Removes the columns marked with `alter`.
    pub async fn remove_columns(&mut self) -> Result<(), DatabaseError> {
        let intent = self.take_intent()?;
        DmlExecutor::remove_columns(&self.catalog, &self.name, &intent.alter_targets).await
    }

    pub async fn create<I, S>(&mut self, columns: I) -> Result<(), DatabaseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.take_intent()?;
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        DmlExecutor::create(&self.catalog, &self.name, &columns).await
    }

    pub async fn drop(&mut self) -> Result<(), DatabaseError> {
        self.take_intent()?;
        DmlExecutor::drop(&self.catalog, &self.name).await
    }

    pub async fn exists(&mut self) -> Result<bool, DatabaseError> {
        self.take_intent()?;
        self.catalog.file(&self.name)?.exists().await
    }
}

impl QueryBuilder for CsvTable {
    fn intent_mut(&mut self) -> &mut QueryIntent {
        &mut self.intent
    }
}

#[async_trait]
impl Executable for CsvTable {
    /// All columns unless `select` narrowed them.
    async fn get(&mut self) -> Result<Vec<Row>, DatabaseError> {
        let intent = self.take_intent()?;
        QueryExecutor::select(&self.catalog, &self.name, &intent).await
    }

    async fn first(&mut self) -> Result<Option<Row>, DatabaseError> {
        Ok(self.get().await?.into_iter().next())
    }

    async fn last(&mut self) -> Result<Option<Row>, DatabaseError> {
        Ok(self.get().await?.pop())
    }

    async fn insert(&mut self, rows: Vec<Row>) -> Result<Vec<Row>, DatabaseError> {
        let intent = self.take_intent()?;
        DmlExecutor::insert(&self.catalog, &self.name, &rows, &intent.returning).await
    }

    async fn update(&mut self, values: Row) -> Result<Vec<Row>, DatabaseError> {
        let intent = self.take_intent()?;
        DmlExecutor::update(&self.catalog, &self.name, &values, &intent).await
    }

    async fn delete(&mut self) -> Result<Vec<Row>, DatabaseError> {
        let intent = self.take_intent()?;
        DmlExecutor::delete(&self.catalog, &self.name, &intent).await
    }

    /// Folds over the filtered rows; order, limit and selection do not
    /// apply to aggregates.
    async fn aggregate(&mut self, function: Aggregate) -> Result<Value, DatabaseError> {
        let mut intent = self.take_intent()?;
        function.validate()?;
        intent.selection = Selection::All;
        intent.order_by.clear();

        let selected = QueryExecutor::filter(&self.catalog, &self.name, &intent).await?;
        let rows: Vec<Row> = match function.column() {
            Some(column) => {
                selected.scope.check([column])?;
                let column = [column.to_string()];
                selected
                    .rows
                    .iter()
                    .map(|row| QueryExecutor::project(row, &column))
                    .collect()
            }
            None => selected.rows,
        };
        function.fold(&rows)
    }

    async fn columns(&mut self) -> Result<Vec<ColumnDescriptor>, DatabaseError> {
        self.take_intent()?;
        self.catalog.columns(&self.name).await
    }
}
