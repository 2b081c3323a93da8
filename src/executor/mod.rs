/// Executor module - turns a captured intent into backend operations
///
/// Structure:
/// - sql: statement compilation and execution over a connection scope
/// - csv: the same operations as read-modify-rewrite on delimited files
/// - aggregate: COUNT/SUM/AVG/MIN/MAX, rendered or folded client-side
///
/// Both table handles implement [`Executable`]. Every terminal call takes
/// the intent out of the handle first, so the handle is back to a neutral
/// intent afterwards whether the call succeeded or not.

pub mod aggregate;
pub mod csv;
pub mod sql;

pub use aggregate::Aggregate;
pub use csv::{CsvCatalog, CsvTable};
pub use sql::{SqlTable, Statement};

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::builder::QueryBuilder;
use crate::types::{ColumnDescriptor, DatabaseError, Row, Value};

#[async_trait]
pub trait Executable: QueryBuilder + Send {
    /// Rows matching the current intent.
    async fn get(&mut self) -> Result<Vec<Row>, DatabaseError>;

    /// First matching row in storage order.
    async fn first(&mut self) -> Result<Option<Row>, DatabaseError>;

    /// Last matching row: highest primary key on SQL, final row after
    /// ordering on the file backend.
    async fn last(&mut self) -> Result<Option<Row>, DatabaseError>;

    /// Inserts the rows and returns them projected to `returning` columns
    /// (empty when none were requested).
    async fn insert(&mut self, rows: Vec<Row>) -> Result<Vec<Row>, DatabaseError>;

    async fn insert_one(&mut self, row: Row) -> Result<Vec<Row>, DatabaseError> {
        self.insert(vec![row]).await
    }

    async fn update(&mut self, values: Row) -> Result<Vec<Row>, DatabaseError>;

    async fn delete(&mut self) -> Result<Vec<Row>, DatabaseError>;

    /// Evaluates one aggregate against the current filter.
    async fn aggregate(&mut self, function: Aggregate) -> Result<Value, DatabaseError>;

    async fn columns(&mut self) -> Result<Vec<ColumnDescriptor>, DatabaseError>;

    async fn count(&mut self, column: Option<&str>) -> Result<i64, DatabaseError> {
        let value = self
            .aggregate(Aggregate::Count(column.map(str::to_string)))
            .await?;
        Ok(value.as_decimal().and_then(|d| d.to_i64()).unwrap_or(0))
    }

    async fn sum(&mut self, column: &str) -> Result<Value, DatabaseError> {
        self.aggregate(Aggregate::Sum(column.to_string())).await
    }

    async fn avg(&mut self, column: &str, precision: Option<u32>) -> Result<Option<Decimal>, DatabaseError> {
        let value = self
            .aggregate(Aggregate::Avg(column.to_string(), precision))
            .await?;
        Ok(value.as_decimal())
    }

    async fn min(&mut self, column: &str) -> Result<Value, DatabaseError> {
        self.aggregate(Aggregate::Min(column.to_string())).await
    }

    async fn max(&mut self, column: &str) -> Result<Value, DatabaseError> {
        self.aggregate(Aggregate::Max(column.to_string())).await
    }
}
