/// Aggregate functions (COUNT, SUM, AVG, MIN, MAX)
///
/// The SQL backend renders them into a single-column SELECT, the file
/// backend folds them over the rows `get()` produced. Both report the result
/// as a `Value` normalized the same way: numeric-looking text becomes a
/// number, whole decimals become integers.

use rust_decimal::Decimal;
use std::cmp::Ordering;

use crate::types::{DatabaseError, Row, Value};
use crate::validator::{validate_avg_precision, validate_column_ref};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregate {
    /// `None` counts rows, `Some(col)` counts non-NULL values.
    Count(Option<String>),
    Sum(String),
    /// Optional rounding precision, 0..=100.
    Avg(String, Option<u32>),
    Min(String),
    Max(String),
}

impl Aggregate {
    #[must_use]
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::Count(column) => column.as_deref(),
            Self::Sum(c) | Self::Avg(c, _) | Self::Min(c) | Self::Max(c) => Some(c),
        }
    }

    #[must_use]
    pub const fn alias(&self) -> &'static str {
        match self {
            Self::Count(_) => "count",
            Self::Sum(_) => "sum",
            Self::Avg(..) => "avg",
            Self::Min(_) => "min",
            Self::Max(_) => "max",
        }
    }

    pub fn validate(&self) -> Result<(), DatabaseError> {
        if let Some(column) = self.column() {
            validate_column_ref(column)?;
        }
        if let Self::Avg(_, Some(precision)) = self {
            validate_avg_precision(*precision)?;
        }
        Ok(())
    }

    /// Select-list expression for the SQL backend. The precision is a
    /// validated integer and is inlined.
    #[must_use]
    pub fn sql_expression(&self) -> String {
        match self {
            Self::Count(None) => "COUNT(*)".to_string(),
            Self::Count(Some(c)) => format!("COUNT({c})"),
            Self::Sum(c) => format!("SUM({c})"),
            Self::Avg(c, Some(p)) => format!("ROUND(AVG({c})::numeric, {p})"),
            Self::Avg(c, None) => format!("AVG({c})"),
            Self::Min(c) => format!("MIN({c})"),
            Self::Max(c) => format!("MAX({c})"),
        }
    }

    /// Client-side evaluation over already filtered rows.
    pub fn fold(&self, rows: &[Row]) -> Result<Value, DatabaseError> {
        let Some(column) = self.column() else {
            return Ok(Value::Integer(i64::try_from(rows.len()).unwrap_or(i64::MAX)));
        };
        let values = rows
            .iter()
            .filter_map(|row| row.get(column))
            .filter(|v| !v.is_null());

        match self {
            Self::Count(_) => Ok(Value::Integer(
                i64::try_from(values.count()).unwrap_or(i64::MAX),
            )),
            Self::Sum(_) => {
                let numbers = numeric_values(column, values)?;
                Ok(numbers
                    .into_iter()
                    .reduce(|a, b| a + b)
                    .map_or(Value::Null, Value::from_decimal))
            }
            Self::Avg(_, precision) => {
                let numbers = numeric_values(column, values)?;
                if numbers.is_empty() {
                    return Ok(Value::Null);
                }
                let total: Decimal = numbers.iter().sum();
                let mean = total / Decimal::from(numbers.len());
                Ok(Value::Numeric(match precision {
                    Some(p) => mean.round_dp(*p),
                    None => mean.normalize(),
                }))
            }
            Self::Min(_) => Ok(extreme(values, Ordering::Less)),
            Self::Max(_) => Ok(extreme(values, Ordering::Greater)),
        }
    }
}

/// First column of the first row, normalized. Used on the single-row result
/// of an aggregate SELECT.
#[must_use]
pub fn scalar(rows: Vec<Row>, alias: &str) -> Value {
    rows.into_iter()
        .next()
        .and_then(|mut row| row.remove(alias))
        .unwrap_or(Value::Null)
        .normalize_numeric()
}

fn numeric_values<'a, I>(column: &str, values: I) -> Result<Vec<Decimal>, DatabaseError>
where
    I: Iterator<Item = &'a Value>,
{
    values
        .map(|v| {
            v.as_decimal().ok_or_else(|| {
                DatabaseError::TypeMismatch(format!("non-numeric value '{v}' in column {column}"))
            })
        })
        .collect()
}

fn extreme<'a, I>(values: I, wanted: Ordering) -> Value
where
    I: Iterator<Item = &'a Value>,
{
    values
        .fold(None::<&Value>, |best, v| match best {
            Some(b) if v.compare(b) != Some(wanted) => Some(b),
            _ => Some(v),
        })
        .map_or(Value::Null, |v| v.clone().normalize_numeric())
}
