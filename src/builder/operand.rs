use crate::types::{DatabaseError, Value};
use crate::validator::validate_column_ref;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

/// Right-hand side of a `filter`/`on` call.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    List(Vec<Value>),
    Null,
    Column(String),
}

/// Column reference operand: `on("users.id", col("orders.user_id"))`.
pub fn col(name: impl Into<String>) -> Operand {
    Operand::Column(name.into())
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            other => Self::Value(other),
        }
    }
}

macro_rules! operand_from_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Operand {
                fn from(v: $ty) -> Self {
                    Self::from(Value::from(v))
                }
            }
        )*
    };
}

operand_from_scalar!(&str, String, i64, i32, f64, bool, Decimal, NaiveDate, NaiveTime, NaiveDateTime);

impl<T: Into<Value>> From<Option<T>> for Operand {
    fn from(v: Option<T>) -> Self {
        Self::from(Value::from(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Operand {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Operand {
    fn from(values: [T; N]) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Comparison operators accepted by `filter_op` / `on_op`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn parse(op: &str) -> Result<Self, DatabaseError> {
        match op.trim() {
            "=" => Ok(Self::Eq),
            "!=" | "<>" => Ok(Self::NotEq),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            other => Err(DatabaseError::InvalidPredicateShape(format!(
                "unsupported operator '{other}'"
            ))),
        }
    }

    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }

    #[must_use]
    pub fn matches(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            Self::Eq => ordering == Equal,
            Self::NotEq => ordering != Equal,
            Self::Gt => ordering == Greater,
            Self::Ge => ordering != Less,
            Self::Lt => ordering == Less,
            Self::Le => ordering != Greater,
        }
    }
}

/// What a single predicate tests.
#[derive(Debug, Clone, PartialEq)]
pub enum Test {
    Compare(CompareOp, Value),
    CompareColumn(CompareOp, String),
    In(Vec<Value>),
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub test: Test,
}

impl Predicate {
    /// Builds a predicate from one of the accepted shapes:
    /// equality, explicit operator, IN list, NULL test.
    pub fn build(column: &str, op: Option<&str>, rhs: Operand) -> Result<Self, DatabaseError> {
        validate_column_ref(column)?;
        let op = op.map(CompareOp::parse).transpose()?;

        let shape_error = |what: &str| {
            DatabaseError::InvalidPredicateShape(format!("{what} for column '{column}'"))
        };

        let test = match (op, rhs) {
            (None, Operand::Value(v)) => Test::Compare(CompareOp::Eq, v),
            (Some(op), Operand::Value(v)) => Test::Compare(op, v),
            (None | Some(CompareOp::Eq), Operand::List(values)) => {
                if values.is_empty() {
                    return Err(shape_error("empty IN list"));
                }
                Test::In(values)
            }
            (Some(_), Operand::List(_)) => {
                return Err(shape_error("a list only combines with '='"));
            }
            (None | Some(CompareOp::Eq), Operand::Null) => Test::IsNull,
            (Some(CompareOp::NotEq), Operand::Null) => Test::IsNotNull,
            (Some(_), Operand::Null) => {
                return Err(shape_error("NULL only combines with '=', '!=' or '<>'"));
            }
            (op, Operand::Column(other)) => {
                validate_column_ref(&other)?;
                Test::CompareColumn(op.unwrap_or(CompareOp::Eq), other)
            }
        };

        Ok(Self {
            column: column.to_string(),
            test,
        })
    }

    /// Every column the predicate reads.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        let other = match &self.test {
            Test::CompareColumn(_, other) => Some(other.as_str()),
            _ => None,
        };
        std::iter::once(self.column.as_str()).chain(other)
    }
}
