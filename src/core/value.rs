use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    // Numeric types
    Integer(i64),
    Real(f64),
    Numeric(Decimal), // NUMERIC/DECIMAL with precision
    // String types
    Text(String),
    // Boolean
    Boolean(bool),
    // Date/Time types
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// A value counts as "supplied" for a mandatory column when it is
    /// neither NULL nor an empty string.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Text(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Numeric view of the value. Text qualifies when it is numeric-looking,
    /// which is how the file backend (all text) takes part in comparisons.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Integer(i) => Some(Decimal::from(*i)),
            Self::Real(r) => Decimal::try_from(*r).ok(),
            Self::Numeric(d) => Some(*d),
            Self::Text(s) => parse_decimal(s),
            _ => None,
        }
    }

    /// Turns numeric-looking text into a number, leaving anything else as is.
    #[must_use]
    pub fn normalize_numeric(self) -> Self {
        match self {
            Self::Text(s) => Self::from_numeric_text(s),
            other => other,
        }
    }

    /// Whole decimals come back as integers, so folds over integer columns
    /// keep integer results.
    #[must_use]
    pub fn from_decimal(d: Decimal) -> Self {
        if d.fract().is_zero() {
            if let Some(i) = d.to_i64() {
                return Self::Integer(i);
            }
        }
        Self::Numeric(d.normalize())
    }

    #[must_use]
    pub fn from_numeric_text(s: String) -> Self {
        let trimmed = s.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return Self::Integer(i);
        }
        match parse_decimal(trimmed) {
            Some(d) => Self::Numeric(d),
            None => Self::Text(s),
        }
    }

    /// Ordering used by the file backend and client-side folds.
    ///
    /// Numbers compare numerically when both sides are numeric-looking,
    /// everything else falls back to comparing the text form. NULL has no
    /// ordering relative to anything.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        if self.is_null() || other.is_null() {
            return None;
        }
        if let (Some(a), Some(b)) = (self.as_decimal(), other.as_decimal()) {
            return Some(a.cmp(&b));
        }
        match (self, other) {
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Time(a), Self::Time(b)) => Some(a.cmp(b)),
            (Self::Timestamp(a), Self::Timestamp(b)) => Some(a.cmp(b)),
            _ => Some(self.to_string().cmp(&other.to_string())),
        }
    }

    /// SQL-style equality: NULL equals nothing, numeric-looking values
    /// compare by number.
    #[must_use]
    pub fn loose_eq(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// Renders the value as an escaped SQL literal. Only used where the
    /// server does not accept bind parameters (DDL defaults).
    #[must_use]
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Real(r) => r.to_string(),
            Self::Numeric(d) => d.to_string(),
            Self::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Self::Text(_) | Self::Date(_) | Self::Time(_) | Self::Timestamp(_) => {
                quote_literal(&self.to_string())
            }
        }
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Real(r) => serde_json::Value::from(*r),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

/// Wraps text in single quotes, doubling any embedded quote.
#[must_use]
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Numeric(d) => write!(f, "{d}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Self::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(r: f64) -> Self {
        Self::Real(r)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Self::Numeric(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Self::Time(t)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(t: NaiveDateTime) -> Self {
        Self::Timestamp(t)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map_or(Self::Null, Self::Real),
            },
            serde_json::Value::String(s) => Self::Text(s),
            other => Self::Text(other.to_string()),
        }
    }
}
