use serde::ser::{Serialize, SerializeMap, Serializer};
use super::value::Value;
use super::error::DatabaseError;

/// Ordered mapping from column name to value.
///
/// Both backends hand rows back in this shape; column order follows the
/// statement (SQL) or the file header (CSV).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    entries: Vec<(String, Value)>,
}

impl Row {
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Builder-style insert, handy for literal rows.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Sets a column, replacing the existing value in place or appending.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(name, _)| name == column)?;
        Some(self.entries.remove(idx).1)
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keeps only the given columns, in the given order. Columns the row
    /// does not carry come back as NULL.
    #[must_use]
    pub fn project(&self, columns: &[String]) -> Self {
        let mut projected = Self::with_capacity(columns.len());
        for column in columns {
            let value = self.get(column).cloned().unwrap_or(Value::Null);
            projected.entries.push((column.clone(), value));
        }
        projected
    }

    /// Converts a JSON object (`{"name": "Micah", "age": 29}`) into a row.
    pub fn from_json(json: serde_json::Value) -> Result<Self, DatabaseError> {
        match json {
            serde_json::Value::Object(map) => Ok(map
                .into_iter()
                .fold(Self::new(), |row, (k, v)| row.with(k, Value::from(v)))),
            other => Err(DatabaseError::TypeMismatch(format!(
                "expected a JSON object for a row, got {other}"
            ))),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |row, (k, v)| row.with(k, v))
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
