use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use crate::storage::CsvFile;
use crate::types::{ColumnDescriptor, DatabaseError, Value};
use crate::validator::validate_identifier;

pub const DEFAULT_EXTENSION: &str = "csv";
pub const DEFAULT_DELIMITER: char = ',';

/// Directory of table files plus the column defaults set through
/// `alter_with_default`.
///
/// Defaults live in memory only; after a restart the header is the whole
/// schema again.
#[derive(Debug)]
pub struct CsvCatalog {
    dir: PathBuf,
    extension: String,
    delimiter: char,
    defaults: Mutex<HashMap<String, HashMap<String, Value>>>,
}

impl CsvCatalog {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_format(dir, DEFAULT_EXTENSION, DEFAULT_DELIMITER)
    }

    #[must_use]
    pub fn with_format(dir: impl Into<PathBuf>, extension: impl Into<String>, delimiter: char) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            delimiter,
            defaults: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub const fn delimiter(&self) -> char {
        self.delimiter
    }

    /// The file backing `table`. The name is validated as an identifier,
    /// which also keeps it inside the directory.
    pub fn file(&self, table: &str) -> Result<CsvFile, DatabaseError> {
        validate_identifier(table)?;
        let path = self.dir.join(format!("{table}.{}", self.extension));
        Ok(CsvFile::new(table, path, self.delimiter))
    }

    pub async fn defaults(&self, table: &str) -> HashMap<String, Value> {
        self.defaults
            .lock()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn set_default(&self, table: &str, column: &str, value: Value) {
        self.defaults
            .lock()
            .await
            .entry(table.to_string())
            .or_default()
            .insert(column.to_string(), value);
    }

    pub async fn remove_default(&self, table: &str, column: &str) {
        if let Some(columns) = self.defaults.lock().await.get_mut(table) {
            columns.remove(column);
        }
    }

    pub async fn forget(&self, table: &str) {
        self.defaults.lock().await.remove(table);
    }

    /// Header columns as descriptors: text, nullable, tracked default.
    pub async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, DatabaseError> {
        let data = self.file(table)?.read().await?;
        let defaults = self.defaults(table).await;
        Ok(data
            .header
            .into_iter()
            .map(|name| {
                let default = defaults.get(&name).cloned();
                ColumnDescriptor::text(name, default)
            })
            .collect())
    }
}
