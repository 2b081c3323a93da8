use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, info};

use crate::types::{DatabaseError, Row, Value};
use super::csv_codec::{decode, encode_record};

static NULL: Value = Value::Null;

/// Parsed contents of one table file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvData {
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

impl CsvData {
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.header.iter().any(|c| c == column)
    }

    /// Row values in header order; columns the row lacks are NULL.
    fn record<'a>(&self, row: &'a Row) -> Vec<&'a Value> {
        self.header
            .iter()
            .map(|c| row.get(c).unwrap_or(&NULL))
            .collect()
    }
}

/// One `<table>.<ext>` file. Every mutation is a whole-file rewrite except
/// inserts, which append.
#[derive(Debug, Clone)]
pub struct CsvFile {
    table: String,
    path: PathBuf,
    delimiter: char,
}

impl CsvFile {
    #[must_use]
    pub fn new(table: impl Into<String>, path: PathBuf, delimiter: char) -> Self {
        Self {
            table: table.into(),
            path,
            delimiter,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> Result<bool, DatabaseError> {
        Ok(fs::try_exists(&self.path).await?)
    }

    pub async fn read(&self) -> Result<CsvData, DatabaseError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DatabaseError::TableNotFound(self.table.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut records = decode(&content, self.delimiter)
            .map_err(|reason| self.malformed(reason))?
            .into_iter();

        let header: Vec<String> = match records.next() {
            Some(fields) => fields
                .into_iter()
                .map(|f| match f {
                    Value::Text(name) => Ok(name),
                    _ => Err(self.malformed("empty column name in header".to_string())),
                })
                .collect::<Result<_, _>>()?,
            None => return Err(self.malformed("missing header".to_string())),
        };

        let mut rows: Vec<Row> = Vec::with_capacity(records.len());
        for (i, fields) in records.enumerate() {
            if fields.len() != header.len() {
                return Err(self.malformed(format!(
                    "record {} has {} fields, header has {}",
                    i + 2,
                    fields.len(),
                    header.len()
                )));
            }
            rows.push(header.iter().cloned().zip(fields).collect());
        }

        debug!(table = %self.table, rows = rows.len(), "read table file");
        Ok(CsvData { header, rows })
    }

    /// Replaces the whole file.
    pub async fn write(&self, data: &CsvData) -> Result<(), DatabaseError> {
        let mut content = self.header_line(&data.header);
        for row in &data.rows {
            content.push_str(&encode_record(data.record(row), self.delimiter));
        }
        fs::write(&self.path, content).await?;
        info!(table = %self.table, rows = data.rows.len(), "rewrote table file");
        Ok(())
    }

    /// Appends rows in header order.
    pub async fn append(&self, data: &CsvData) -> Result<(), DatabaseError> {
        let mut file = match OpenOptions::new().read(true).append(true).open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DatabaseError::TableNotFound(self.table.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut content = String::new();
        if file.metadata().await?.len() > 0 {
            file.seek(SeekFrom::End(-1)).await?;
            if file.read_u8().await? != b'\n' {
                content.push('\n');
            }
        }
        for row in &data.rows {
            content.push_str(&encode_record(data.record(row), self.delimiter));
        }

        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        debug!(table = %self.table, rows = data.rows.len(), "appended to table file");
        Ok(())
    }

    /// Creates a header-only file; fails if the table already exists.
    pub async fn create(&self, header: &[String]) -> Result<(), DatabaseError> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(DatabaseError::TableAlreadyExists(self.table.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(self.header_line(header).as_bytes()).await?;
        file.flush().await?;
        info!(table = %self.table, path = %self.path.display(), "created table file");
        Ok(())
    }

    pub async fn remove(&self) -> Result<(), DatabaseError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(table = %self.table, "removed table file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(DatabaseError::TableNotFound(self.table.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn header_line(&self, header: &[String]) -> String {
        let names: Vec<Value> = header.iter().map(|c| Value::from(c.as_str())).collect();
        encode_record(&names, self.delimiter)
    }

    fn malformed(&self, reason: String) -> DatabaseError {
        DatabaseError::MalformedFile {
            path: self.path.display().to_string(),
            reason,
        }
    }
}
