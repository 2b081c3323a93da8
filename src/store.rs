use std::path::PathBuf;
use std::sync::Arc;

use crate::executor::{CsvCatalog, CsvTable, SqlTable};
use crate::transaction::{ConnectionPool, SqlSession};
use crate::types::DatabaseError;

/// Entry point for the SQL backend. Clones share the pool and the open
/// transaction, if any.
#[derive(Clone)]
pub struct SqlStore {
    session: Arc<SqlSession>,
}

impl SqlStore {
    #[must_use]
    pub fn new(pool: Arc<dyn ConnectionPool>) -> Self {
        Self {
            session: Arc::new(SqlSession::new(pool)),
        }
    }

    /// Table handle; the name is validated by the first terminal call.
    #[must_use]
    pub fn table(&self, name: &str) -> SqlTable {
        SqlTable::new(name, Arc::clone(&self.session))
    }

    /// Pins one connection and sends BEGIN. Tables from this store run on
    /// it until `commit` or `rollback`.
    pub async fn begin(&self) -> Result<(), DatabaseError> {
        self.session.begin().await
    }

    pub async fn commit(&self) -> Result<(), DatabaseError> {
        self.session.commit().await
    }

    pub async fn rollback(&self) -> Result<(), DatabaseError> {
        self.session.rollback().await
    }

    pub async fn in_transaction(&self) -> bool {
        self.session.in_transaction().await
    }
}

/// Entry point for the flat-file backend: a directory of table files.
#[derive(Debug, Clone)]
pub struct CsvStore {
    catalog: Arc<CsvCatalog>,
}

impl CsvStore {
    #[must_use]
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self {
            catalog: Arc::new(CsvCatalog::new(dir)),
        }
    }

    #[must_use]
    pub fn with_format(dir: impl Into<PathBuf>, extension: &str, delimiter: char) -> Self {
        Self {
            catalog: Arc::new(CsvCatalog::with_format(dir, extension, delimiter)),
        }
    }

    #[must_use]
    pub fn table(&self, name: &str) -> CsvTable {
        CsvTable::new(name, Arc::clone(&self.catalog))
    }

    #[must_use]
    pub fn catalog(&self) -> &CsvCatalog {
        &self.catalog
    }
}
