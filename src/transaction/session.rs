use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::executor::sql::Statement;
use crate::types::{DatabaseError, Row};
use super::pool::{Connection, ConnectionPool, PooledConnection};

/// Connection routing for one SQL store.
///
/// Outside a transaction every terminal call checks out its own pooled
/// connection. Between `begin` and `commit`/`rollback` one connection is
/// pinned here and every table created from the store goes through it.
pub struct SqlSession {
    pool: Arc<dyn ConnectionPool>,
    pinned: Mutex<Option<PooledConnection>>,
}

/// The connection a single terminal call runs on.
pub enum ConnectionScope<'a> {
    Pooled(PooledConnection),
    Pinned(MutexGuard<'a, Option<PooledConnection>>),
}

#[async_trait]
impl Connection for ConnectionScope<'_> {
    async fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, DatabaseError> {
        debug!("{}", statement);
        match self {
            Self::Pooled(conn) => conn.query(statement).await,
            Self::Pinned(guard) => match (**guard).as_mut() {
                Some(conn) => conn.query(statement).await,
                None => Err(DatabaseError::Connection(
                    "transaction connection released".to_string(),
                )),
            },
        }
    }
}

impl SqlSession {
    #[must_use]
    pub fn new(pool: Arc<dyn ConnectionPool>) -> Self {
        Self {
            pool,
            pinned: Mutex::new(None),
        }
    }

    /// Pinned connection when a transaction is open, a fresh pooled one
    /// otherwise.
    pub async fn scope(&self) -> Result<ConnectionScope<'_>, DatabaseError> {
        let guard = self.pinned.lock().await;
        if guard.is_some() {
            return Ok(ConnectionScope::Pinned(guard));
        }
        drop(guard);
        Ok(ConnectionScope::Pooled(
            PooledConnection::acquire(&self.pool).await?,
        ))
    }

    pub async fn in_transaction(&self) -> bool {
        self.pinned.lock().await.is_some()
    }

    pub async fn begin(&self) -> Result<(), DatabaseError> {
        let mut pinned = self.pinned.lock().await;
        if pinned.is_some() {
            return Err(DatabaseError::CallOrderViolation(
                "begin() while a transaction is already open".to_string(),
            ));
        }
        let mut conn = PooledConnection::acquire(&self.pool).await?;
        conn.query(&Statement::new("BEGIN;")).await?;
        *pinned = Some(conn);
        info!("transaction started");
        Ok(())
    }

    pub async fn commit(&self) -> Result<(), DatabaseError> {
        self.finish("COMMIT").await
    }

    pub async fn rollback(&self) -> Result<(), DatabaseError> {
        self.finish("ROLLBACK").await
    }

    // The pinned connection goes back to the pool even if the final
    // statement fails.
    async fn finish(&self, command: &str) -> Result<(), DatabaseError> {
        let mut conn = self.pinned.lock().await.take().ok_or_else(|| {
            DatabaseError::CallOrderViolation(format!(
                "{}() without begin()",
                command.to_lowercase()
            ))
        })?;
        conn.query(&Statement::new(format!("{command};"))).await?;
        info!("transaction {}", command.to_lowercase());
        Ok(())
    }
}

impl Drop for SqlSession {
    fn drop(&mut self) {
        if self.pinned.get_mut().is_some() {
            warn!("store dropped with an open transaction, connection released without COMMIT");
        }
    }
}
