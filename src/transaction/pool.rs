use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::executor::sql::Statement;
use crate::types::{DatabaseError, Row};

/// One live connection to the relational server.
///
/// Drivers implement this; the crate only ever sends complete statements
/// with positional parameters and reads rows back.
#[async_trait]
pub trait Connection: Send {
    async fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, DatabaseError>;
}

/// Source of connections. `release` hands a connection back and must not
/// block.
#[async_trait]
pub trait ConnectionPool: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn Connection>, DatabaseError>;
    fn release(&self, conn: Box<dyn Connection>);
}

/// A connection checked out of a pool, returned on drop.
///
/// Dropping covers every exit path of a terminal call, including errors
/// raised with `?` and futures cancelled mid-flight.
pub struct PooledConnection {
    conn: Option<Box<dyn Connection>>,
    pool: Arc<dyn ConnectionPool>,
}

impl PooledConnection {
    pub async fn acquire(pool: &Arc<dyn ConnectionPool>) -> Result<Self, DatabaseError> {
        let conn = pool.acquire().await?;
        trace!("connection acquired");
        Ok(Self {
            conn: Some(conn),
            pool: Arc::clone(pool),
        })
    }
}

#[async_trait]
impl Connection for PooledConnection {
    async fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, DatabaseError> {
        match self.conn.as_mut() {
            Some(conn) => conn.query(statement).await,
            None => Err(DatabaseError::Connection(
                "connection already released".to_string(),
            )),
        }
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
            trace!("connection released");
        }
    }
}
