// Transaction module - connection scopes and pinned transactions

mod pool;
mod session;

pub use pool::{Connection, ConnectionPool, PooledConnection};
pub use session::{ConnectionScope, SqlSession};
