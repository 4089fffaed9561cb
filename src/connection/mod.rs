//! Remote execution surface
//!
//! The bridge never opens connections itself; callers hand a [`Connection`]
//! to a [`GraphHandle`](crate::graph::GraphHandle). Implemented by:
//! - [`MemoryConnection`]: in-process store, for tests and embedded use
//! - a driver for the remote store, supplied by the caller
//!
//! A connection is stateful and not safe for concurrent use; statements and
//! row streams borrow it for their whole lifetime.

pub mod memory;

pub use memory::{ExecutedStatement, Faults, MemoryConnection, MemoryProbe};

pub use crate::codec::{NativeValue, Param};

use std::time::Duration;
use thiserror::Error;

/// Connection errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The store rejected or failed a statement
    #[error("Statement error: {0}")]
    Statement(String),

    /// Parameter binding mismatch
    #[error("Bind error: {0}")]
    Bind(String),

    /// Commit/rollback/autocommit failure
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Statement was cancelled while in flight
    #[error("Statement cancelled")]
    Cancelled,

    /// Connection already closed
    #[error("Connection closed")]
    Closed,
}

pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// Per-statement resource settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementOptions {
    /// Rows fetched per network round trip
    pub fetch_size: u32,
    /// Remote execution limit; `None` = no limit
    pub query_timeout: Option<Duration>,
}

impl Default for StatementOptions {
    fn default() -> Self {
        Self {
            fetch_size: 200,
            query_timeout: None,
        }
    }
}

/// Transaction isolation levels the bridge asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isolation {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

/// Forward-only stream of result rows
pub trait RowStream {
    /// Column labels, in projection order
    fn columns(&self) -> &[String];

    /// Next row, or `None` once the stream is exhausted
    fn next_row(&mut self) -> ConnectionResult<Option<Vec<NativeValue>>>;

    /// Best-effort cancellation of the statement still producing rows
    fn cancel(&mut self) -> ConnectionResult<()>;

    /// Release the remote cursor
    fn close(&mut self) -> ConnectionResult<()>;
}

/// Statement with positional (1-based) parameters and batch accumulation
pub trait PreparedStatement {
    fn bind(&mut self, index: usize, value: Param) -> ConnectionResult<()>;

    /// Snapshot the current bindings as one batch entry
    fn add_batch(&mut self) -> ConnectionResult<()>;

    /// Run every accumulated entry as one unit; returns the entry count
    fn execute_batch(&mut self) -> ConnectionResult<usize>;

    fn clear_batch(&mut self);

    /// Run once with the current bindings
    fn execute(&mut self) -> ConnectionResult<()>;

    /// Run once with the current bindings and stream the result
    fn query(&mut self) -> ConnectionResult<Box<dyn RowStream + '_>>;
}

/// Open, stateful connection to the remote store
pub trait Connection {
    /// Execute a statement that returns no rows
    fn execute(&mut self, sql: &str, options: &StatementOptions) -> ConnectionResult<()>;

    /// Execute a statement and stream its rows
    fn query(&mut self, sql: &str, options: &StatementOptions) -> ConnectionResult<Box<dyn RowStream + '_>>;

    /// Prepare a parameterized statement
    fn prepare(&mut self, sql: &str, options: &StatementOptions) -> ConnectionResult<Box<dyn PreparedStatement + '_>>;

    fn auto_commit(&self) -> ConnectionResult<bool>;

    fn set_auto_commit(&mut self, enabled: bool) -> ConnectionResult<()>;

    fn commit(&mut self) -> ConnectionResult<()>;

    fn rollback(&mut self) -> ConnectionResult<()>;

    /// Whether the store supports explicit multi-statement transactions
    fn supports_transactions(&self) -> ConnectionResult<bool>;

    fn isolation(&self) -> ConnectionResult<Isolation>;

    fn set_isolation(&mut self, level: Isolation) -> ConnectionResult<()>;

    /// Release the connection; later calls fail with [`ConnectionError::Closed`]
    fn close(&mut self) -> ConnectionResult<()>;
}
