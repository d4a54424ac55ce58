//! Row store boundary.
//!
//! The backing store only answers flat, single-table questions: equality and
//! membership filters, one inclusive range on a timestamp column, ordering,
//! and counts. No joins, no server-side aggregates. Everything richer is done
//! by the analytics engine in memory.

mod memory;
mod query;
mod rest;

pub use memory::MemoryStore;
pub use query::*;
pub use rest::RestStore;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Row store unreachable at {0}")]
    Connection(String),

    #[error("Row store request timed out after {0}s")]
    Timeout(u64),

    #[error("Row store returned error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("Row store response could not be decoded: {0}")]
    Decode(String),

    #[error("Row store response is missing {0}")]
    InvalidResponse(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

/// Read access to the row store.
///
/// Implementations return an empty vector, never an error, when nothing
/// matches.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Rows of `query.table` matching every predicate of `query`.
    async fn select(&self, query: &RowQuery) -> Result<Vec<Value>, StoreError>;

    /// Number of rows matching `query`. Ordering and limit are ignored.
    async fn count(&self, query: &RowQuery) -> Result<u64, StoreError>;
}
