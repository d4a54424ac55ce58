//! HTTP surface of the analytics engine.
//!
//! Routes are nested under `/api/`. Every response passes through the
//! access log; the report endpoint is read-only and open to any origin.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::analytics_router;
pub use server::{AnalyticsServer, ServerError};
pub use types::ApiContext;
