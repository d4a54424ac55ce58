//! Typed records for every table the analytics engine reads.
//!
//! Rows arrive from the store as JSON objects. Each table gets one record
//! type with nullable columns modeled as `Option`, so a missing foreign key or
//! anchor timestamp is visible in the type instead of surfacing as a runtime
//! lookup failure halfway through an aggregation.

mod appointment;
mod audit;
mod consultation;
mod doctor;
mod invoice;
mod lab;
pub mod lenient;
mod message;
mod patient;
mod prescription;

pub use appointment::*;
pub use audit::*;
pub use consultation::*;
pub use doctor::*;
pub use invoice::*;
pub use lab::*;
pub use message::*;
pub use patient::*;
pub use prescription::*;

use serde::de::DeserializeOwned;

/// A table the analytics engine reads from.
pub trait Entity: DeserializeOwned + Send + Sync + 'static {
    /// Table name in the row store.
    const TABLE: &'static str;

    /// Timestamp column used for range scoping.
    /// `None` for tables that are only reached through joins.
    const ANCHOR: Option<&'static str>;

    /// Primary key.
    fn id(&self) -> &str;
}
