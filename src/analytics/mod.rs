//! Analytics aggregation engine.
//!
//! Turns flat single-table row sets into dashboard reports. The store can
//! only filter rows, so joins, grouping and statistics all happen here:
//!
//! - [`fetch`]: typed, range-scoped reads ([`RowFetcher`])
//! - [`join`]: distinct keys → one `IN` fetch → index → attach
//! - [`reports`]: one loader and one pure aggregator per report type
//! - [`format`] / [`stats`]: shared sort, limit, rounding and filtered statistics
//! - [`dispatch`]: request validation and routing ([`ReportDispatcher`])

pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod format;
pub mod join;
pub mod reports;
pub mod stats;
pub mod types;

pub use dispatch::ReportDispatcher;
pub use error::AnalyticsError;
pub use fetch::RowFetcher;
pub use join::Enrichment;
pub use types::{
    DateRange, Period, ReportContext, ReportData, ReportEnvelope, ReportRequest, ReportType,
};
