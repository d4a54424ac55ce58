use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Unknown report type: {0}")]
    InvalidReportType(String),

    #[error("start and end dates are required for this report")]
    MissingDateRange,

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Upstream query failed: {0}")]
    Upstream(#[from] StoreError),

    #[error("Malformed row in {table}: {reason}")]
    MalformedRow { table: &'static str, reason: String },

    #[error("Unhandled error: {0}")]
    Unhandled(String),
}

impl AnalyticsError {
    /// True for errors caused by the request rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalyticsError::InvalidReportType(_)
                | AnalyticsError::MissingDateRange
                | AnalyticsError::InvalidDateRange(_)
                | AnalyticsError::InvalidParameter { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_errors_are_client_errors() {
        assert!(AnalyticsError::InvalidReportType("x".into()).is_client_error());
        assert!(AnalyticsError::MissingDateRange.is_client_error());
        assert!(AnalyticsError::InvalidParameter { name: "limit", reason: "0".into() }
            .is_client_error());
    }

    #[test]
    fn store_and_programming_errors_are_server_errors() {
        let upstream: AnalyticsError = StoreError::Timeout(30).into();
        assert!(!upstream.is_client_error());
        assert!(!AnalyticsError::Unhandled("panic".into()).is_client_error());
        assert!(!AnalyticsError::MalformedRow { table: "invoices", reason: "x".into() }
            .is_client_error());
    }
}
