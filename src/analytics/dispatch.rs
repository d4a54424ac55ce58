use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use futures_util::FutureExt;

use crate::models::lenient::parse_timestamp;
use crate::store::RowStore;

use super::error::AnalyticsError;
use super::fetch::RowFetcher;
use super::format::non_blank;
use super::reports;
use super::types::{
    DateRange, Period, ReportContext, ReportData, ReportParams, ReportRequest, ReportType,
};

/// Entry point of the analytics engine: request in, finished report out.
///
/// Read-only and stateless between calls. Does not log; callers decide how
/// to surface errors.
#[derive(Clone)]
pub struct ReportDispatcher {
    store: Arc<dyn RowStore>,
}

impl ReportDispatcher {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    pub async fn dispatch(
        &self,
        request: &ReportRequest,
        ctx: &ReportContext,
    ) -> Result<ReportData, AnalyticsError> {
        let kind: ReportType = request.report_type.parse()?;
        let params = validate(kind, request, ctx)?;
        let fetcher = RowFetcher::new(self.store.as_ref());

        match AssertUnwindSafe(reports::run(kind, &fetcher, &params))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => Err(AnalyticsError::Unhandled(panic_message(payload.as_ref()))),
        }
    }
}

/// Checks the request against what `kind` needs and fills in defaults.
pub fn validate(
    kind: ReportType,
    request: &ReportRequest,
    ctx: &ReportContext,
) -> Result<ReportParams, AnalyticsError> {
    let start = non_blank(request.start.as_deref());
    let end = non_blank(request.end.as_deref());

    let range = match (start, end) {
        (Some(start), Some(end)) => {
            let range = DateRange {
                start: parse_bound("start", start, false)?,
                end: parse_bound("end", end, true)?,
            };
            if range.start > range.end {
                return Err(AnalyticsError::InvalidDateRange(format!(
                    "start {start} is after end {end}"
                )));
            }
            Some(range)
        }
        (None, None) if !kind.requires_range() => None,
        _ => return Err(AnalyticsError::MissingDateRange),
    };

    if request.limit == Some(0) {
        return Err(AnalyticsError::InvalidParameter {
            name: "limit",
            reason: "must be at least 1".into(),
        });
    }

    let period = match non_blank(request.period.as_deref()) {
        Some(raw) => raw.parse::<Period>()?,
        None => Period::default(),
    };

    Ok(ReportParams {
        range,
        limit: request.limit.or(kind.default_limit()),
        organization_id: non_blank(request.organization_id.as_deref()).map(str::to_string),
        period,
        action_type: non_blank(request.action_type.as_deref()).map(str::to_string),
        module: non_blank(request.module.as_deref()).map(str::to_string),
        now: ctx.now,
    })
}

/// Date-only bounds cover the whole day: midnight for `start`,
/// the last millisecond for `end`.
fn parse_bound(
    name: &'static str,
    raw: &str,
    end_of_day: bool,
) -> Result<DateTime<Utc>, AnalyticsError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let bound = if end_of_day {
            date.and_hms_milli_opt(23, 59, 59, 999)
        } else {
            date.and_hms_opt(0, 0, 0)
        };
        if let Some(bound) = bound {
            return Ok(bound.and_utc());
        }
    }
    parse_timestamp(raw)
        .ok_or_else(|| AnalyticsError::InvalidDateRange(format!("{name} is not a date: {raw}")))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "aggregation panicked".to_string()
    }
}
