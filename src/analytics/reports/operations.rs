//! Appointment, messaging and audit-trail reports.

use std::collections::BTreeMap;

use chrono::{NaiveDate, SecondsFormat};
use indexmap::IndexMap;

use crate::models::{Appointment, AuditLogEntry, Entity, Message};
use crate::store::RowQuery;

use crate::analytics::error::AnalyticsError;
use crate::analytics::fetch::RowFetcher;
use crate::analytics::format::{apply_limit, day_label, percentage, round_to, sort_desc_by, text_or};
use crate::analytics::stats::{minutes_between, summarize, RESPONSE_MINUTES};
use crate::analytics::types::{
    ActionCount, AuditLogView, CommunicationDay, DateRange, UNKNOWN,
};

// ═══════════════════════════════════════════════════════════════════════════
// appointment-stats
// ═══════════════════════════════════════════════════════════════════════════

pub async fn appointment_stats(
    fetcher: &RowFetcher<'_>,
    range: &DateRange,
) -> Result<BTreeMap<String, u64>, AnalyticsError> {
    let appointments: Vec<Appointment> = fetcher.in_range(range).await?;
    Ok(aggregate_appointment_stats(&appointments))
}

pub fn aggregate_appointment_stats(appointments: &[Appointment]) -> BTreeMap<String, u64> {
    let mut by_status = BTreeMap::new();
    for appointment in appointments {
        *by_status
            .entry(text_or(appointment.status.as_deref(), UNKNOWN))
            .or_default() += 1;
    }
    by_status
}

// ═══════════════════════════════════════════════════════════════════════════
// communication-metrics
// ═══════════════════════════════════════════════════════════════════════════

pub async fn communication_metrics(
    fetcher: &RowFetcher<'_>,
    range: &DateRange,
    limit: Option<usize>,
) -> Result<Vec<CommunicationDay>, AnalyticsError> {
    let messages: Vec<Message> = fetcher.in_range(range).await?;
    Ok(apply_limit(aggregate_communication(&messages), limit))
}

#[derive(Default)]
struct DayAcc {
    sent: u64,
    read: u64,
    response_minutes: Vec<f64>,
}

/// Per-day message volume, read rate and response time, oldest day first.
pub fn aggregate_communication(messages: &[Message]) -> Vec<CommunicationDay> {
    let mut days: BTreeMap<NaiveDate, DayAcc> = BTreeMap::new();

    for message in messages {
        let Some(sent_at) = message.created_at.as_ref() else {
            continue;
        };
        let acc = days.entry(sent_at.date_naive()).or_default();
        acc.sent += 1;
        if message.read {
            acc.read += 1;
        }
        if let Some(read_at) = message.read_at.as_ref() {
            acc.response_minutes.push(minutes_between(sent_at, read_at));
        }
    }

    days.into_iter()
        .map(|(day, acc)| CommunicationDay {
            date: day_label(day),
            messages_sent: acc.sent,
            response_rate: round_to(percentage(acc.read, acc.sent), 1),
            avg_response_time_minutes: round_to(
                summarize(acc.response_minutes, RESPONSE_MINUTES).mean,
                1,
            ),
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// audit-logs / action-distribution
// ═══════════════════════════════════════════════════════════════════════════

/// Audit entries in range with the optional action/module filters applied.
fn audit_query(range: &DateRange, action_type: Option<&str>, module: Option<&str>) -> RowQuery {
    let mut query =
        RowQuery::table(AuditLogEntry::TABLE).within("created_at", range.start, range.end);
    if let Some(action) = action_type {
        query = query.eq("action_type", action);
    }
    if let Some(module) = module {
        query = query.eq("entity_type", module);
    }
    query
}

pub async fn audit_logs(
    fetcher: &RowFetcher<'_>,
    range: &DateRange,
    action_type: Option<&str>,
    module: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<AuditLogView>, AnalyticsError> {
    // Newest first, and only as many rows as will be returned.
    let mut query = audit_query(range, action_type, module)
        .order_by("created_at", true)
        .order_by("id", true);
    if let Some(limit) = limit {
        query = query.limit(limit);
    }

    let entries: Vec<AuditLogEntry> = fetcher.fetch(query).await?;
    Ok(list_audit_logs(entries, limit))
}

/// Newest entries first, truncated to `limit`. No aggregation.
pub fn list_audit_logs(mut entries: Vec<AuditLogEntry>, limit: Option<usize>) -> Vec<AuditLogView> {
    sort_desc_by(&mut entries, |e| e.created_at);
    apply_limit(entries, limit)
        .into_iter()
        .map(|entry| AuditLogView {
            details: audit_details(&entry),
            timestamp: entry
                .created_at
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
                .unwrap_or_default(),
            id: entry.id,
            user_name: text_or(entry.user_name.as_deref(), UNKNOWN),
            action_type: text_or(entry.action_type.as_deref(), UNKNOWN),
            module: text_or(entry.entity_type.as_deref(), UNKNOWN),
        })
        .collect()
}

/// The description, else the serialized metadata, else empty.
fn audit_details(entry: &AuditLogEntry) -> String {
    if let Some(description) = entry.description.as_deref().filter(|d| !d.trim().is_empty()) {
        return description.to_string();
    }
    match &entry.metadata {
        Some(metadata) if !metadata.is_null() => metadata.to_string(),
        _ => String::new(),
    }
}

pub async fn action_distribution(
    fetcher: &RowFetcher<'_>,
    range: &DateRange,
    action_type: Option<&str>,
    module: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<ActionCount>, AnalyticsError> {
    let query = audit_query(range, action_type, module)
        .order_by("created_at", false)
        .order_by("id", false);
    let entries: Vec<AuditLogEntry> = fetcher.fetch(query).await?;
    Ok(apply_limit(aggregate_action_distribution(&entries), limit))
}

/// Entries per action type, most frequent first.
pub fn aggregate_action_distribution(entries: &[AuditLogEntry]) -> Vec<ActionCount> {
    let mut groups: IndexMap<String, u64> = IndexMap::new();
    for entry in entries {
        *groups.entry(text_or(entry.action_type.as_deref(), UNKNOWN)).or_insert(0) += 1;
    }

    let mut rows: Vec<ActionCount> = groups
        .into_iter()
        .map(|(action_type, count)| ActionCount { action_type, count })
        .collect();
    sort_desc_by(&mut rows, |r| r.count);
    rows
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn label(options: &[&'static str]) -> impl Strategy<Value = Option<&'static str>> {
        prop::option::of(prop::sample::select(options.to_vec()))
    }

    proptest! {
        /// Every appointment lands in exactly one status bucket.
        #[test]
        fn status_counts_sum_to_row_count(
            statuses in prop::collection::vec(
                label(&["scheduled", "completed", "cancelled", "no_show"]),
                0..80,
            )
        ) {
            let rows: Vec<_> = statuses
                .iter()
                .enumerate()
                .map(|(i, status)| json!({"id": i, "status": status}))
                .collect();
            let appointments: Vec<Appointment> =
                serde_json::from_value(serde_json::Value::Array(rows)).unwrap();

            let stats = aggregate_appointment_stats(&appointments);
            prop_assert_eq!(stats.values().sum::<u64>(), statuses.len() as u64);
            prop_assert!(stats.values().all(|count| *count > 0));
        }

        #[test]
        fn action_counts_sum_and_descend(
            actions in prop::collection::vec(
                label(&["create", "update", "delete", "login"]),
                0..80,
            )
        ) {
            let rows: Vec<_> = actions
                .iter()
                .enumerate()
                .map(|(i, action)| json!({"id": i, "action_type": action}))
                .collect();
            let entries: Vec<AuditLogEntry> =
                serde_json::from_value(serde_json::Value::Array(rows)).unwrap();

            let distribution = aggregate_action_distribution(&entries);
            prop_assert_eq!(
                distribution.iter().map(|r| r.count).sum::<u64>(),
                actions.len() as u64
            );
            prop_assert!(distribution.windows(2).all(|w| w[0].count >= w[1].count));
        }
    }
}
