//! Sorting, limiting, rounding and label helpers shared by the aggregators.

use std::cmp::Ordering;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use super::types::Period;

const MONTHS_ES: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sep", "oct", "nov", "dic",
];

/// Stable descending sort on a numeric key. Ties keep their current order.
pub fn sort_desc_by<T, K, F>(items: &mut [T], key: F)
where
    K: PartialOrd,
    F: Fn(&T) -> K,
{
    items.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
}

/// Rounds half away from zero to `places` decimals.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Keeps the first `limit` items. No-op when `limit` is `None` or covers the list.
pub fn apply_limit<T>(mut items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}

/// `100 * part / total`, 0 when `total` is 0.
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

/// Mean of `values`, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Trimmed text, or `fallback` when missing or blank.
pub fn text_or(value: Option<&str>, fallback: &str) -> String {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Trimmed non-blank text, `None` otherwise.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// First day of the instant's calendar month (UTC).
pub fn month_start(instant: &DateTime<Utc>) -> NaiveDate {
    let date = instant.date_naive();
    date.with_day(1).unwrap_or(date)
}

/// `"ene 2024"`.
pub fn month_label(month: NaiveDate) -> String {
    let name = MONTHS_ES[month.month0() as usize];
    format!("{} {}", name, month.year())
}

/// `YYYY-MM-DD`.
pub fn day_label(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Bucket label of `instant` for the requested period.
pub fn period_label(instant: &DateTime<Utc>, period: Period) -> String {
    match period {
        Period::Day => day_label(instant.date_naive()),
        Period::Week => {
            let week = instant.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        Period::Month => instant.format("%Y-%m").to_string(),
        Period::Year => instant.format("%Y").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sort_is_descending_and_stable() {
        let mut rows = vec![("a", 2), ("b", 5), ("c", 2), ("d", 5)];
        sort_desc_by(&mut rows, |r| r.1);
        assert_eq!(rows, vec![("b", 5), ("d", 5), ("a", 2), ("c", 2)]);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_to(2.25, 1), 2.3);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(round_to(33.333_333, 2), 33.33);
    }

    #[test]
    fn limit_is_noop_when_larger() {
        assert_eq!(apply_limit(vec![1, 2, 3], Some(10)), vec![1, 2, 3]);
        assert_eq!(apply_limit(vec![1, 2, 3], Some(2)), vec![1, 2]);
        assert_eq!(apply_limit(vec![1, 2, 3], None), vec![1, 2, 3]);
    }

    #[test]
    fn percentage_of_empty_total_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
    }

    #[test]
    fn blank_text_falls_back() {
        assert_eq!(text_or(Some("  Gripe "), "x"), "Gripe");
        assert_eq!(text_or(Some("   "), "x"), "x");
        assert_eq!(text_or(None, "x"), "x");
    }

    #[test]
    fn month_labels_are_spanish() {
        let instant = Utc.with_ymd_and_hms(2024, 8, 17, 12, 0, 0).unwrap();
        let month = month_start(&instant);
        assert_eq!(month, NaiveDate::from_ymd_opt(2024, 8, 1).unwrap());
        assert_eq!(month_label(month), "ago 2024");
    }

    #[test]
    fn period_labels() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 3, 9, 30, 0).unwrap();
        assert_eq!(period_label(&instant, Period::Day), "2024-01-03");
        assert_eq!(period_label(&instant, Period::Week), "2024-W01");
        assert_eq!(period_label(&instant, Period::Month), "2024-01");
        assert_eq!(period_label(&instant, Period::Year), "2024");

        // ISO week-year differs from the calendar year at the boundary.
        let boundary = Utc.with_ymd_and_hms(2024, 12, 30, 0, 0, 0).unwrap();
        assert_eq!(period_label(&boundary, Period::Week), "2025-W01");
    }
}
