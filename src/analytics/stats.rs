//! Filtered statistics over timestamp deltas.
//!
//! Each metric has a plausibility window; samples on or outside either bound
//! are dropped before the mean and median are taken. The median is the
//! element at index `n / 2` of the sorted samples, with no interpolation:
//! for even `n` that is the second of the two middle values.

use chrono::{DateTime, Utc};

/// Open interval `(min, max)` of plausible sample values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlausibleRange {
    pub min: f64,
    pub max: f64,
}

impl PlausibleRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn admits(&self, value: f64) -> bool {
        value > self.min && value < self.max
    }
}

/// Consultation length in minutes.
pub const CONSULTATION_MINUTES: PlausibleRange = PlausibleRange::new(0.0, 480.0);
/// Lab order-to-report time in days.
pub const LAB_TURNAROUND_DAYS: PlausibleRange = PlausibleRange::new(0.0, 365.0);
/// Message send-to-read time in minutes (one week).
pub const RESPONSE_MINUTES: PlausibleRange = PlausibleRange::new(0.0, 10_080.0);

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    /// Samples kept after filtering.
    pub count: usize,
    pub mean: f64,
    pub median: f64,
}

/// Filters `samples` through `range`, then summarizes what is left.
/// All fields are 0 when nothing survives.
pub fn summarize<I>(samples: I, range: PlausibleRange) -> Summary
where
    I: IntoIterator<Item = f64>,
{
    let mut kept: Vec<f64> = samples.into_iter().filter(|v| range.admits(*v)).collect();
    if kept.is_empty() {
        return Summary::default();
    }

    kept.sort_by(|a, b| a.total_cmp(b));
    let count = kept.len();
    Summary {
        count,
        mean: kept.iter().sum::<f64>() / count as f64,
        median: kept[count / 2],
    }
}

pub fn minutes_between(from: &DateTime<Utc>, to: &DateTime<Utc>) -> f64 {
    (*to - *from).num_milliseconds() as f64 / 60_000.0
}

pub fn days_between(from: &DateTime<Utc>, to: &DateTime<Utc>) -> f64 {
    (*to - *from).num_milliseconds() as f64 / 86_400_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn bounds_are_exclusive() {
        assert!(!CONSULTATION_MINUTES.admits(0.0));
        assert!(CONSULTATION_MINUTES.admits(1.0));
        assert!(CONSULTATION_MINUTES.admits(479.0));
        assert!(!CONSULTATION_MINUTES.admits(480.0));
        assert!(!LAB_TURNAROUND_DAYS.admits(365.0));
        assert!(!RESPONSE_MINUTES.admits(-3.0));
    }

    #[test]
    fn median_takes_index_n_over_two() {
        let summary = summarize([40.0, 10.0, 30.0, 20.0], CONSULTATION_MINUTES);
        assert_eq!(summary.median, 30.0);
        assert_eq!(summary.mean, 25.0);
        assert_eq!(summary.count, 4);
    }

    #[test]
    fn odd_count_median_is_middle() {
        let summary = summarize([5.0, 1.0, 3.0], CONSULTATION_MINUTES);
        assert_eq!(summary.median, 3.0);
    }

    #[test]
    fn filtered_out_samples_do_not_count() {
        let summary = summarize([0.0, 480.0, 600.0, -1.0, 60.0], CONSULTATION_MINUTES);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.mean, 60.0);
    }

    #[test]
    fn nothing_kept_is_all_zero() {
        assert_eq!(summarize([0.0, 500.0], CONSULTATION_MINUTES), Summary::default());
        assert_eq!(summarize(Vec::new(), LAB_TURNAROUND_DAYS), Summary::default());
    }

    #[test]
    fn deltas_in_minutes_and_days() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        assert_eq!(minutes_between(&start, &(start + Duration::minutes(45))), 45.0);
        assert_eq!(days_between(&start, &(start + Duration::hours(36))), 1.5);
        assert!(minutes_between(&(start + Duration::minutes(5)), &start) < 0.0);
    }
}
