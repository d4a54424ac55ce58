//! Patient population reports.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;

use crate::models::{Entity, Patient};
use crate::store::RowQuery;

use crate::analytics::error::AnalyticsError;
use crate::analytics::fetch::RowFetcher;
use crate::analytics::format::{apply_limit, month_label, month_start, sort_desc_by, text_or};
use crate::analytics::types::{
    DateRange, DemographicGroup, GrowthPoint, PatientCount, UNKNOWN, UNSPECIFIED_GENDER,
    UNSPECIFIED_REGION,
};

const DAYS_PER_YEAR: f64 = 365.25;

/// Upper bounds (exclusive) of each age bucket; anything above is "75+".
const AGE_BUCKETS: [(i64, &str); 5] = [
    (18, "0-17"),
    (30, "18-29"),
    (45, "30-44"),
    (60, "45-59"),
    (75, "60-74"),
];

// ── patient-count ──────────────────────────────────────────────────────────

/// Registered patients, created in `range` when one is given.
pub async fn patient_count(
    fetcher: &RowFetcher<'_>,
    range: Option<&DateRange>,
) -> Result<PatientCount, AnalyticsError> {
    let query = match range {
        Some(range) => RowFetcher::range_query::<Patient>(range),
        None => RowQuery::table(Patient::TABLE),
    };
    Ok(PatientCount {
        count: fetcher.count(query).await?,
    })
}

// ── patient-demographics ───────────────────────────────────────────────────

pub async fn patient_demographics(
    fetcher: &RowFetcher<'_>,
    range: &DateRange,
    now: DateTime<Utc>,
    limit: Option<usize>,
) -> Result<Vec<DemographicGroup>, AnalyticsError> {
    let patients: Vec<Patient> = fetcher.in_range(range).await?;
    Ok(apply_limit(aggregate_demographics(&patients, now), limit))
}

/// Whole years between `dob` and `today`, never negative.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i64 {
    let days = (today - dob).num_days();
    ((days as f64 / DAYS_PER_YEAR).floor() as i64).max(0)
}

pub fn age_group(age: i64) -> &'static str {
    AGE_BUCKETS
        .iter()
        .find(|(upper, _)| age < *upper)
        .map(|(_, label)| *label)
        .unwrap_or("75+")
}

/// Patients per (age group, gender, region), largest groups first.
pub fn aggregate_demographics(patients: &[Patient], now: DateTime<Utc>) -> Vec<DemographicGroup> {
    let today = now.date_naive();
    let mut groups: IndexMap<(&'static str, String, String), u64> = IndexMap::new();

    for patient in patients {
        let bucket = match patient.dob {
            Some(dob) => age_group(age_on(dob, today)),
            None => UNKNOWN,
        };
        let gender = text_or(patient.gender.as_deref(), UNSPECIFIED_GENDER);
        let region = text_or(patient.region().as_deref(), UNSPECIFIED_REGION);
        *groups.entry((bucket, gender, region)).or_insert(0) += 1;
    }

    let mut rows: Vec<DemographicGroup> = groups
        .into_iter()
        .map(|((age_group, gender, region), count)| DemographicGroup {
            age_group: age_group.to_string(),
            gender,
            count,
            region,
        })
        .collect();

    sort_desc_by(&mut rows, |r| r.count);
    rows
}

// ── patient-growth ─────────────────────────────────────────────────────────

pub async fn patient_growth(
    fetcher: &RowFetcher<'_>,
    range: &DateRange,
    limit: Option<usize>,
) -> Result<Vec<GrowthPoint>, AnalyticsError> {
    let patients: Vec<Patient> = fetcher.in_range(range).await?;
    Ok(apply_limit(aggregate_growth(&patients), limit))
}

/// New registrations per month with a running total, oldest month first.
pub fn aggregate_growth(patients: &[Patient]) -> Vec<GrowthPoint> {
    let mut months: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for created in patients.iter().filter_map(|p| p.created_at.as_ref()) {
        *months.entry(month_start(created)).or_default() += 1;
    }

    let mut running = 0;
    months
        .into_iter()
        .map(|(month, new_patients)| {
            running += new_patients;
            GrowthPoint {
                month: month_label(month),
                new_patients,
                total_patients: running,
            }
        })
        .collect()
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use serde_json::json;

    fn registrations(days: &[Option<i64>]) -> Vec<Patient> {
        let origin = Utc.with_ymd_and_hms(2023, 1, 1, 8, 0, 0).unwrap();
        let rows: Vec<_> = days
            .iter()
            .enumerate()
            .map(|(i, day)| {
                json!({
                    "id": i,
                    "created_at": day.map(|d| (origin + Duration::days(d)).to_rfc3339()),
                })
            })
            .collect();
        serde_json::from_value(serde_json::Value::Array(rows)).unwrap()
    }

    proptest! {
        #[test]
        fn growth_is_monotone_and_ends_at_row_count(
            days in prop::collection::vec(prop::option::of(0i64..730), 0..100)
        ) {
            let points = aggregate_growth(&registrations(&days));
            let dated = days.iter().filter(|d| d.is_some()).count() as u64;

            prop_assert!(points.windows(2).all(|w| w[0].total_patients <= w[1].total_patients));
            prop_assert_eq!(points.last().map_or(0, |p| p.total_patients), dated);
            prop_assert_eq!(points.iter().map(|p| p.new_patients).sum::<u64>(), dated);
        }

        #[test]
        fn demographics_count_every_patient(
            days in prop::collection::vec(prop::option::of(0i64..730), 0..100)
        ) {
            let patients = registrations(&days);
            let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
            let groups = aggregate_demographics(&patients, now);

            prop_assert_eq!(
                groups.iter().map(|g| g.count).sum::<u64>(),
                patients.len() as u64
            );
        }
    }
}
