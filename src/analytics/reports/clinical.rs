//! Consultation and lab reports.

use std::collections::HashMap;

use chrono::NaiveDate;
use indexmap::IndexMap;

use crate::models::{Consultation, Doctor, LabResult, Patient, UnregisteredPatient};

use crate::analytics::error::AnalyticsError;
use crate::analytics::fetch::RowFetcher;
use crate::analytics::format::{
    apply_limit, month_label, month_start, non_blank, percentage, round_to, sort_desc_by, text_or,
};
use crate::analytics::join::{distinct_keys, lookup, DoctorDirectory, Enrichment};
use crate::analytics::stats::{
    days_between, minutes_between, summarize, CONSULTATION_MINUTES, LAB_TURNAROUND_DAYS,
};
use crate::analytics::types::{
    ConsultationDuration, DateRange, DiagnosisByRegion, DiagnosisFrequency, LabResultSummary,
    UNKNOWN, UNSPECIFIED_REGION, UNSPECIFIED_SPECIALTY,
};

// ═══════════════════════════════════════════════════════════════════════════
// top-diagnoses
// ═══════════════════════════════════════════════════════════════════════════

pub async fn top_diagnoses(
    fetcher: &RowFetcher<'_>,
    range: &DateRange,
    limit: Option<usize>,
) -> Result<Vec<DiagnosisFrequency>, AnalyticsError> {
    let query = RowFetcher::range_query::<Consultation>(range).not_null("diagnosis");
    let consultations: Vec<Consultation> = fetcher.fetch(query).await?;
    Ok(aggregate_top_diagnoses(&consultations, limit))
}

/// Frequency of each diagnosis with its share of all diagnosed consultations.
pub fn aggregate_top_diagnoses(
    consultations: &[Consultation],
    limit: Option<usize>,
) -> Vec<DiagnosisFrequency> {
    let mut groups: IndexMap<String, u64> = IndexMap::new();
    let mut total = 0u64;
    for diagnosis in consultations
        .iter()
        .filter_map(|c| non_blank(c.diagnosis.as_deref()))
    {
        *groups.entry(diagnosis.to_string()).or_insert(0) += 1;
        total += 1;
    }

    let mut rows: Vec<DiagnosisFrequency> = groups
        .into_iter()
        .map(|(diagnosis, count)| DiagnosisFrequency {
            diagnosis,
            count,
            percentage: round_to(percentage(count, total), 2),
        })
        .collect();

    sort_desc_by(&mut rows, |r| r.count);
    apply_limit(rows, limit)
}

// ═══════════════════════════════════════════════════════════════════════════
// diagnosis-by-region
// ═══════════════════════════════════════════════════════════════════════════

pub async fn diagnosis_by_region(
    fetcher: &RowFetcher<'_>,
    range: &DateRange,
    limit: Option<usize>,
) -> Result<Vec<DiagnosisByRegion>, AnalyticsError> {
    let consultations: Vec<Consultation> = fetcher.in_range(range).await?;

    let patient_ids = distinct_keys(consultations.iter().map(|c| c.patient_id.as_deref()));
    let walk_in_ids = distinct_keys(
        consultations
            .iter()
            .map(|c| c.unregistered_patient_id.as_deref()),
    );
    let doctor_ids = distinct_keys(consultations.iter().map(|c| c.doctor_id.as_deref()));

    let (patients, walk_ins, doctors) = tokio::try_join!(
        lookup::<Patient>(fetcher, &patient_ids, Enrichment::Required),
        lookup::<UnregisteredPatient>(fetcher, &walk_in_ids, Enrichment::Required),
        lookup::<Doctor>(fetcher, &doctor_ids, Enrichment::Required),
    )?;
    let directory = DoctorDirectory::load(fetcher, doctors).await?;

    let rows = aggregate_diagnosis_by_region(&consultations, &patients, &walk_ins, &directory);
    Ok(apply_limit(rows, limit))
}

/// Region of the consultation's patient, registered or walk-in.
fn consultation_region(
    consultation: &Consultation,
    patients: &HashMap<String, Patient>,
    walk_ins: &HashMap<String, UnregisteredPatient>,
) -> Option<String> {
    let registered = consultation
        .patient_id
        .as_deref()
        .and_then(|id| patients.get(id));
    let walk_in = consultation
        .unregistered_patient_id
        .as_deref()
        .and_then(|id| walk_ins.get(id))
        .map(|w| &w.0);
    registered.or(walk_in).and_then(Patient::region)
}

/// Cross-tab of region × diagnosis × specialty × month, months ascending,
/// busiest groups first within a month.
pub fn aggregate_diagnosis_by_region(
    consultations: &[Consultation],
    patients: &HashMap<String, Patient>,
    walk_ins: &HashMap<String, UnregisteredPatient>,
    directory: &DoctorDirectory,
) -> Vec<DiagnosisByRegion> {
    let mut groups: IndexMap<(String, String, String, NaiveDate), u64> = IndexMap::new();

    for consultation in consultations {
        let (Some(diagnosis), Some(created_at)) = (
            non_blank(consultation.diagnosis.as_deref()),
            consultation.created_at.as_ref(),
        ) else {
            continue;
        };

        let region = consultation_region(consultation, patients, walk_ins)
            .unwrap_or_else(|| UNSPECIFIED_REGION.to_string());
        let specialty = text_or(
            directory.specialty(consultation.doctor_id.as_deref()),
            UNSPECIFIED_SPECIALTY,
        );

        let key = (region, diagnosis.to_string(), specialty, month_start(created_at));
        *groups.entry(key).or_insert(0) += 1;
    }

    let mut entries: Vec<_> = groups.into_iter().collect();
    entries.sort_by(|(a, a_count), (b, b_count)| a.3.cmp(&b.3).then(b_count.cmp(a_count)));

    entries
        .into_iter()
        .map(|((region, diagnosis, specialty, month), count)| DiagnosisByRegion {
            region,
            diagnosis,
            specialty,
            month: month_label(month),
            count,
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// consultation-duration
// ═══════════════════════════════════════════════════════════════════════════

pub async fn consultation_duration(
    fetcher: &RowFetcher<'_>,
    range: &DateRange,
) -> Result<ConsultationDuration, AnalyticsError> {
    let query = RowFetcher::range_query::<Consultation>(range)
        .not_null("started_at")
        .not_null("ended_at");
    let consultations: Vec<Consultation> = fetcher.fetch(query).await?;
    Ok(aggregate_consultation_duration(&consultations))
}

pub fn aggregate_consultation_duration(consultations: &[Consultation]) -> ConsultationDuration {
    let samples = consultations.iter().filter_map(|c| {
        let (started, ended) = (c.started_at.as_ref()?, c.ended_at.as_ref()?);
        Some(minutes_between(started, ended))
    });
    let summary = summarize(samples, CONSULTATION_MINUTES);

    ConsultationDuration {
        avg_duration_minutes: summary.mean.round() as i64,
        median_duration_minutes: summary.median.round() as i64,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// lab-results
// ═══════════════════════════════════════════════════════════════════════════

pub async fn lab_results(
    fetcher: &RowFetcher<'_>,
    range: &DateRange,
    limit: Option<usize>,
) -> Result<Vec<LabResultSummary>, AnalyticsError> {
    let results: Vec<LabResult> = fetcher.in_range(range).await?;
    Ok(aggregate_lab_results(&results, limit))
}

#[derive(Default)]
struct LabAcc {
    orders: u64,
    critical: u64,
    turnaround_days: Vec<f64>,
}

/// Orders, critical flags and turnaround per result type, most ordered first.
pub fn aggregate_lab_results(results: &[LabResult], limit: Option<usize>) -> Vec<LabResultSummary> {
    let mut groups: IndexMap<String, LabAcc> = IndexMap::new();

    for result in results {
        let acc = groups
            .entry(text_or(result.result_type.as_deref(), UNKNOWN))
            .or_insert_with(LabAcc::default);
        acc.orders += 1;
        if result.is_critical {
            acc.critical += 1;
        }
        if let (Some(ordered), Some(reported)) = (&result.created_at, &result.reported_at) {
            acc.turnaround_days.push(days_between(ordered, reported));
        }
    }

    let mut rows: Vec<LabResultSummary> = groups
        .into_iter()
        .map(|(result_type, acc)| LabResultSummary {
            result_type,
            total_orders: acc.orders,
            critical_count: acc.critical,
            avg_turnaround_days: round_to(
                summarize(acc.turnaround_days, LAB_TURNAROUND_DAYS).mean,
                1,
            ),
        })
        .collect();

    sort_desc_by(&mut rows, |r| r.total_orders);
    apply_limit(rows, limit)
}
