//! One loader per report type.
//!
//! Loaders fetch and join through a [`RowFetcher`]; the `aggregate_*`
//! functions next to them are pure and hold the report semantics.

pub mod clinical;
pub mod finance;
pub mod operations;
pub mod patients;
pub mod pharmacy;

use super::error::AnalyticsError;
use super::fetch::RowFetcher;
use super::types::{ReportData, ReportParams, ReportType};

/// Runs the loader for `kind`.
pub async fn run(
    kind: ReportType,
    fetcher: &RowFetcher<'_>,
    params: &ReportParams,
) -> Result<ReportData, AnalyticsError> {
    let range = || {
        params
            .range
            .as_ref()
            .ok_or(AnalyticsError::MissingDateRange)
    };
    let limit = params.limit;
    let action_type = params.action_type.as_deref();
    let module = params.module.as_deref();

    let data = match kind {
        ReportType::PatientCount => ReportData::PatientCount(
            patients::patient_count(fetcher, params.range.as_ref()).await?,
        ),
        ReportType::TopDiagnoses => {
            ReportData::TopDiagnoses(clinical::top_diagnoses(fetcher, range()?, limit).await?)
        }
        ReportType::AppointmentStats => {
            ReportData::AppointmentStats(operations::appointment_stats(fetcher, range()?).await?)
        }
        ReportType::Revenue => ReportData::Revenue(
            finance::revenue(
                fetcher,
                range()?,
                params.organization_id.as_deref(),
                params.period,
                limit,
            )
            .await?,
        ),
        ReportType::DiagnosisByRegion => ReportData::DiagnosisByRegion(
            clinical::diagnosis_by_region(fetcher, range()?, limit).await?,
        ),
        ReportType::PharmacyMedications => ReportData::PharmacyMedications(
            pharmacy::pharmacy_medications(fetcher, range()?, limit).await?,
        ),
        ReportType::ConsultationDuration => ReportData::ConsultationDuration(
            clinical::consultation_duration(fetcher, range()?).await?,
        ),
        ReportType::PaymentMethods => ReportData::PaymentMethods(
            finance::payment_methods(fetcher, range()?, params.organization_id.as_deref(), limit)
                .await?,
        ),
        ReportType::LabResults => {
            ReportData::LabResults(clinical::lab_results(fetcher, range()?, limit).await?)
        }
        ReportType::PatientDemographics => ReportData::PatientDemographics(
            patients::patient_demographics(fetcher, range()?, params.now, limit).await?,
        ),
        ReportType::PatientGrowth => {
            ReportData::PatientGrowth(patients::patient_growth(fetcher, range()?, limit).await?)
        }
        ReportType::CommunicationMetrics => ReportData::CommunicationMetrics(
            operations::communication_metrics(fetcher, range()?, limit).await?,
        ),
        ReportType::AuditLogs => ReportData::AuditLogs(
            operations::audit_logs(fetcher, range()?, action_type, module, limit).await?,
        ),
        ReportType::ActionDistribution => ReportData::ActionDistribution(
            operations::action_distribution(fetcher, range()?, action_type, module, limit).await?,
        ),
    };
    Ok(data)
}

/// Whole-day window from `YYYY-MM-DD` bounds.
#[cfg(test)]
pub(crate) fn test_window(start: &str, end: &str) -> super::types::DateRange {
    use chrono::NaiveDate;

    let day = |raw: &str| NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap();
    super::types::DateRange {
        start: day(start).and_hms_opt(0, 0, 0).unwrap().and_utc(),
        end: day(end).and_hms_milli_opt(23, 59, 59, 999).unwrap().and_utc(),
    }
}
