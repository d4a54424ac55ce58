use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AnalyticsError;

// ── Sentinels ──────────────────────────────────────────────────────────────

pub const UNSPECIFIED_REGION: &str = "Sin región";
pub const UNSPECIFIED_SPECIALTY: &str = "Sin especialidad";
pub const UNSPECIFIED_GENDER: &str = "No especificado";
pub const UNKNOWN: &str = "Desconocido";

// ── Dispatch keys ──────────────────────────────────────────────────────────

/// Enum with a fixed wire spelling and a `FromStr` that reports unknown
/// values through `$unknown`.
macro_rules! str_enum {
    (
        $(#[$attr:meta])*
        $name:ident, $unknown:ident {
            $($(#[$vattr:meta])* $variant:ident => $s:literal),+ $(,)?
        }
    ) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $(#[$attr])*
        pub enum $name {
            $($(#[$vattr])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = AnalyticsError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($s => Ok(Self::$variant)),+,
                    other => Err($unknown(other)),
                }
            }
        }
    };
}

str_enum!(ReportType, unknown_report_type {
    TopDiagnoses => "top-diagnoses",
    AppointmentStats => "appointment-stats",
    Revenue => "revenue",
    PatientCount => "patient-count",
    DiagnosisByRegion => "diagnosis-by-region",
    PharmacyMedications => "pharmacy-medications",
    ConsultationDuration => "consultation-duration",
    PaymentMethods => "payment-methods",
    LabResults => "lab-results",
    PatientDemographics => "patient-demographics",
    PatientGrowth => "patient-growth",
    CommunicationMetrics => "communication-metrics",
    AuditLogs => "audit-logs",
    ActionDistribution => "action-distribution",
});

str_enum!(#[derive(Default)] Period, unknown_period {
    Day => "day",
    Week => "week",
    #[default]
    Month => "month",
    Year => "year",
});

fn unknown_report_type(raw: &str) -> AnalyticsError {
    AnalyticsError::InvalidReportType(raw.to_string())
}

fn unknown_period(raw: &str) -> AnalyticsError {
    AnalyticsError::InvalidParameter {
        name: "period",
        reason: format!("expected day, week, month or year, got {raw:?}"),
    }
}

impl ReportType {
    /// Reports that read a time window and therefore need `start`/`end`.
    pub fn requires_range(&self) -> bool {
        !matches!(self, ReportType::PatientCount)
    }

    pub fn default_limit(&self) -> Option<usize> {
        match self {
            ReportType::PharmacyMedications => Some(20),
            ReportType::AuditLogs => Some(100),
            _ => None,
        }
    }
}

// ── Requests ───────────────────────────────────────────────────────────────

/// Inclusive `[start, end]` window supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Raw report request as received from the caller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportRequest {
    pub report_type: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub limit: Option<usize>,
    /// Already-authenticated tenant scope.
    pub organization_id: Option<String>,
    pub period: Option<String>,
    pub action_type: Option<String>,
    pub module: Option<String>,
}

/// Validated parameters handed to the report loaders.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportParams {
    pub range: Option<DateRange>,
    pub limit: Option<usize>,
    pub organization_id: Option<String>,
    pub period: Period,
    pub action_type: Option<String>,
    pub module: Option<String>,
    /// Reference instant for age computation.
    pub now: DateTime<Utc>,
}

/// Per-call context injected by the host.
#[derive(Debug, Clone, Copy)]
pub struct ReportContext {
    pub now: DateTime<Utc>,
}

impl ReportContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn current() -> Self {
        Self::at(Utc::now())
    }
}

// ── Results ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisFrequency {
    pub diagnosis: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueByPeriod {
    pub period: String,
    pub currency: String,
    pub total_revenue: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientCount {
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisByRegion {
    pub region: String,
    pub diagnosis: String,
    pub specialty: String,
    pub month: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationBySpecialty {
    pub specialty: String,
    pub medication: String,
    pub total_prescriptions: u64,
    pub avg_quantity: f64,
    pub common_dosages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationDuration {
    pub avg_duration_minutes: i64,
    pub median_duration_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodTotal {
    pub method: String,
    pub count: u64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabResultSummary {
    pub result_type: String,
    pub total_orders: u64,
    pub critical_count: u64,
    pub avg_turnaround_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicGroup {
    pub age_group: String,
    pub gender: String,
    pub count: u64,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthPoint {
    pub month: String,
    pub new_patients: u64,
    pub total_patients: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationDay {
    pub date: String,
    pub messages_sent: u64,
    pub response_rate: f64,
    pub avg_response_time_minutes: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogView {
    pub id: String,
    pub user_name: String,
    pub action_type: String,
    pub module: String,
    pub timestamp: String,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCount {
    pub action_type: String,
    pub count: u64,
}

/// Finished result of one report. Serializes as the bare payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportData {
    TopDiagnoses(Vec<DiagnosisFrequency>),
    AppointmentStats(BTreeMap<String, u64>),
    Revenue(Vec<RevenueByPeriod>),
    PatientCount(PatientCount),
    DiagnosisByRegion(Vec<DiagnosisByRegion>),
    PharmacyMedications(Vec<MedicationBySpecialty>),
    ConsultationDuration(ConsultationDuration),
    PaymentMethods(Vec<PaymentMethodTotal>),
    LabResults(Vec<LabResultSummary>),
    PatientDemographics(Vec<DemographicGroup>),
    PatientGrowth(Vec<GrowthPoint>),
    CommunicationMetrics(Vec<CommunicationDay>),
    AuditLogs(Vec<AuditLogView>),
    ActionDistribution(Vec<ActionCount>),
}

/// Success envelope: `{ "data": ... }`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEnvelope {
    pub data: ReportData,
}
