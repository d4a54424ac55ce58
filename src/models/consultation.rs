use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient, Entity};

/// A consultation. Exactly one of `patient_id` / `unregistered_patient_id`
/// is normally set; walk-in visits use the unregistered table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub patient_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub unregistered_patient_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub doctor_id: Option<String>,
}

impl Entity for Consultation {
    const TABLE: &'static str = "consultations";
    const ANCHOR: Option<&'static str> = Some("created_at");

    fn id(&self) -> &str {
        &self.id
    }
}
