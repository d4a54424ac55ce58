use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient, Entity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub doctor_id: Option<String>,
}

impl Entity for Prescription {
    const TABLE: &'static str = "prescriptions";
    const ANCHOR: Option<&'static str> = Some("issued_at");

    fn id(&self) -> &str {
        &self.id
    }
}

/// One medication line on a prescription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionItem {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(deserialize_with = "lenient::id")]
    pub prescription_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub quantity: Option<f64>,
}

impl Entity for PrescriptionItem {
    const TABLE: &'static str = "prescription_items";
    const ANCHOR: Option<&'static str> = None;

    fn id(&self) -> &str {
        &self.id
    }
}
