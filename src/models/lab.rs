use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient, Entity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabResult {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default)]
    pub result_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_critical: bool,
    /// When the order was placed.
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    pub reported_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub ordering_provider_id: Option<String>,
}

impl Entity for LabResult {
    const TABLE: &'static str = "lab_results";
    const ANCHOR: Option<&'static str> = Some("created_at");

    fn id(&self) -> &str {
        &self.id
    }
}
