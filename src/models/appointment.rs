use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient, Entity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl Entity for Appointment {
    const TABLE: &'static str = "appointments";
    const ANCHOR: Option<&'static str> = Some("scheduled_at");

    fn id(&self) -> &str {
        &self.id
    }
}
