use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient, Entity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub read: bool,
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    pub read_at: Option<DateTime<Utc>>,
}

impl Entity for Message {
    const TABLE: &'static str = "messages";
    const ANCHOR: Option<&'static str> = Some("created_at");

    fn id(&self) -> &str {
        &self.id
    }
}
