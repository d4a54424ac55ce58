use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{lenient, Entity};

/// Address keys that carry the region when the address is stored as an object.
const REGION_KEYS: &[&str] = &["region", "state", "estado", "provincia"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::optional_date")]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    /// Free text ("Calle 1, Guadalajara, Jalisco") or a JSON object.
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Patient {
    /// Region extracted from the address, if any.
    pub fn region(&self) -> Option<String> {
        self.address.as_ref().and_then(region_from_address)
    }
}

impl Entity for Patient {
    const TABLE: &'static str = "patients";
    const ANCHOR: Option<&'static str> = Some("created_at");

    fn id(&self) -> &str {
        &self.id
    }
}

/// Walk-in patient without a full record. Same columns, separate table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnregisteredPatient(pub Patient);

impl Entity for UnregisteredPatient {
    const TABLE: &'static str = "unregistered_patients";
    const ANCHOR: Option<&'static str> = Some("created_at");

    fn id(&self) -> &str {
        &self.0.id
    }
}

/// Object addresses use the first known region key; text addresses use the
/// last non-empty comma-separated segment.
pub fn region_from_address(address: &Value) -> Option<String> {
    match address {
        Value::Object(map) => REGION_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .filter_map(lenient::scalar_text)
            .map(|s| s.trim().to_string())
            .find(|s| !s.is_empty()),
        Value::String(text) => text
            .rsplit(',')
            .map(str::trim)
            .find(|segment| !segment.is_empty())
            .map(str::to_string),
        _ => None,
    }
}
