use serde::{Deserialize, Serialize};

use super::{lenient, Entity};

/// A user acting as a doctor. Specialty lives on [`MedicProfile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl Entity for Doctor {
    const TABLE: &'static str = "users";
    const ANCHOR: Option<&'static str> = None;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicProfile {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub specialty: Option<String>,
}

impl Entity for MedicProfile {
    const TABLE: &'static str = "medic_profiles";
    const ANCHOR: Option<&'static str> = None;

    fn id(&self) -> &str {
        &self.id
    }
}
