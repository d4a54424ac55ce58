use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient, Entity};

/// One row of the audit trail written by the write-path services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub action_type: Option<String>,
    /// Module the action touched (patients, invoices, ...).
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for AuditLogEntry {
    const TABLE: &'static str = "audit_logs";
    const ANCHOR: Option<&'static str> = Some("created_at");

    fn id(&self) -> &str {
        &self.id
    }
}
