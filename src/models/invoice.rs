use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient, Entity};

/// Payment status value marking a settled invoice.
pub const PAID_STATUS: &str = "paid";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::optional_timestamp")]
    pub fecha_emision: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub total: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metodo_pago: Option<String>,
    #[serde(default)]
    pub estado_pago: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub organization_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_id")]
    pub doctor_id: Option<String>,
}

impl Entity for Invoice {
    const TABLE: &'static str = "invoices";
    const ANCHOR: Option<&'static str> = Some("fecha_emision");

    fn id(&self) -> &str {
        &self.id
    }
}
