use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

/// The single `settings` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub id: i64,
    #[serde(rename = "created_at")]
    pub created_at: DateTime<Utc>,
    pub min_booking_length: i32,
    pub max_booking_length: i32,
    pub max_guests_per_booking: i32,
    pub breakfast_price: f64,
}

/// `{setting: newValue}`: only present fields are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_booking_length: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_booking_length: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_guests_per_booking: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakfast_price: Option<f64>,
}

impl SettingsPatch {
    pub fn to_row(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_else(|_| JsonValue::Object(Default::default()))
    }
}
