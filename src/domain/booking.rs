//! Booking rows and the projections each booking query returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Unconfirmed,
    CheckedIn,
    CheckedOut,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Unconfirmed => "unconfirmed",
            BookingStatus::CheckedIn => "checked-in",
            BookingStatus::CheckedOut => "checked-out",
        }
    }
}

/// A full `bookings` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    #[serde(rename = "created_at")]
    pub created_at: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub num_nights: i32,
    pub num_guests: i32,
    #[serde(default)]
    pub cabin_price: Option<f64>,
    #[serde(default)]
    pub extras_price: Option<f64>,
    pub total_price: f64,
    pub status: BookingStatus,
    #[serde(default)]
    pub has_breakfast: bool,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub observations: Option<String>,
    #[serde(default)]
    pub cabin_id: Option<i64>,
    #[serde(default)]
    pub guest_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CabinName {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestContact {
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestName {
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestOrigin {
    pub full_name: String,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub country_flag: Option<String>,
}

/// A full `guests` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: i64,
    #[serde(rename = "created_at")]
    pub created_at: DateTime<Utc>,
    pub full_name: String,
    pub email: String,
    #[serde(default, rename = "nationalID")]
    pub national_id: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub country_flag: Option<String>,
}

/// Row of the paginated bookings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSummary {
    pub id: i64,
    #[serde(rename = "created_at")]
    pub created_at: DateTime<Utc>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub num_nights: i32,
    pub num_guests: i32,
    pub status: BookingStatus,
    pub total_price: f64,
    pub cabins: Option<CabinName>,
    pub guests: Option<GuestContact>,
}

/// One booking with its cabin and guest rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: Booking,
    pub cabins: Option<super::cabin::Cabin>,
    pub guests: Option<Guest>,
}

/// Revenue figures for bookings created in a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSales {
    #[serde(rename = "created_at")]
    pub created_at: DateTime<Utc>,
    pub total_price: f64,
    #[serde(default)]
    pub extras_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stay {
    #[serde(flatten)]
    pub booking: Booking,
    pub guests: Option<GuestName>,
}

/// A booking that checks in or out today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodayActivity {
    #[serde(flatten)]
    pub booking: Booking,
    pub guests: Option<GuestOrigin>,
}

/// Partial update of a booking; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_paid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_breakfast: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
}

impl BookingPatch {
    pub fn to_row(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or_else(|_| JsonValue::Object(Default::default()))
    }

    pub fn is_empty(&self) -> bool {
        *self == BookingPatch::default()
    }
}
