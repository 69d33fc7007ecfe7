//! Cabin rows and the create/edit record submitted by the cabin form.

use crate::error::AdminError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// A persisted `cabins` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cabin {
    pub id: i64,
    #[serde(rename = "created_at")]
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub max_capacity: i32,
    pub regular_price: i32,
    pub discount: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Raw image bytes picked in the form, not yet stored anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Where a cabin's image comes from. Decided where the form input is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Upload(ImageUpload),
    /// Address of an asset that was uploaded earlier.
    Stored(String),
}

/// Cabin form contents. The row id, when editing, travels separately.
#[derive(Debug, Clone, PartialEq)]
pub struct CabinRecord {
    pub name: String,
    pub max_capacity: i32,
    pub regular_price: i32,
    pub discount: i32,
    pub description: String,
    pub image: Option<ImageSource>,
}

fn invalid(field: &'static str, message: &'static str) -> AdminError {
    AdminError::InvalidCabin { field, message }
}

impl CabinRecord {
    /// Form rules. `is_create` additionally requires a description and an image.
    pub fn validate(&self, is_create: bool) -> Result<(), AdminError> {
        if self.name.trim().is_empty() {
            return Err(invalid("name", "This field is required"));
        }
        if self.max_capacity < 1 {
            return Err(invalid("maxCapacity", "Capacity should be at least 1"));
        }
        if self.regular_price < 1 {
            return Err(invalid("regularPrice", "Price should be at least 1"));
        }
        if self.discount < 0 {
            return Err(invalid("discount", "Discount cannot be negative"));
        }
        if self.discount > self.regular_price {
            return Err(invalid(
                "discount",
                "Discount should be less than regular price",
            ));
        }
        if is_create && self.description.trim().is_empty() {
            return Err(invalid("description", "This field is required"));
        }
        if is_create && self.image.is_none() {
            return Err(invalid("image", "File is required"));
        }
        Ok(())
    }

    /// Row to persist. `image` is the resolved address; `None` leaves the column out.
    pub fn to_row(&self, image: Option<&str>) -> JsonValue {
        let mut row = Map::new();
        row.insert("name".to_string(), JsonValue::from(self.name.clone()));
        row.insert("maxCapacity".to_string(), JsonValue::from(self.max_capacity));
        row.insert("regularPrice".to_string(), JsonValue::from(self.regular_price));
        row.insert("discount".to_string(), JsonValue::from(self.discount));
        row.insert(
            "description".to_string(),
            JsonValue::from(self.description.clone()),
        );
        if let Some(address) = image {
            row.insert("image".to_string(), JsonValue::from(address));
        }
        JsonValue::Object(row)
    }
}
