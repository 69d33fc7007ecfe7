use crate::app::Services;
use crate::domain::cabin::{CabinRecord, ImageSource, ImageUpload};
use crate::error::AdminError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub services: Services,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `POST /api/cabins` and `PUT /api/cabins/{id}`.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CabinPayload {
    #[serde(default)]
    pub name: String,
    pub max_capacity: i32,
    pub regular_price: i32,
    #[serde(default)]
    pub discount: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<ImagePayload>,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImagePayload {
    /// Address of an already uploaded image.
    Stored(String),
    /// New image file, base64 encoded.
    Upload(UploadPayload),
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct UploadPayload {
    pub file_name: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    pub data_base64: String,
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

impl CabinPayload {
    pub fn into_record(self) -> Result<CabinRecord, AdminError> {
        let image = match self.image {
            None => None,
            Some(ImagePayload::Stored(address)) => Some(ImageSource::Stored(address)),
            Some(ImagePayload::Upload(upload)) => {
                let bytes = BASE64.decode(upload.data_base64.trim()).map_err(|_| {
                    AdminError::InvalidCabin {
                        field: "image",
                        message: "Image data is not valid base64",
                    }
                })?;
                Some(ImageSource::Upload(ImageUpload {
                    file_name: upload.file_name,
                    content_type: upload.content_type,
                    bytes,
                }))
            }
        };
        Ok(CabinRecord {
            name: self.name,
            max_capacity: self.max_capacity,
            regular_price: self.regular_price,
            discount: self.discount,
            description: self.description,
            image,
        })
    }
}

#[derive(Deserialize, Debug)]
pub struct DateQuery {
    /// RFC3339 timestamp.
    pub date: DateTime<Utc>,
}
