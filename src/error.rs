//! Error taxonomy.
//!
//! `StoreError` describes what went wrong inside a persistence/storage backend.
//! `AdminError` is what callers of the admin operations see: every store failure is
//! logged where it happens and surfaced as exactly one of these named errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("db error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error("malformed row: {0}")]
    MalformedRow(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    #[error("Invalid sort field: {0}")]
    InvalidSortField(String),

    #[error("Bookings could not be loaded")]
    BookingsLoadFailed,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Booking could not be updated")]
    BookingUpdateFailed,

    #[error("Booking could not be deleted")]
    BookingDeleteFailed,

    #[error("Image upload failed")]
    AssetUploadFailed,

    #[error("Cabin could not be created/edited")]
    CabinPersistFailed,

    #[error("Cabins could not be loaded")]
    CabinsLoadFailed,

    #[error("Cabin could not be deleted")]
    CabinDeleteFailed,

    #[error("{field}: {message}")]
    InvalidCabin {
        field: &'static str,
        message: &'static str,
    },

    #[error("Settings could not be loaded")]
    SettingsLoadFailed,

    #[error("Settings could not be updated")]
    SettingsUpdateFailed,
}

impl AdminError {
    /// True for errors caused by the caller's input rather than the backend.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AdminError::InvalidSortField(_) | AdminError::InvalidCabin { .. }
        )
    }
}
