//! Persistence and object-storage collaborators.

pub mod memory;
pub mod objects;
pub mod postgres;
pub mod query;
pub mod rest;

use crate::error::StoreError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

pub use memory::{MemoryStore, StoreCall, StoreOp};
pub use objects::PgObjectStore;
pub use postgres::PgTableStore;
pub use query::{Column, Comparator, Order, Predicate, RowRange, Select, Selected};
pub use rest::RestStore;

/// Path segment under which uploaded objects become publicly retrievable.
pub const PUBLIC_OBJECT_PATH: &str = "storage/v1/object/public";

/// Table-oriented data service. Rows travel as JSON objects.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn select(&self, query: &Select) -> Result<Selected, StoreError>;

    /// Inserts `rows` and returns them as stored (with generated columns filled in).
    async fn insert(&self, table: &str, rows: &[JsonValue]) -> Result<Vec<JsonValue>, StoreError>;

    /// Applies `patch` to every row matching `predicates` and returns the updated rows.
    async fn update(
        &self,
        table: &str,
        patch: &JsonValue,
        predicates: &[Predicate],
    ) -> Result<Vec<JsonValue>, StoreError>;

    /// Deletes every row matching `predicates` and returns the deleted rows.
    async fn delete(
        &self,
        table: &str,
        predicates: &[Predicate],
    ) -> Result<Vec<JsonValue>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub public_address: String,
}

/// Binary object store with deterministic public addresses.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        name: &str,
        object: StoredObject,
    ) -> Result<UploadResult, StoreError>;

    async fn download(&self, bucket: &str, name: &str) -> Result<Option<StoredObject>, StoreError>;

    fn public_address(&self, bucket: &str, name: &str) -> String;
}

/// `{base}/storage/v1/object/public/{bucket}/{name}`
pub fn public_object_address(base_url: &str, bucket: &str, name: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        base_url.trim_end_matches('/'),
        PUBLIC_OBJECT_PATH,
        bucket,
        name
    )
}

pub fn decode_rows<T: DeserializeOwned>(rows: Vec<JsonValue>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(StoreError::from))
        .collect()
}

/// Decodes exactly one row; zero or several rows is an error.
pub fn decode_single<T: DeserializeOwned>(rows: Vec<JsonValue>) -> Result<T, StoreError> {
    if rows.len() != 1 {
        return Err(StoreError::MalformedRow(format!(
            "expected exactly one row, got {}",
            rows.len()
        )));
    }
    let row = rows.into_iter().next().unwrap_or(JsonValue::Null);
    Ok(serde_json::from_value(row)?)
}
