//! `ObjectStore` persisted in a PostgreSQL `storage_objects` table.
//!
//! Objects are served back by the HTTP layer under the same public path the hosted
//! backend uses, so addresses produced here resolve against this service.

use crate::error::StoreError;
use crate::storage::{public_object_address, ObjectStore, StoredObject, UploadResult};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

#[derive(Clone)]
pub struct PgObjectStore {
    pool: PgPool,
    base_url: String,
}

impl PgObjectStore {
    pub fn new(pool: PgPool, base_url: impl Into<String>) -> Self {
        Self {
            pool,
            base_url: base_url.into(),
        }
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS storage_objects (
                bucket TEXT NOT NULL,
                name TEXT NOT NULL,
                content_type TEXT NOT NULL,
                data BYTEA NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                PRIMARY KEY (bucket, name)
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for PgObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        name: &str,
        object: StoredObject,
    ) -> Result<UploadResult, StoreError> {
        // No upsert: re-uploading an existing name is an error, as with the hosted store.
        sqlx::query(
            "INSERT INTO storage_objects (bucket, name, content_type, data) VALUES ($1, $2, $3, $4)",
        )
        .bind(bucket)
        .bind(name)
        .bind(&object.content_type)
        .bind(&object.bytes)
        .execute(&self.pool)
        .await?;

        Ok(UploadResult {
            public_address: self.public_address(bucket, name),
        })
    }

    async fn download(&self, bucket: &str, name: &str) -> Result<Option<StoredObject>, StoreError> {
        let row = sqlx::query(
            "SELECT content_type, data FROM storage_objects WHERE bucket = $1 AND name = $2",
        )
        .bind(bucket)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(StoredObject {
                content_type: row.try_get("content_type")?,
                bytes: row.try_get("data")?,
            })),
            None => Ok(None),
        }
    }

    fn public_address(&self, bucket: &str, name: &str) -> String {
        public_object_address(&self.base_url, bucket, name)
    }
}
