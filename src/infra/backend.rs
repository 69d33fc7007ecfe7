//! Builds the configured store collaborators.

use crate::domain::model::{ModelRegistry, SETTINGS};
use crate::infra::config::{AppConfig, Backend};
use crate::storage::{MemoryStore, ObjectStore, PgObjectStore, PgTableStore, RestStore, TableStore};
use anyhow::Context;
use serde_json::json;
use std::sync::Arc;

#[derive(Clone)]
pub struct Stores {
    pub tables: Arc<dyn TableStore>,
    pub objects: Arc<dyn ObjectStore>,
}

/// Connects to the backend selected by `config`. With `ensure_schema`, the postgres
/// backend creates any missing table first.
pub async fn open(config: &AppConfig, ensure_schema: bool) -> anyhow::Result<Stores> {
    match config.backend {
        Backend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;
            let tables = PgTableStore::connect(
                url,
                config.max_connections,
                Arc::new(ModelRegistry::admin()),
            )
            .await
            .context("connecting to postgres")?;
            let objects = PgObjectStore::new(tables.pool().clone(), config.store_base_url.clone());
            if ensure_schema {
                tables.ensure_schema().await.context("creating tables")?;
                objects
                    .ensure_schema()
                    .await
                    .context("creating storage_objects")?;
                tracing::info!("postgres schema ensured");
            }
            Ok(Stores {
                tables: Arc::new(tables),
                objects: Arc::new(objects),
            })
        }
        Backend::Rest => {
            let key = config
                .store_api_key
                .as_deref()
                .context("STORE_API_KEY must be set")?;
            let store = Arc::new(RestStore::new(config.store_base_url.clone(), key)?);
            Ok(Stores {
                tables: store.clone(),
                objects: store,
            })
        }
        Backend::Memory => {
            let store = Arc::new(memory_store(&config.store_base_url).await);
            Ok(Stores {
                tables: store.clone(),
                objects: store,
            })
        }
    }
}

/// Empty in-memory store holding just the default settings row. Calls are not journaled.
pub async fn memory_store(base_url: &str) -> MemoryStore {
    let store = MemoryStore::new(base_url);
    seed_default_settings(&store).await;
    store
}

pub async fn seed_default_settings(store: &MemoryStore) {
    store
        .seed(
            SETTINGS,
            vec![json!({
                "minBookingLength": 3,
                "maxBookingLength": 90,
                "maxGuestsPerBooking": 8,
                "breakfastPrice": 15.0
            })],
        )
        .await;
}
