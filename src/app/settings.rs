use crate::app::logged;
use crate::domain::model::SETTINGS;
use crate::domain::settings::{Settings, SettingsPatch};
use crate::error::AdminError;
use crate::storage::{decode_single, Column, Predicate, Select, TableStore};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
struct SettingsId {
    id: i64,
}

#[derive(Clone)]
pub struct SettingsService {
    tables: Arc<dyn TableStore>,
}

impl SettingsService {
    pub fn new(tables: Arc<dyn TableStore>) -> Self {
        Self { tables }
    }

    pub async fn get_settings(&self) -> Result<Settings, AdminError> {
        let selected = self
            .tables
            .select(&Select::from(SETTINGS))
            .await
            .map_err(logged("loading settings", AdminError::SettingsLoadFailed))?;
        decode_single(selected.rows)
            .map_err(logged("loading settings", AdminError::SettingsLoadFailed))
    }

    /// Writes the present fields of `patch` to the settings row. Concurrent
    /// updates are last-write-wins.
    pub async fn update_setting(&self, patch: &SettingsPatch) -> Result<Settings, AdminError> {
        let selected = self
            .tables
            .select(&Select::from(SETTINGS).columns(Column::fields(&["id"])))
            .await
            .map_err(logged("looking up settings", AdminError::SettingsUpdateFailed))?;
        let SettingsId { id } = decode_single::<SettingsId>(selected.rows)
            .map_err(logged("looking up settings", AdminError::SettingsUpdateFailed))?;

        let rows = self
            .tables
            .update(SETTINGS, &patch.to_row(), &[Predicate::eq("id", id)])
            .await
            .map_err(logged("updating settings", AdminError::SettingsUpdateFailed))?;
        decode_single(rows).map_err(logged("updating settings", AdminError::SettingsUpdateFailed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::backend::seed_default_settings;
    use crate::storage::{MemoryStore, StoreOp};

    #[tokio::test]
    async fn reads_and_patches_the_single_row() {
        let store = Arc::new(MemoryStore::recording("http://localhost:3000"));
        seed_default_settings(&store).await;
        let service = SettingsService::new(store.clone());

        let settings = service.get_settings().await.unwrap();
        assert_eq!(settings.max_guests_per_booking, 8);

        let patch = SettingsPatch {
            breakfast_price: Some(17.5),
            ..Default::default()
        };
        let updated = service.update_setting(&patch).await.unwrap();
        assert_eq!(updated.breakfast_price, 17.5);
        assert_eq!(updated.min_booking_length, settings.min_booking_length);

        let ops: Vec<StoreOp> = store.calls().await.iter().map(|c| c.op).collect();
        assert_eq!(ops, vec![StoreOp::Select, StoreOp::Select, StoreOp::Update]);
    }

    #[tokio::test]
    async fn missing_row_fails_both_operations() {
        let service = SettingsService::new(Arc::new(MemoryStore::new("http://x")));
        assert_eq!(service.get_settings().await, Err(AdminError::SettingsLoadFailed));
        let patch = SettingsPatch {
            min_booking_length: Some(2),
            ..Default::default()
        };
        assert_eq!(
            service.update_setting(&patch).await,
            Err(AdminError::SettingsUpdateFailed)
        );
    }
}
