use crate::app::logged;
use crate::domain::cabin::{Cabin, CabinRecord, ImageSource, ImageUpload};
use crate::domain::model::CABINS;
use crate::error::AdminError;
use crate::storage::{decode_rows, ObjectStore, Predicate, Select, StoredObject, TableStore};
use std::sync::Arc;

pub const CABIN_IMAGES_BUCKET: &str = "cabin-images";

/// `{random}-{file_name}`, keeping only characters that need no escaping in a URL path
/// segment (ASCII letters, digits, `-`, `_` and `.`).
pub fn asset_name(file_name: &str) -> String {
    format!("{}-{}", rand::random::<f64>(), file_name)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}

#[derive(Clone)]
pub struct CabinService {
    tables: Arc<dyn TableStore>,
    objects: Arc<dyn ObjectStore>,
}

impl CabinService {
    pub fn new(tables: Arc<dyn TableStore>, objects: Arc<dyn ObjectStore>) -> Self {
        Self { tables, objects }
    }

    pub async fn list_cabins(&self) -> Result<Vec<Cabin>, AdminError> {
        let selected = self
            .tables
            .select(&Select::from(CABINS))
            .await
            .map_err(logged("loading cabins", AdminError::CabinsLoadFailed))?;
        decode_rows(selected.rows).map_err(logged("loading cabins", AdminError::CabinsLoadFailed))
    }

    /// Creates a cabin, or edits `existing_id`. A pending image is uploaded first;
    /// if the row write then fails the uploaded asset stays behind.
    pub async fn upsert_cabin(
        &self,
        record: &CabinRecord,
        existing_id: Option<i64>,
    ) -> Result<Vec<Cabin>, AdminError> {
        record.validate(existing_id.is_none())?;

        let image = match &record.image {
            None => None,
            Some(ImageSource::Stored(address)) => Some(address.clone()),
            Some(ImageSource::Upload(upload)) => Some(self.upload_image(upload).await?),
        };

        let row = record.to_row(image.as_deref());
        let rows = match existing_id {
            None => self.tables.insert(CABINS, &[row]).await,
            Some(id) => {
                self.tables
                    .update(CABINS, &row, &[Predicate::eq("id", id)])
                    .await
            }
        }
        .map_err(logged("saving cabin", AdminError::CabinPersistFailed))?;

        decode_rows(rows).map_err(logged("saving cabin", AdminError::CabinPersistFailed))
    }

    pub async fn delete_cabin(&self, id: i64) -> Result<(), AdminError> {
        self.tables
            .delete(CABINS, &[Predicate::eq("id", id)])
            .await
            .map_err(logged("deleting cabin", AdminError::CabinDeleteFailed))?;
        Ok(())
    }

    async fn upload_image(&self, upload: &ImageUpload) -> Result<String, AdminError> {
        let name = asset_name(&upload.file_name);
        let object = StoredObject {
            content_type: upload.content_type.clone(),
            bytes: upload.bytes.clone(),
        };
        let uploaded = self
            .objects
            .upload(CABIN_IMAGES_BUCKET, &name, object)
            .await
            .map_err(logged("uploading cabin image", AdminError::AssetUploadFailed))?;
        tracing::debug!(address = %uploaded.public_address, "cabin image uploaded");
        Ok(uploaded.public_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StoreCall, StoreOp};

    const BASE: &str = "https://abc.backend.co";

    fn service() -> (Arc<MemoryStore>, CabinService) {
        let store = Arc::new(MemoryStore::recording(BASE));
        (store.clone(), CabinService::new(store.clone(), store))
    }

    fn record(image: Option<ImageSource>) -> CabinRecord {
        CabinRecord {
            name: "008".to_string(),
            max_capacity: 10,
            regular_price: 1000,
            discount: 100,
            description: "Luxury cabin".to_string(),
            image,
        }
    }

    fn upload(file_name: &str) -> Option<ImageSource> {
        Some(ImageSource::Upload(ImageUpload {
            file_name: file_name.to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xff, 0xd8, 0xff],
        }))
    }

    #[test]
    fn asset_names_strip_slashes() {
        let name = asset_name("photos/cabin-008.jpg");
        assert!(!name.contains('/'));
        assert!(name.ends_with("-photoscabin-008.jpg"));
    }

    #[test]
    fn asset_names_drop_url_reserved_characters() {
        let name = asset_name("cabin #8 (50% off)?.jpg");
        assert!(name.ends_with("-cabin850off.jpg"), "{}", name);
        assert!(!name.contains(['#', '?', '%', ' ', '(']));
    }

    #[tokio::test]
    async fn uploaded_address_stays_resolvable() {
        let (store, service) = service();
        let cabins = service
            .upsert_cabin(&record(upload("summer #1?.jpg")), None)
            .await
            .unwrap();
        let address = cabins[0].image.clone().unwrap();
        assert!(address.ends_with("-summer1.jpg"), "{}", address);
        let name = address.rsplit('/').next().unwrap();
        assert!(store.download(CABIN_IMAGES_BUCKET, name).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn binary_image_is_uploaded_once_before_insert() {
        let (store, service) = service();
        let cabins = service
            .upsert_cabin(&record(upload("cabin-008.jpg")), None)
            .await
            .unwrap();

        assert_eq!(cabins.len(), 1);
        let image = cabins[0].image.clone().unwrap();
        let prefix = format!("{}/storage/v1/object/public/cabin-images/", BASE);
        assert!(image.starts_with(&prefix));
        assert!(image.ends_with("-cabin-008.jpg"));

        let calls = store.calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].op, StoreOp::Upload);
        assert_eq!(
            calls[1],
            StoreCall {
                op: StoreOp::Insert,
                target: "cabins".to_string()
            }
        );
    }

    #[tokio::test]
    async fn stored_image_skips_upload_and_updates_by_id() {
        let (store, service) = service();
        let created = service
            .upsert_cabin(&record(upload("a.jpg")), None)
            .await
            .unwrap();
        let id = created[0].id;
        let address = created[0].image.clone().unwrap();
        store.clear_calls().await;

        let mut edit = record(Some(ImageSource::Stored(address.clone())));
        edit.regular_price = 900;
        let edited = service.upsert_cabin(&edit, Some(id)).await.unwrap();

        assert_eq!(edited[0].regular_price, 900);
        assert_eq!(edited[0].image.as_deref(), Some(address.as_str()));
        let ops: Vec<StoreOp> = store.calls().await.iter().map(|c| c.op).collect();
        assert_eq!(ops, vec![StoreOp::Update]);
    }

    #[tokio::test]
    async fn edit_without_image_keeps_stored_image() {
        let (store, service) = service();
        let created = service
            .upsert_cabin(&record(upload("a.jpg")), None)
            .await
            .unwrap();
        let id = created[0].id;

        let edited = service.upsert_cabin(&record(None), Some(id)).await.unwrap();
        assert_eq!(edited[0].image, created[0].image);
        assert_eq!(store.rows("cabins").await.len(), 1);
    }

    #[tokio::test]
    async fn invalid_record_never_reaches_the_store() {
        let (store, service) = service();
        let mut bad = record(upload("a.jpg"));
        bad.regular_price = 100;
        bad.discount = 101;
        let res = service.upsert_cabin(&bad, None).await;
        assert!(matches!(res, Err(AdminError::InvalidCabin { field: "discount", .. })));
        assert!(store.calls().await.is_empty());

        let res = service.upsert_cabin(&record(None), None).await;
        assert!(matches!(res, Err(AdminError::InvalidCabin { field: "image", .. })));
        assert!(store.calls().await.is_empty());
    }

    #[tokio::test]
    async fn upload_failure_skips_persistence() {
        let (store, service) = service();
        store.fail_on(StoreOp::Upload).await;
        let res = service.upsert_cabin(&record(upload("a.jpg")), None).await;
        assert_eq!(res, Err(AdminError::AssetUploadFailed));
        let ops: Vec<StoreOp> = store.calls().await.iter().map(|c| c.op).collect();
        assert_eq!(ops, vec![StoreOp::Upload]);
    }

    #[tokio::test]
    async fn persist_failure_leaves_uploaded_asset() {
        let (store, service) = service();
        store.fail_on(StoreOp::Insert).await;
        let res = service.upsert_cabin(&record(upload("a.jpg")), None).await;
        assert_eq!(res, Err(AdminError::CabinPersistFailed));

        let calls = store.calls().await;
        let uploaded = calls[0].target.trim_start_matches("cabin-images/").to_string();
        let object = store.download(CABIN_IMAGES_BUCKET, &uploaded).await.unwrap();
        assert!(object.is_some());
    }

    #[tokio::test]
    async fn list_and_delete() {
        let (store, service) = service();
        service
            .upsert_cabin(&record(upload("a.jpg")), None)
            .await
            .unwrap();
        let cabins = service.list_cabins().await.unwrap();
        assert_eq!(cabins.len(), 1);

        service.delete_cabin(cabins[0].id).await.unwrap();
        assert!(service.list_cabins().await.unwrap().is_empty());

        store.fail_on(StoreOp::Select).await;
        assert_eq!(service.list_cabins().await, Err(AdminError::CabinsLoadFailed));
    }
}
