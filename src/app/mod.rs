//! Caller-facing admin operations.
//!
//! Each service runs a short chain of store calls. Store failures are logged here and
//! surfaced as a single named `AdminError`; nothing is retried.

pub mod bookings;
pub mod cabins;
pub mod settings;

use crate::domain::booking_query::BookingQueryConfig;
use crate::error::{AdminError, StoreError};
use crate::infra::clock::Clock;
use crate::storage::{ObjectStore, TableStore};
use std::sync::Arc;

pub use bookings::{BookingPage, BookingService};
pub use cabins::{CabinService, CABIN_IMAGES_BUCKET};
pub use settings::SettingsService;

/// Logs a store failure under `context` and replaces it with `error`.
pub(crate) fn logged(
    context: &'static str,
    error: AdminError,
) -> impl FnOnce(StoreError) -> AdminError {
    move |e| {
        tracing::error!(error = %e, "{}", context);
        error
    }
}

#[derive(Clone)]
pub struct Services {
    pub tables: Arc<dyn TableStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub bookings: BookingService,
    pub cabins: CabinService,
    pub settings: SettingsService,
}

impl Services {
    pub fn new(
        tables: Arc<dyn TableStore>,
        objects: Arc<dyn ObjectStore>,
        config: BookingQueryConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bookings: BookingService::new(tables.clone(), Arc::new(config), clock),
            cabins: CabinService::new(tables.clone(), objects.clone()),
            settings: SettingsService::new(tables.clone()),
            tables,
            objects,
        }
    }
}
