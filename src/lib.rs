pub mod app;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{BookingPage, BookingService, CabinService, Services, SettingsService};
pub use domain::model::{ModelRegistry, TableModel};
pub use error::{AdminError, StoreError};
pub use infra::clock::{Clock, FixedClock, SystemClock};
pub use infra::config::AppConfig;
