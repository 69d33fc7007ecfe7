pub mod router;
pub mod types;
pub mod handlers {
    pub mod bookings;
    pub mod cabins;
    pub mod common;
    pub mod health;
    pub mod settings;
    pub mod storage;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
