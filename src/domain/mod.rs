pub mod booking;
pub mod booking_query;
pub mod cabin;
pub mod model;
pub mod settings;

pub use booking::{
    Booking, BookingDetail, BookingPatch, BookingSales, BookingStatus, BookingSummary, Stay,
    TodayActivity,
};
pub use booking_query::{
    BookingFilter, BookingQueryConfig, BookingQuerySpec, BookingSort, PaginationMode,
    SortDirection, SortFieldMap,
};
pub use cabin::{Cabin, CabinRecord, ImageSource, ImageUpload};
pub use settings::{Settings, SettingsPatch};
