use crate::domain::booking::{BookingPatch, BookingStatus};
use crate::domain::booking_query::{BookingFilter, BookingQuerySpec, BookingSort, SortDirection};
use crate::domain::settings::SettingsPatch;
use crate::storage::Comparator;
use crate::transport::http::handlers::{bookings, cabins, health, settings, storage};
use crate::transport::http::types::{ApiResponse, CabinPayload, ImagePayload, UploadPayload};
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        bookings::query_bookings_handler,
        bookings::get_booking_handler,
        bookings::update_booking_handler,
        bookings::delete_booking_handler,
        bookings::created_after_handler,
        bookings::stays_after_handler,
        bookings::todays_activity_handler,
        cabins::list_cabins_handler,
        cabins::create_cabin_handler,
        cabins::edit_cabin_handler,
        cabins::delete_cabin_handler,
        settings::get_settings_handler,
        settings::update_settings_handler,
        storage::public_object_handler
    ),
    components(schemas(
        ApiResponse,
        BookingQuerySpec,
        BookingFilter,
        BookingSort,
        SortDirection,
        Comparator,
        BookingPatch,
        BookingStatus,
        CabinPayload,
        ImagePayload,
        UploadPayload,
        SettingsPatch
    ))
)]
#[allow(dead_code)]
pub struct ApiDoc;

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route(
            "/api/bookings/query",
            axum::routing::post(bookings::query_bookings_handler),
        )
        .route(
            "/api/bookings/created-after",
            get(bookings::created_after_handler),
        )
        .route(
            "/api/bookings/:id",
            get(bookings::get_booking_handler)
                .patch(bookings::update_booking_handler)
                .delete(bookings::delete_booking_handler),
        )
        .route(
            "/api/stays/starting-after",
            get(bookings::stays_after_handler),
        )
        .route("/api/activity/today", get(bookings::todays_activity_handler))
        .route(
            "/api/cabins",
            get(cabins::list_cabins_handler).post(cabins::create_cabin_handler),
        )
        .route(
            "/api/cabins/:id",
            axum::routing::put(cabins::edit_cabin_handler).delete(cabins::delete_cabin_handler),
        )
        .route(
            "/api/settings",
            get(settings::get_settings_handler).patch(settings::update_settings_handler),
        )
        .route(
            "/storage/v1/object/public/:bucket/:name",
            get(storage::public_object_handler),
        )
        .with_state(app_state)
}
