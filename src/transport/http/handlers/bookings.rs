use crate::domain::booking::BookingPatch;
use crate::domain::booking_query::BookingQuerySpec;
use crate::transport::http::handlers::common::{admin_error, done, json_422, query_400, respond};
use crate::transport::http::types::{ApiResponse, AppState, DateQuery};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;

#[utoipa::path(
    post,
    path = "/api/bookings/query",
    request_body = BookingQuerySpec,
    responses(
        (status = 200, description = "Window of bookings plus the exact match count", body = ApiResponse),
        (status = 400, description = "Sort field not allowed", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse),
        (status = 500, description = "Bookings could not be loaded", body = ApiResponse)
    )
)]
pub async fn query_bookings_handler(
    State(state): State<AppState>,
    request: Result<Json<BookingQuerySpec>, JsonRejection>,
) -> Response {
    let Json(spec) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(e, "{\"filter\"?: {...}, \"sortBy\"?: {...}, \"page\"?: n}");
        }
    };
    respond(state.services.bookings.list_bookings(&spec).await)
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking with its cabin and guest", body = ApiResponse),
        (status = 404, description = "Booking not found", body = ApiResponse)
    )
)]
pub async fn get_booking_handler(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    respond(state.services.bookings.get_booking(id).await)
}

#[utoipa::path(
    patch,
    path = "/api/bookings/{id}",
    params(("id" = i64, Path, description = "Booking id")),
    request_body = BookingPatch,
    responses(
        (status = 200, description = "Updated booking", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse),
        (status = 500, description = "Booking could not be updated", body = ApiResponse)
    )
)]
pub async fn update_booking_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    request: Result<Json<BookingPatch>, JsonRejection>,
) -> Response {
    let Json(patch) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"status\"?: ..., \"isPaid\"?: ...}"),
    };
    respond(state.services.bookings.update_booking(id, &patch).await)
}

#[utoipa::path(
    delete,
    path = "/api/bookings/{id}",
    params(("id" = i64, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking deleted", body = ApiResponse),
        (status = 500, description = "Booking could not be deleted", body = ApiResponse)
    )
)]
pub async fn delete_booking_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Response {
    match state.services.bookings.delete_booking(id).await {
        Ok(()) => done(),
        Err(e) => admin_error(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/bookings/created-after",
    params(("date" = String, Query, description = "RFC3339 lower bound for created_at")),
    responses(
        (status = 200, description = "Sales rows created since the date", body = ApiResponse),
        (status = 400, description = "Missing or malformed date", body = ApiResponse),
        (status = 500, description = "Bookings could not be loaded", body = ApiResponse)
    )
)]
pub async fn created_after_handler(
    State(state): State<AppState>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(e) => return query_400(e, "?date=<RFC3339 timestamp>"),
    };
    respond(
        state
            .services
            .bookings
            .get_bookings_created_after(query.date)
            .await,
    )
}

#[utoipa::path(
    get,
    path = "/api/stays/starting-after",
    params(("date" = String, Query, description = "RFC3339 lower bound for startDate")),
    responses(
        (status = 200, description = "Stays started since the date", body = ApiResponse),
        (status = 400, description = "Missing or malformed date", body = ApiResponse),
        (status = 500, description = "Bookings could not be loaded", body = ApiResponse)
    )
)]
pub async fn stays_after_handler(
    State(state): State<AppState>,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(e) => return query_400(e, "?date=<RFC3339 timestamp>"),
    };
    respond(
        state
            .services
            .bookings
            .get_stays_starting_after(query.date)
            .await,
    )
}

#[utoipa::path(
    get,
    path = "/api/activity/today",
    responses(
        (status = 200, description = "Check-ins and check-outs due today", body = ApiResponse),
        (status = 500, description = "Bookings could not be loaded", body = ApiResponse)
    )
)]
pub async fn todays_activity_handler(State(state): State<AppState>) -> Response {
    respond(state.services.bookings.get_todays_activity().await)
}
