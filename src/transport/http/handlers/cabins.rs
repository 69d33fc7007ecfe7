use crate::transport::http::handlers::common::{admin_error, done, json_422, respond};
use crate::transport::http::types::{ApiResponse, AppState, CabinPayload};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;

const EXPECTED_CABIN: &str =
    "{\"name\", \"maxCapacity\", \"regularPrice\", \"discount\", \"description\", \"image\"?}";

#[utoipa::path(
    get,
    path = "/api/cabins",
    responses(
        (status = 200, description = "All cabins", body = ApiResponse),
        (status = 500, description = "Cabins could not be loaded", body = ApiResponse)
    )
)]
pub async fn list_cabins_handler(State(state): State<AppState>) -> Response {
    respond(state.services.cabins.list_cabins().await)
}

#[utoipa::path(
    post,
    path = "/api/cabins",
    request_body = CabinPayload,
    responses(
        (status = 200, description = "Created cabin rows", body = ApiResponse),
        (status = 400, description = "Invalid cabin", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse),
        (status = 500, description = "Image upload or cabin write failed", body = ApiResponse)
    )
)]
pub async fn create_cabin_handler(
    State(state): State<AppState>,
    request: Result<Json<CabinPayload>, JsonRejection>,
) -> Response {
    upsert(state, None, request).await
}

#[utoipa::path(
    put,
    path = "/api/cabins/{id}",
    params(("id" = i64, Path, description = "Cabin id")),
    request_body = CabinPayload,
    responses(
        (status = 200, description = "Edited cabin rows", body = ApiResponse),
        (status = 400, description = "Invalid cabin", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse),
        (status = 500, description = "Image upload or cabin write failed", body = ApiResponse)
    )
)]
pub async fn edit_cabin_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    request: Result<Json<CabinPayload>, JsonRejection>,
) -> Response {
    upsert(state, Some(id), request).await
}

async fn upsert(
    state: AppState,
    existing_id: Option<i64>,
    request: Result<Json<CabinPayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, EXPECTED_CABIN),
    };
    let record = match payload.into_record() {
        Ok(r) => r,
        Err(e) => return admin_error(e),
    };
    respond(state.services.cabins.upsert_cabin(&record, existing_id).await)
}

#[utoipa::path(
    delete,
    path = "/api/cabins/{id}",
    params(("id" = i64, Path, description = "Cabin id")),
    responses(
        (status = 200, description = "Cabin deleted", body = ApiResponse),
        (status = 500, description = "Cabin could not be deleted", body = ApiResponse)
    )
)]
pub async fn delete_cabin_handler(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match state.services.cabins.delete_cabin(id).await {
        Ok(()) => done(),
        Err(e) => admin_error(e),
    }
}
