use crate::error::AdminError;
use crate::transport::http::types::ApiResponse;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub fn status_for(err: &AdminError) -> StatusCode {
    match err {
        AdminError::BookingNotFound => StatusCode::NOT_FOUND,
        e if e.is_rejection() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn failure(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(message),
        }),
    )
        .into_response()
}

pub fn admin_error(err: AdminError) -> Response {
    failure(status_for(&err), err.to_string())
}

pub fn ok<T: Serialize>(data: T) -> Response {
    match serde_json::to_value(data) {
        Ok(value) => (
            StatusCode::OK,
            Json(ApiResponse {
                success: true,
                data: Some(value),
                error: None,
            }),
        )
            .into_response(),
        Err(e) => failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode response: {}", e),
        ),
    }
}

/// `Ok` with no payload, for deletes.
pub fn done() -> Response {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            data: None,
            error: None,
        }),
    )
        .into_response()
}

pub fn respond<T: Serialize>(result: Result<T, AdminError>) -> Response {
    match result {
        Ok(data) => ok(data),
        Err(e) => admin_error(e),
    }
}

pub fn json_422(err: JsonRejection, expected: &str) -> Response {
    failure(
        StatusCode::UNPROCESSABLE_ENTITY,
        format!("Invalid JSON body: {} (expected: {})", err, expected),
    )
}

pub fn query_400(err: QueryRejection, expected: &str) -> Response {
    failure(
        StatusCode::BAD_REQUEST,
        format!("Invalid query string: {} (expected: {})", err, expected),
    )
}
