use crate::transport::http::handlers::common::failure;
use crate::transport::http::types::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

#[utoipa::path(
    get,
    path = "/storage/v1/object/public/{bucket}/{name}",
    params(
        ("bucket" = String, Path, description = "Bucket name (e.g. cabin-images)"),
        ("name" = String, Path, description = "Object name")
    ),
    responses(
        (status = 200, description = "Object bytes"),
        (status = 404, description = "No such object")
    )
)]
pub async fn public_object_handler(
    State(state): State<AppState>,
    Path((bucket, name)): Path<(String, String)>,
) -> Response {
    match state.services.objects.download(&bucket, &name).await {
        Ok(Some(object)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, object.content_type)],
            object.bytes,
        )
            .into_response(),
        Ok(None) => failure(StatusCode::NOT_FOUND, "Object not found".to_string()),
        Err(e) => {
            tracing::error!(error = %e, bucket = %bucket, name = %name, "object download failed");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Object could not be loaded".to_string(),
            )
        }
    }
}
