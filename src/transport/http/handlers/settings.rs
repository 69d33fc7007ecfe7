use crate::domain::settings::SettingsPatch;
use crate::transport::http::handlers::common::{json_422, respond};
use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "The settings row", body = ApiResponse),
        (status = 500, description = "Settings could not be loaded", body = ApiResponse)
    )
)]
pub async fn get_settings_handler(State(state): State<AppState>) -> Response {
    respond(state.services.settings.get_settings().await)
}

#[utoipa::path(
    patch,
    path = "/api/settings",
    request_body = SettingsPatch,
    responses(
        (status = 200, description = "Updated settings row", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse),
        (status = 500, description = "Settings could not be updated", body = ApiResponse)
    )
)]
pub async fn update_settings_handler(
    State(state): State<AppState>,
    request: Result<Json<SettingsPatch>, JsonRejection>,
) -> Response {
    let Json(patch) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"breakfastPrice\"?: n, ...}"),
    };
    respond(state.services.settings.update_setting(&patch).await)
}
