use crate::{
    entities::location,
    errors::ServiceError,
    services::master_data::CreateLocationInput,
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use uuid::Uuid;

pub fn locations_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_locations).post(create_location))
        .route("/:id", delete(delete_location))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations",
    responses(
        (status = 200, description = "Locations by name", body = ApiResponse<Vec<location::Model>>)
    ),
    tag = "Locations"
)]
pub async fn list_locations(State(state): State<AppState>) -> ApiResult<Vec<location::Model>> {
    let locations = state.services.master_data.list_locations().await?;
    Ok(Json(ApiResponse::success(locations)))
}

#[utoipa::path(
    post,
    path = "/api/v1/locations",
    request_body = CreateLocationInput,
    responses(
        (status = 201, description = "Location created", body = ApiResponse<location::Model>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    tag = "Locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    Json(payload): Json<CreateLocationInput>,
) -> Result<(StatusCode, Json<ApiResponse<location::Model>>), ServiceError> {
    let location = state.services.master_data.create_location(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(location))))
}

/// Delete a location; serials stored there lose their location
#[utoipa::path(
    delete,
    path = "/api/v1/locations/{id}",
    params(("id" = Uuid, Path, description = "Location id")),
    responses(
        (status = 204, description = "Location deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Locations"
)]
pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.master_data.delete_location(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
