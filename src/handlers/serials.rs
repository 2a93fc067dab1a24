use crate::{
    entities::audit_log,
    errors::ServiceError,
    handlers::common::Actor,
    services::{
        audit::SERIALS_TABLE,
        serials::{SerialDetail, SerialListQuery, UpdateSerialInput},
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

pub fn serials_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_serials))
        .route("/available", get(available_serials))
        .route("/:id", get(get_serial).put(update_serial))
        .route("/:id/history", get(serial_history))
}

/// Search serials with their product and location
#[utoipa::path(
    get,
    path = "/api/v1/serials",
    params(SerialListQuery),
    responses(
        (status = 200, description = "Serials ordered by code", body = ApiResponse<Vec<SerialDetail>>)
    ),
    tag = "Serials"
)]
pub async fn list_serials(
    State(state): State<AppState>,
    Query(query): Query<SerialListQuery>,
) -> ApiResult<Vec<SerialDetail>> {
    let serials = state.services.serials.list_serials(query).await?;
    Ok(Json(ApiResponse::success(serials)))
}

/// Serials ready to be lent out
#[utoipa::path(
    get,
    path = "/api/v1/serials/available",
    responses(
        (status = 200, description = "Available serials", body = ApiResponse<Vec<SerialDetail>>)
    ),
    tag = "Serials"
)]
pub async fn available_serials(State(state): State<AppState>) -> ApiResult<Vec<SerialDetail>> {
    let serials = state.services.serials.available_serials().await?;
    Ok(Json(ApiResponse::success(serials)))
}

#[utoipa::path(
    get,
    path = "/api/v1/serials/{id}",
    params(("id" = Uuid, Path, description = "Serial id")),
    responses(
        (status = 200, description = "Serial", body = ApiResponse<SerialDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Serials"
)]
pub async fn get_serial(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SerialDetail> {
    let serial = state.services.serials.get_serial(id).await?;
    Ok(Json(ApiResponse::success(serial)))
}

/// Edit status, sticker, image, notes or location of a serial
#[utoipa::path(
    put,
    path = "/api/v1/serials/{id}",
    params(("id" = Uuid, Path, description = "Serial id")),
    request_body = UpdateSerialInput,
    responses(
        (status = 200, description = "Serial updated", body = ApiResponse<SerialDetail>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Serials"
)]
pub async fn update_serial(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
    Json(payload): Json<UpdateSerialInput>,
) -> Result<Json<ApiResponse<SerialDetail>>, ServiceError> {
    let serial = state
        .services
        .serials
        .update_serial(id, payload, actor.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(serial)))
}

#[utoipa::path(
    get,
    path = "/api/v1/serials/{id}/history",
    params(("id" = Uuid, Path, description = "Serial id")),
    responses(
        (status = 200, description = "Audit log, newest first", body = ApiResponse<Vec<audit_log::Model>>)
    ),
    tag = "Serials"
)]
pub async fn serial_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<audit_log::Model>> {
    let history = state.services.audit.history(SERIALS_TABLE, id).await?;
    Ok(Json(ApiResponse::success(history)))
}
