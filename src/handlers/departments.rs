use crate::{
    entities::department,
    errors::ServiceError,
    services::master_data::CreateDepartmentInput,
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use uuid::Uuid;

pub fn departments_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_departments).post(create_department))
        .route("/:id", delete(delete_department))
}

#[utoipa::path(
    get,
    path = "/api/v1/departments",
    responses(
        (status = 200, description = "Departments by name", body = ApiResponse<Vec<department::Model>>)
    ),
    tag = "Departments"
)]
pub async fn list_departments(State(state): State<AppState>) -> ApiResult<Vec<department::Model>> {
    let departments = state.services.master_data.list_departments().await?;
    Ok(Json(ApiResponse::success(departments)))
}

#[utoipa::path(
    post,
    path = "/api/v1/departments",
    request_body = CreateDepartmentInput,
    responses(
        (status = 201, description = "Department created", body = ApiResponse<department::Model>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    tag = "Departments"
)]
pub async fn create_department(
    State(state): State<AppState>,
    Json(payload): Json<CreateDepartmentInput>,
) -> Result<(StatusCode, Json<ApiResponse<department::Model>>), ServiceError> {
    let department = state.services.master_data.create_department(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(department))))
}

/// Delete a department; its employees are detached
#[utoipa::path(
    delete,
    path = "/api/v1/departments/{id}",
    params(("id" = Uuid, Path, description = "Department id")),
    responses(
        (status = 204, description = "Department deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Department has transactions", body = crate::errors::ErrorResponse)
    ),
    tag = "Departments"
)]
pub async fn delete_department(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.master_data.delete_department(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
