use crate::{
    errors::ServiceError,
    handlers::common::Actor,
    services::{
        lending::TransactionDetail,
        master_data::{CreateEmployeeInput, EmployeeDetail, UpdateEmployeeInput},
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

pub fn employees_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route(
            "/:id",
            get(get_employee).put(update_employee).delete(delete_employee),
        )
        .route("/:id/transactions", get(employee_transactions))
}

#[utoipa::path(
    get,
    path = "/api/v1/employees",
    responses(
        (status = 200, description = "Employees ordered by code", body = ApiResponse<Vec<EmployeeDetail>>)
    ),
    tag = "Employees"
)]
pub async fn list_employees(State(state): State<AppState>) -> ApiResult<Vec<EmployeeDetail>> {
    let employees = state.services.master_data.list_employees().await?;
    Ok(Json(ApiResponse::success(employees)))
}

#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = CreateEmployeeInput,
    responses(
        (status = 201, description = "Employee created", body = ApiResponse<EmployeeDetail>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Department not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Employee code taken", body = crate::errors::ErrorResponse)
    ),
    tag = "Employees"
)]
pub async fn create_employee(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateEmployeeInput>,
) -> Result<(StatusCode, Json<ApiResponse<EmployeeDetail>>), ServiceError> {
    let employee = state
        .services
        .master_data
        .create_employee(payload, actor.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(employee))))
}

#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee", body = ApiResponse<EmployeeDetail>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Employees"
)]
pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<EmployeeDetail> {
    let employee = state.services.master_data.get_employee(id).await?;
    Ok(Json(ApiResponse::success(employee)))
}

#[utoipa::path(
    put,
    path = "/api/v1/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee id")),
    request_body = UpdateEmployeeInput,
    responses(
        (status = 200, description = "Employee updated", body = ApiResponse<EmployeeDetail>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Employee code taken", body = crate::errors::ErrorResponse)
    ),
    tag = "Employees"
)]
pub async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
    Json(payload): Json<UpdateEmployeeInput>,
) -> ApiResult<EmployeeDetail> {
    let employee = state
        .services
        .master_data
        .update_employee(id, payload, actor.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(employee)))
}

/// Delete an employee with no borrow history
#[utoipa::path(
    delete,
    path = "/api/v1/employees/{id}",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Employee has transactions", body = crate::errors::ErrorResponse)
    ),
    tag = "Employees"
)]
pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .master_data
        .delete_employee(id, actor.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}/transactions",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Borrow history, newest first", body = ApiResponse<Vec<TransactionDetail>>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Employees"
)]
pub async fn employee_transactions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<TransactionDetail>> {
    let transactions = state.services.lending.employee_transactions(id).await?;
    Ok(Json(ApiResponse::success(transactions)))
}
