use crate::{
    errors::ServiceError,
    handlers::common::{clamp_limit, Actor},
    services::lending::{
        BorrowInput, RecentQuery, TransactionDetail, TransactionListQuery, DEFAULT_RECENT_LIMIT,
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

pub fn transactions_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(borrow))
        .route("/recent", get(recent_transactions))
        .route("/:id/return", post(return_serial))
}

/// Transactions newest first, optionally filtered by status
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    params(TransactionListQuery),
    responses(
        (status = 200, description = "Transactions", body = ApiResponse<Vec<TransactionDetail>>)
    ),
    tag = "Transactions"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionListQuery>,
) -> ApiResult<Vec<TransactionDetail>> {
    let transactions = state
        .services
        .lending
        .list_transactions(query.status)
        .await?;
    Ok(Json(ApiResponse::success(transactions)))
}

#[utoipa::path(
    get,
    path = "/api/v1/transactions/recent",
    params(RecentQuery),
    responses(
        (status = 200, description = "Latest transactions", body = ApiResponse<Vec<TransactionDetail>>)
    ),
    tag = "Transactions"
)]
pub async fn recent_transactions(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Vec<TransactionDetail>> {
    let limit = clamp_limit(
        query.limit,
        DEFAULT_RECENT_LIMIT,
        state.config.api_max_page_size,
    );
    let transactions = state.services.lending.recent_transactions(limit).await?;
    Ok(Json(ApiResponse::success(transactions)))
}

/// Lend an available serial to an employee or a department
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    request_body = BorrowInput,
    responses(
        (status = 201, description = "Serial borrowed", body = ApiResponse<TransactionDetail>),
        (status = 400, description = "Serial not available or borrower invalid", body = crate::errors::ErrorResponse),
        (status = 404, description = "Serial or borrower not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Serial already on loan", body = crate::errors::ErrorResponse)
    ),
    tag = "Transactions"
)]
pub async fn borrow(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<BorrowInput>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionDetail>>), ServiceError> {
    let transaction = state
        .services
        .lending
        .borrow(payload, actor.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(transaction))))
}

/// Return the serial of an active transaction
#[utoipa::path(
    post,
    path = "/api/v1/transactions/{id}/return",
    params(("id" = Uuid, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Serial returned", body = ApiResponse<TransactionDetail>),
        (status = 400, description = "Transaction already completed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Transactions"
)]
pub async fn return_serial(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> ApiResult<TransactionDetail> {
    let transaction = state
        .services
        .lending
        .return_serial(id, actor.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(transaction)))
}
