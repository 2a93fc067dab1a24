use crate::{
    services::dashboard::{DashboardStats, LowStockItem},
    ApiResponse, ApiResult, AppState,
};
use axum::{extract::State, routing::get, Json, Router};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard_stats))
        .route("/low-stock", get(low_stock))
}

/// Inventory totals, category and status breakdowns
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses(
        (status = 200, description = "Dashboard statistics", body = ApiResponse<DashboardStats>)
    ),
    tag = "Dashboard"
)]
pub async fn dashboard_stats(State(state): State<AppState>) -> ApiResult<DashboardStats> {
    let stats = state.services.dashboard.stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/low-stock",
    responses(
        (status = 200, description = "Products running low on available serials", body = ApiResponse<Vec<LowStockItem>>)
    ),
    tag = "Dashboard"
)]
pub async fn low_stock(State(state): State<AppState>) -> ApiResult<Vec<LowStockItem>> {
    let items = state.services.dashboard.low_stock().await?;
    Ok(Json(ApiResponse::success(items)))
}
