use crate::{
    entities::audit_log,
    errors::ServiceError,
    handlers::common::Actor,
    services::{
        audit::PRODUCTS_TABLE,
        import::ImportReport,
        products::{
            CreateProductInput, ProductListQuery, ProductWithSerials, ProductWithStock,
            UpdateProductInput,
        },
        serials::SerialDetail,
    },
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/next-sku", get(next_sku))
        .route("/import", post(import_products))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/:id/serials", get(product_serials))
        .route("/:id/history", get(product_history))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NextSkuQuery {
    /// Category label, e.g. `เฟอร์นิเจอร์ (FR)`
    pub category: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NextSkuResponse {
    pub category: String,
    #[schema(example = "FR-0003")]
    pub p_id: String,
}

/// List products with derived stock
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Products, newest first", body = ApiResponse<Vec<ProductWithStock>>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> ApiResult<Vec<ProductWithStock>> {
    let products = state.services.products.list_products(query).await?;
    Ok(Json(ApiResponse::success(products)))
}

/// Create a product and its initial serial batch
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = CreateProductInput,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductWithSerials>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU already taken", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateProductInput>,
) -> Result<(StatusCode, Json<ApiResponse<ProductWithSerials>>), ServiceError> {
    let created = state
        .services
        .products
        .create_product(payload, actor.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

/// Preview the next SKU for a category
#[utoipa::path(
    get,
    path = "/api/v1/products/next-sku",
    params(NextSkuQuery),
    responses(
        (status = 200, description = "Next SKU", body = ApiResponse<NextSkuResponse>),
        (status = 400, description = "Sequence exhausted", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn next_sku(
    State(state): State<AppState>,
    Query(query): Query<NextSkuQuery>,
) -> ApiResult<NextSkuResponse> {
    let p_id = state.services.products.next_sku(&query.category).await?;
    Ok(Json(ApiResponse::success(NextSkuResponse {
        category: query.category,
        p_id,
    })))
}

/// Import products from a CSV body
#[utoipa::path(
    post,
    path = "/api/v1/products/import",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Per-row outcome", body = ApiResponse<ImportReport>),
        (status = 400, description = "Unreadable CSV", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn import_products(
    State(state): State<AppState>,
    actor: Actor,
    body: String,
) -> ApiResult<ImportReport> {
    let report = state
        .services
        .import
        .import_csv(&body, actor.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = ApiResponse<ProductWithStock>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ProductWithStock> {
    let product = state.services.products.get_product(id).await?;
    Ok(Json(ApiResponse::success(product)))
}

/// Update a product; a larger quantity appends serials
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = UpdateProductInput,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductWithSerials>),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
    Json(payload): Json<UpdateProductInput>,
) -> ApiResult<ProductWithSerials> {
    let updated = state
        .services
        .products
        .update_product(id, payload, actor.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// Delete a product with its serials and their transactions
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Serials on loan", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .products
        .delete_product(id, actor.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/serials",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Serials ordered by code", body = ApiResponse<Vec<SerialDetail>>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn product_serials(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<SerialDetail>> {
    let serials = state.services.serials.serials_for_product(id).await?;
    Ok(Json(ApiResponse::success(serials)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/history",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Audit log, newest first", body = ApiResponse<Vec<audit_log::Model>>)
    ),
    tag = "Products"
)]
pub async fn product_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<audit_log::Model>> {
    let history = state.services.audit.history(PRODUCTS_TABLE, id).await?;
    Ok(Json(ApiResponse::success(history)))
}
