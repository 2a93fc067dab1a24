use crate::{
    services::codes::{self, SYSTEM_CATEGORIES},
    ApiResponse, ApiResult, AppState,
};
use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryInfo {
    #[schema(example = "ไอที/อิเล็กทรอนิกส์ (IT)")]
    pub label: String,
    /// SKU prefix taken from the label
    #[schema(example = "IT")]
    pub code: String,
}

pub fn category_list() -> Vec<CategoryInfo> {
    SYSTEM_CATEGORIES
        .iter()
        .map(|label| CategoryInfo {
            label: label.to_string(),
            code: codes::sku_prefix(label),
        })
        .collect()
}

pub fn categories_routes() -> Router<AppState> {
    Router::new().route("/", get(list_categories))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "System categories", body = ApiResponse<Vec<CategoryInfo>>)
    ),
    tag = "Categories"
)]
pub async fn list_categories() -> ApiResult<Vec<CategoryInfo>> {
    Ok(Json(ApiResponse::success(category_list())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_its_own_code() {
        let categories = category_list();
        assert_eq!(categories.len(), SYSTEM_CATEGORIES.len());
        assert_eq!(categories[0].code, "IT");
        let mut codes: Vec<_> = categories.iter().map(|c| c.code.as_str()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), SYSTEM_CATEGORIES.len());
    }
}
