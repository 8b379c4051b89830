use super::common::{created, json_body, StatusFilter};
use crate::entities::product;
use crate::errors::ApiError;
use crate::services::products::{ProductDetail, ProductInput};
use crate::{ApiResponse, AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Text matched against name, description, brand and category name
    #[serde(default)]
    pub term: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockQuery {
    /// Units the till wants to sell
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StockAvailability {
    pub product_id: i32,
    pub quantity: i32,
    pub available: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    summary = "List products",
    params(StatusFilter),
    responses(
        (status = 200, description = "Products ordered by name", body = ApiResponse<Vec<product::Model>>),
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<ApiResponse<Vec<product::Model>>>, ApiError> {
    let products = state.services.products.list(filter.include_inactive).await?;
    Ok(Json(ApiResponse::success(products)))
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    summary = "Create product",
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<product::Model>),
        (status = 400, description = "Invalid product data or unusable category", body = crate::errors::ErrorResponse),
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input = json_body(payload)?;
    let product = state.services.products.create(input).await?;
    Ok(created(product))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/search",
    summary = "Search sellable products",
    description = "Case-insensitive substring search over active products in active categories. A blank term returns an empty list.",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching products ordered by name", body = ApiResponse<Vec<product::Model>>),
    ),
    tag = "Products"
)]
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<product::Model>>>, ApiError> {
    let products = state.services.products.search(&query.term).await?;
    Ok(Json(ApiResponse::success(products)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    summary = "Get product with its category",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let product = state.services.products.get_detail(id).await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    summary = "Update product",
    params(("id" = i32, Path, description = "Product ID")),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<product::Model>),
        (status = 400, description = "Invalid product data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> Result<Json<ApiResponse<product::Model>>, ApiError> {
    let input = json_body(payload)?;
    let product = state.services.products.update(id, input).await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/deactivate",
    summary = "Deactivate product",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deactivated", body = ApiResponse<product::Model>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Products"
)]
pub async fn deactivate_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<product::Model>>, ApiError> {
    let product = state.services.products.deactivate(id).await?;
    Ok(Json(ApiResponse::success(product)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/stock",
    summary = "Check stock availability",
    params(("id" = i32, Path, description = "Product ID"), StockQuery),
    responses(
        (status = 200, description = "Availability answer; missing or inactive products report false", body = ApiResponse<StockAvailability>),
        (status = 400, description = "Quantity below 1", body = crate::errors::ErrorResponse),
    ),
    tag = "Products"
)]
pub async fn check_stock(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<StockQuery>,
) -> Result<Json<ApiResponse<StockAvailability>>, ApiError> {
    if query.quantity < 1 {
        return Err(ApiError::BadRequest("quantity must be at least 1".into()));
    }
    let available = state
        .services
        .products
        .has_sufficient_stock(id, query.quantity)
        .await?;
    Ok(Json(ApiResponse::success(StockAvailability {
        product_id: id,
        quantity: query.quantity,
        available,
    })))
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_products))
        .route("/:id", get(get_product).put(update_product))
        .route("/:id/deactivate", post(deactivate_product))
        .route("/:id/stock", get(check_stock))
}
