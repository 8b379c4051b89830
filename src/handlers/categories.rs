use super::common::{created, json_body, StatusFilter};
use crate::entities::category;
use crate::errors::ApiError;
use crate::services::categories::CategoryInput;
use crate::{ApiResponse, AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    summary = "List categories",
    params(StatusFilter),
    responses(
        (status = 200, description = "Categories ordered by name", body = ApiResponse<Vec<category::Model>>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<ApiResponse<Vec<category::Model>>>, ApiError> {
    let categories = state
        .services
        .categories
        .list(filter.include_inactive)
        .await?;
    Ok(Json(ApiResponse::success(categories)))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    summary = "Create category",
    request_body = CategoryInput,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<category::Model>),
        (status = 400, description = "Invalid category data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse),
    ),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    payload: Result<Json<CategoryInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input = json_body(payload)?;
    let category = state.services.categories.create(input).await?;
    Ok(created(category))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    summary = "Get category",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<category::Model>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<category::Model>>, ApiError> {
    let category = state.services.categories.get(id).await?;
    Ok(Json(ApiResponse::success(category)))
}

#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    summary = "Update category",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<category::Model>),
        (status = 400, description = "Invalid category data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse),
    ),
    tag = "Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<Json<CategoryInput>, JsonRejection>,
) -> Result<Json<ApiResponse<category::Model>>, ApiError> {
    let input = json_body(payload)?;
    let category = state.services.categories.update(id, input).await?;
    Ok(Json(ApiResponse::success(category)))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories/{id}/deactivate",
    summary = "Deactivate category",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deactivated", body = ApiResponse<category::Model>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Categories"
)]
pub async fn deactivate_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<category::Model>>, ApiError> {
    let category = state.services.categories.deactivate(id).await?;
    Ok(Json(ApiResponse::success(category)))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories/{id}/activate",
    summary = "Reactivate category",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category activated", body = ApiResponse<category::Model>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Categories"
)]
pub async fn activate_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<category::Model>>, ApiError> {
    let category = state.services.categories.activate(id).await?;
    Ok(Json(ApiResponse::success(category)))
}

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/:id", get(get_category).put(update_category))
        .route("/:id/deactivate", post(deactivate_category))
        .route("/:id/activate", post(activate_category))
}
