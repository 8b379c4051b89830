use super::common::PaginationParams;
use crate::entities::sale;
use crate::errors::ApiError;
use crate::services::sales::{SaleDetail, SaleError, SaleRequest, SaleResult};
use crate::{ApiResponse, AppState, PaginatedResponse};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

/// Runs the sale workflow. The body is always a `SaleResult`; the status code
/// tells success (201) from rejected (400/422) and failed (500) sales.
#[utoipa::path(
    post,
    path = "/api/v1/sales",
    summary = "Record a sale",
    description = "Validates stock for every line, then records the sale and decrements stock in one transaction.",
    request_body = SaleRequest,
    responses(
        (status = 201, description = "Sale recorded", body = SaleResult),
        (status = 400, description = "Malformed sale request", body = SaleResult),
        (status = 422, description = "Sale rejected by a business rule", body = SaleResult),
        (status = 500, description = "Sale failed unexpectedly", body = SaleResult),
    ),
    tag = "Sales"
)]
pub async fn create_sale(
    State(state): State<AppState>,
    payload: Result<Json<SaleRequest>, JsonRejection>,
) -> (StatusCode, Json<SaleResult>) {
    let outcome = match payload {
        Ok(Json(request)) => state.services.sales.create_sale(request).await,
        Err(rejection) => Err(SaleError::InvalidRequest(vec![rejection.body_text()])),
    };

    let status = match &outcome {
        Ok(_) => StatusCode::CREATED,
        Err(err) => err.status_code(),
    };
    (status, Json(SaleResult::from(outcome)))
}

#[utoipa::path(
    get,
    path = "/api/v1/sales",
    summary = "List sales",
    params(PaginationParams),
    responses(
        (status = 200, description = "Sale headers, newest first", body = ApiResponse<PaginatedResponse<sale::Model>>),
    ),
    tag = "Sales"
)]
pub async fn list_sales(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<sale::Model>>>, ApiError> {
    let (page, per_page) = params.normalized();
    let result = state.services.sales.list_sales(page, per_page).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        result.items,
        result.total,
        page,
        per_page,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/sales/{id}",
    summary = "Get sale with its lines",
    params(("id" = i32, Path, description = "Sale ID")),
    responses(
        (status = 200, description = "Sale found", body = ApiResponse<SaleDetail>),
        (status = 404, description = "Sale not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Sales"
)]
pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<SaleDetail>>, ApiError> {
    let sale = state.services.sales.get_sale(id).await?;
    Ok(Json(ApiResponse::success(sale)))
}

pub fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales).post(create_sale))
        .route("/:id", get(get_sale))
}
