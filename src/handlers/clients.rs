use super::common::{created, json_body};
use crate::entities::client;
use crate::errors::ApiError;
use crate::services::clients::ClientInput;
use crate::{ApiResponse, AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

#[utoipa::path(
    get,
    path = "/api/v1/clients",
    summary = "List clients",
    responses(
        (status = 200, description = "Clients ordered by business name", body = ApiResponse<Vec<client::Model>>),
    ),
    tag = "Clients"
)]
pub async fn list_clients(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<client::Model>>>, ApiError> {
    let clients = state.services.clients.list().await?;
    Ok(Json(ApiResponse::success(clients)))
}

#[utoipa::path(
    post,
    path = "/api/v1/clients",
    summary = "Register client",
    request_body = ClientInput,
    responses(
        (status = 201, description = "Client created", body = ApiResponse<client::Model>),
        (status = 400, description = "Invalid client data", body = crate::errors::ErrorResponse),
        (status = 409, description = "Tax document already registered", body = crate::errors::ErrorResponse),
    ),
    tag = "Clients"
)]
pub async fn create_client(
    State(state): State<AppState>,
    payload: Result<Json<ClientInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input = json_body(payload)?;
    let client = state.services.clients.create(input).await?;
    Ok(created(client))
}

#[utoipa::path(
    get,
    path = "/api/v1/clients/{id}",
    summary = "Get client",
    params(("id" = i32, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Client found", body = ApiResponse<client::Model>),
        (status = 404, description = "Client not found", body = crate::errors::ErrorResponse),
    ),
    tag = "Clients"
)]
pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<client::Model>>, ApiError> {
    let client = state.services.clients.get(id).await?;
    Ok(Json(ApiResponse::success(client)))
}

#[utoipa::path(
    get,
    path = "/api/v1/clients/by-document/{tax_document}",
    summary = "Find client by tax document",
    params(("tax_document" = String, Path, description = "Tax document")),
    responses(
        (status = 200, description = "Client found", body = ApiResponse<client::Model>),
        (status = 404, description = "No client with that document", body = crate::errors::ErrorResponse),
    ),
    tag = "Clients"
)]
pub async fn get_client_by_document(
    State(state): State<AppState>,
    Path(tax_document): Path<String>,
) -> Result<Json<ApiResponse<client::Model>>, ApiError> {
    let client = state
        .services
        .clients
        .get_by_tax_document(&tax_document)
        .await?;
    Ok(Json(ApiResponse::success(client)))
}

#[utoipa::path(
    put,
    path = "/api/v1/clients/{id}",
    summary = "Update client",
    params(("id" = i32, Path, description = "Client ID")),
    request_body = ClientInput,
    responses(
        (status = 200, description = "Client updated", body = ApiResponse<client::Model>),
        (status = 400, description = "Invalid client data", body = crate::errors::ErrorResponse),
        (status = 404, description = "Client not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Tax document already registered", body = crate::errors::ErrorResponse),
    ),
    tag = "Clients"
)]
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<Json<ClientInput>, JsonRejection>,
) -> Result<Json<ApiResponse<client::Model>>, ApiError> {
    let input = json_body(payload)?;
    let client = state.services.clients.update(id, input).await?;
    Ok(Json(ApiResponse::success(client)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/clients/{id}",
    summary = "Remove client",
    params(("id" = i32, Path, description = "Client ID")),
    responses(
        (status = 204, description = "Client removed"),
        (status = 404, description = "Client not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Client has recorded sales", body = crate::errors::ErrorResponse),
    ),
    tag = "Clients"
)]
pub async fn remove_client(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    state.services.clients.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_clients).post(create_client))
        .route("/by-document/:tax_document", get(get_client_by_document))
        .route(
            "/:id",
            get(get_client).put(update_client).delete(remove_client),
        )
}
