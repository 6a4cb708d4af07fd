use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{ClientError, ClientSearchQuery, CreateClientRequest, UpdateClientRequest};
use crate::services::client::ClientService;

fn map_error(e: ClientError) -> AppError {
    match e {
        ClientError::NotFound => AppError::NotFound("Client not found".to_string()),
        ClientError::ValidationError(msg) => AppError::BadRequest(msg),
        ClientError::DatabaseError(msg) => AppError::Internal(msg),
    }
}

#[axum::debug_handler]
pub async fn create_client(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateClientRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ClientService::new(&state);

    let client = service.create_client(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "client": client,
        "message": "Client created successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_client(
    State(state): State<Arc<AppConfig>>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ClientService::new(&state);

    let client = service.get_client(client_id).await.map_err(map_error)?;

    Ok(Json(json!({ "client": client })))
}

#[axum::debug_handler]
pub async fn update_client(
    State(state): State<Arc<AppConfig>>,
    Path(client_id): Path<Uuid>,
    Json(request): Json<UpdateClientRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ClientService::new(&state);

    let client = service.update_client(client_id, request).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "client": client,
        "message": "Client updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_client(
    State(state): State<Arc<AppConfig>>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ClientService::new(&state);

    service.delete_client(client_id).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Client deleted successfully"
    })))
}

#[axum::debug_handler]
pub async fn search_clients(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<ClientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ClientService::new(&state);

    let clients = service.search_clients(query).await.map_err(map_error)?;

    Ok(Json(json!({
        "clients": clients,
        "count": clients.len()
    })))
}
