use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CreateServiceRequest, ServiceError, ServiceSearchQuery, UpdateServiceRequest};
use crate::services::catalog::ServiceCatalog;

fn map_error(e: ServiceError) -> AppError {
    match e {
        ServiceError::NotFound => AppError::NotFound("Service not found".to_string()),
        ServiceError::ValidationError(msg) => AppError::BadRequest(msg),
        ServiceError::DatabaseError(msg) => AppError::Internal(msg),
    }
}

#[axum::debug_handler]
pub async fn create_service(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<Json<Value>, AppError> {
    let catalog = ServiceCatalog::new(&state);

    let service = catalog.create_service(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "service": service,
        "message": "Service created successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_service(
    State(state): State<Arc<AppConfig>>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let catalog = ServiceCatalog::new(&state);

    let service = catalog.get_service(service_id).await.map_err(map_error)?;

    Ok(Json(json!({ "service": service })))
}

#[axum::debug_handler]
pub async fn update_service(
    State(state): State<Arc<AppConfig>>,
    Path(service_id): Path<Uuid>,
    Json(request): Json<UpdateServiceRequest>,
) -> Result<Json<Value>, AppError> {
    let catalog = ServiceCatalog::new(&state);

    let service = catalog.update_service(service_id, request).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "service": service,
        "message": "Service updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_service(
    State(state): State<Arc<AppConfig>>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let catalog = ServiceCatalog::new(&state);

    catalog.delete_service(service_id).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Service deleted successfully"
    })))
}

#[axum::debug_handler]
pub async fn search_services(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<ServiceSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let catalog = ServiceCatalog::new(&state);

    let services = catalog.search_services(query).await.map_err(map_error)?;

    Ok(Json(json!({
        "services": services,
        "count": services.len()
    })))
}
