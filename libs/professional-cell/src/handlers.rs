use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    CreateProfessionalRequest, ProfessionalError, ProfessionalSearchQuery, UpdateProfessionalRequest,
};
use crate::services::professional::ProfessionalService;

fn map_error(e: ProfessionalError) -> AppError {
    match e {
        ProfessionalError::NotFound => AppError::NotFound("Professional not found".to_string()),
        ProfessionalError::ValidationError(msg) => AppError::BadRequest(msg),
        ProfessionalError::DatabaseError(msg) => AppError::Internal(msg),
    }
}

#[axum::debug_handler]
pub async fn create_professional(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateProfessionalRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfessionalService::new(&state);

    let professional = service.create_professional(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "professional": professional,
        "message": "Professional created successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_professional(
    State(state): State<Arc<AppConfig>>,
    Path(professional_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ProfessionalService::new(&state);

    let professional = service.get_professional(professional_id).await.map_err(map_error)?;

    Ok(Json(json!({ "professional": professional })))
}

#[axum::debug_handler]
pub async fn update_professional(
    State(state): State<Arc<AppConfig>>,
    Path(professional_id): Path<Uuid>,
    Json(request): Json<UpdateProfessionalRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfessionalService::new(&state);

    let professional = service
        .update_professional(professional_id, request)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "professional": professional,
        "message": "Professional updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_professional(
    State(state): State<Arc<AppConfig>>,
    Path(professional_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ProfessionalService::new(&state);

    service.delete_professional(professional_id).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Professional deleted successfully"
    })))
}

#[axum::debug_handler]
pub async fn search_professionals(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<ProfessionalSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ProfessionalService::new(&state);

    let professionals = service.search_professionals(query).await.map_err(map_error)?;

    Ok(Json(json!({
        "professionals": professionals,
        "count": professionals.len()
    })))
}
