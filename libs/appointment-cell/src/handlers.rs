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
    AppointmentError, AppointmentSearchQuery, AvailabilityCheckRequest, BookAppointmentRequest,
    CalendarQuery, UpdateStatusRequest,
};
use crate::services::booking::AppointmentBookingService;
use crate::services::calendar::CalendarService;

fn map_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::ClientNotFound
        | AppointmentError::ProfessionalNotFound
        | AppointmentError::ServiceNotFound => AppError::NotFound(e.to_string()),
        AppointmentError::SchedulingConflict => AppError::Conflict(e.to_string()),
        AppointmentError::ValidationError(_)
        | AppointmentError::InvalidDuration(_)
        | AppointmentError::InvalidTimeFormat(_)
        | AppointmentError::InvalidStatus(_)
        | AppointmentError::InactiveProfessional
        | AppointmentError::InactiveService
        | AppointmentError::ServiceNotOffered => AppError::BadRequest(e.to_string()),
        AppointmentError::DatabaseError(msg) => AppError::Internal(msg),
    }
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let appointment = service.book_appointment(request).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let appointment = service.get_appointment(appointment_id).await.map_err(map_error)?;

    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let appointment = service
        .reschedule_appointment(appointment_id, request)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let appointment = service
        .update_status(appointment_id, request)
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment status updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    service.delete_appointment(appointment_id).await.map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment deleted successfully"
    })))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let appointments = service.search_appointments(query).await.map_err(map_error)?;

    Ok(Json(json!({
        "appointments": appointments,
        "count": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn check_availability(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<AvailabilityCheckRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::new(&state);

    let response = service.check_availability(request).await.map_err(map_error)?;

    Ok(Json(json!(response)))
}

#[axum::debug_handler]
pub async fn calendar_events(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Value>, AppError> {
    let service = CalendarService::new(&state);

    let events = service.calendar_events(query).await.map_err(map_error)?;

    Ok(Json(json!({ "events": events })))
}
