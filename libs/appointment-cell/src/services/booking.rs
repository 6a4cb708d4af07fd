use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use std::str::FromStr;
use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use professional_cell::models::Professional;
use service_cell::models::Service;

use crate::models::{
    Appointment, AppointmentError, AppointmentSearchQuery, AppointmentStatus,
    AvailabilityCheckRequest, AvailabilityCheckResponse, BookAppointmentRequest,
    UpdateStatusRequest,
};
use crate::services::conflict::ConflictDetectionService;
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::services::schedule;

pub struct AppointmentBookingService {
    supabase: Arc<SupabaseClient>,
    conflict_service: ConflictDetectionService,
    lifecycle_service: AppointmentLifecycleService,
}

impl AppointmentBookingService {
    pub fn new(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        let conflict_service = ConflictDetectionService::new(Arc::clone(&supabase));
        let lifecycle_service = AppointmentLifecycleService::new();

        Self {
            supabase,
            conflict_service,
            lifecycle_service,
        }
    }

    /// Book a new appointment.
    ///
    /// The conflict check and the insert are two separate store round trips;
    /// two concurrent bookings for the same slot can both pass the check and
    /// both persist. Single-operator deployments live with that window.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment for client {} with professional {}",
            request.client_id, request.professional_id
        );

        let date = schedule::parse_date(&request.appointment_date)?;
        let start = schedule::parse_time(&request.start_time)?;

        let status = match &request.status {
            Some(s) => AppointmentStatus::from_str(s)?,
            None => AppointmentStatus::Scheduled,
        };

        self.verify_client_exists(request.client_id).await?;
        self.get_active_professional(request.professional_id).await?;
        let service = self.get_active_service(request.service_id).await?;
        self.verify_service_offered(request.professional_id, request.service_id)
            .await?;

        let end = schedule::resolve_end_time(service.duration, date, start)?;

        if self
            .conflict_service
            .has_conflict(request.professional_id, date, start, end, None)
            .await?
        {
            warn!(
                "Booking rejected: professional {} already booked around {} {}",
                request.professional_id, date, start
            );
            return Err(AppointmentError::SchedulingConflict);
        }

        let now = Utc::now();
        let appointment_data = json!({
            "client_id": request.client_id,
            "professional_id": request.professional_id,
            "service_id": request.service_id,
            "appointment_date": date.to_string(),
            "start_time": start.format("%H:%M:%S").to_string(),
            "end_time": end.format("%H:%M:%S").to_string(),
            "status": status.to_string(),
            "price": request.price.unwrap_or(service.price),
            "notes": request.notes,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(appointment_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::DatabaseError(
                "Failed to create appointment".to_string(),
            ));
        }

        let appointment: Appointment = serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))?;

        info!("Appointment {} booked", appointment.id);
        Ok(appointment)
    }

    /// Move an appointment to a new slot, re-running the full booking
    /// validation. The appointment's own window is excluded from the conflict
    /// check so shrinking or shifting within it succeeds.
    pub async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Rescheduling appointment {}", appointment_id);

        self.get_appointment(appointment_id).await?;

        let date = schedule::parse_date(&request.appointment_date)?;
        let start = schedule::parse_time(&request.start_time)?;

        let status = match &request.status {
            Some(s) => Some(AppointmentStatus::from_str(s)?),
            None => None,
        };

        self.verify_client_exists(request.client_id).await?;
        self.get_active_professional(request.professional_id).await?;
        let service = self.get_active_service(request.service_id).await?;
        self.verify_service_offered(request.professional_id, request.service_id)
            .await?;

        let end = schedule::resolve_end_time(service.duration, date, start)?;

        if self
            .conflict_service
            .has_conflict(request.professional_id, date, start, end, Some(appointment_id))
            .await?
        {
            return Err(AppointmentError::SchedulingConflict);
        }

        let mut update_data = serde_json::Map::new();
        update_data.insert("client_id".to_string(), json!(request.client_id));
        update_data.insert("professional_id".to_string(), json!(request.professional_id));
        update_data.insert("service_id".to_string(), json!(request.service_id));
        update_data.insert("appointment_date".to_string(), json!(date.to_string()));
        update_data.insert("start_time".to_string(), json!(start.format("%H:%M:%S").to_string()));
        update_data.insert("end_time".to_string(), json!(end.format("%H:%M:%S").to_string()));
        if let Some(status) = status {
            update_data.insert("status".to_string(), json!(status.to_string()));
        }
        // Re-snapshot the price from the (possibly new) service unless the
        // caller overrides it, same as at creation.
        update_data.insert(
            "price".to_string(),
            json!(request.price.unwrap_or(service.price)),
        );
        if let Some(notes) = request.notes {
            update_data.insert("notes".to_string(), json!(notes));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        self.patch_appointment(appointment_id, Value::Object(update_data))
            .await
    }

    /// Change status only. No conflict re-check happens here.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        request: UpdateStatusRequest,
    ) -> Result<Appointment, AppointmentError> {
        let new_status = AppointmentStatus::from_str(&request.status)?;

        let mut appointment = self.get_appointment(appointment_id).await?;
        self.lifecycle_service
            .apply_status_transition(&mut appointment, new_status, request.notes);

        let update_data = json!({
            "status": appointment.status.to_string(),
            "notes": appointment.notes,
            "updated_at": Utc::now().to_rfc3339()
        });

        self.patch_appointment(appointment_id, update_data).await
    }

    /// Dry-run of the conflict check. Nothing is persisted.
    pub async fn check_availability(
        &self,
        request: AvailabilityCheckRequest,
    ) -> Result<AvailabilityCheckResponse, AppointmentError> {
        let date = schedule::parse_date(&request.appointment_date)?;
        let start = schedule::parse_time(&request.start_time)?;

        let service = self.get_service(request.service_id).await?;
        let end = schedule::resolve_end_time(service.duration, date, start)?;

        let conflict = self
            .conflict_service
            .has_conflict(
                request.professional_id,
                date,
                start,
                end,
                request.exclude_appointment_id,
            )
            .await?;

        Ok(AvailabilityCheckResponse {
            available: !conflict,
            end_time: end.format("%H:%M").to_string(),
        })
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    /// List appointments, most recent first.
    pub async fn search_appointments(
        &self,
        query: AppointmentSearchQuery,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut query_parts = Vec::new();

        if let Some(start_date) = query.start_date {
            query_parts.push(format!("appointment_date=gte.{}", start_date));
        }
        if let Some(end_date) = query.end_date {
            query_parts.push(format!("appointment_date=lte.{}", end_date));
        }
        if let Some(professional_id) = query.professional_id {
            query_parts.push(format!("professional_id=eq.{}", professional_id));
        }
        if let Some(client_id) = query.client_id {
            query_parts.push(format!("client_id=eq.{}", client_id));
        }
        if let Some(service_id) = query.service_id {
            query_parts.push(format!("service_id=eq.{}", service_id));
        }
        if let Some(status) = &query.status {
            // Validate before it becomes a filter, bad values 400 instead of
            // silently matching nothing.
            let status = AppointmentStatus::from_str(status)?;
            query_parts.push(format!("status=eq.{}", status));
        }

        query_parts.push("order=appointment_date.desc,start_time.desc".to_string());

        if let Some(limit) = query.limit {
            query_parts.push(format!("limit={}", limit));
        }
        if let Some(offset) = query.offset {
            query_parts.push(format!("offset={}", offset));
        }

        let path = format!("/rest/v1/appointments?{}", query_parts.join("&"));

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Appointment>, _>>()
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointments: {}", e)))
    }

    pub async fn delete_appointment(&self, appointment_id: Uuid) -> Result<(), AppointmentError> {
        self.get_appointment(appointment_id).await?;

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        self.supabase
            .execute(Method::DELETE, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))
    }

    // ==========================================================================
    // PRIVATE HELPERS
    // ==========================================================================

    async fn patch_appointment(
        &self,
        appointment_id: Uuid,
        update_data: Value,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(update_data),
                Some(representation_headers()),
            )
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::NotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse appointment: {}", e)))
    }

    async fn verify_client_exists(&self, client_id: Uuid) -> Result<(), AppointmentError> {
        let path = format!("/rest/v1/clients?id=eq.{}&select=id", client_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::ClientNotFound);
        }
        Ok(())
    }

    async fn get_active_professional(
        &self,
        professional_id: Uuid,
    ) -> Result<Professional, AppointmentError> {
        let path = format!("/rest/v1/professionals?id=eq.{}", professional_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::ProfessionalNotFound);
        }

        let professional: Professional = serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse professional: {}", e)))?;

        if !professional.active {
            return Err(AppointmentError::InactiveProfessional);
        }

        Ok(professional)
    }

    async fn get_service(&self, service_id: Uuid) -> Result<Service, AppointmentError> {
        let path = format!("/rest/v1/services?id=eq.{}", service_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::ServiceNotFound);
        }

        serde_json::from_value(result[0].clone())
            .map_err(|e| AppointmentError::DatabaseError(format!("Failed to parse service: {}", e)))
    }

    async fn get_active_service(&self, service_id: Uuid) -> Result<Service, AppointmentError> {
        let service = self.get_service(service_id).await?;
        if !service.active {
            return Err(AppointmentError::InactiveService);
        }
        Ok(service)
    }

    async fn verify_service_offered(
        &self,
        professional_id: Uuid,
        service_id: Uuid,
    ) -> Result<(), AppointmentError> {
        let path = format!(
            "/rest/v1/professional_services?professional_id=eq.{}&service_id=eq.{}&select=service_id",
            professional_id, service_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(AppointmentError::ServiceNotOffered);
        }
        Ok(())
    }
}

fn representation_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}
