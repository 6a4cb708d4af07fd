use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub service_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    /// Derived from the service duration at booking time. A booking that runs
    /// past midnight stores an end_time smaller than start_time.
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    /// Snapshot of the service price at booking time; later catalogue price
    /// changes never touch existing appointments.
    pub price: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Statuses whose time window blocks other bookings. Cancelled and no-show
    /// appointments free their slot.
    pub fn is_protected(&self) -> bool {
        matches!(self, AppointmentStatus::Scheduled | AppointmentStatus::Completed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "no_show" => Ok(AppointmentStatus::NoShow),
            other => Err(AppointmentError::InvalidStatus(other.to_string())),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub service_id: Uuid,
    /// "YYYY-MM-DD"
    pub appointment_date: String,
    /// "HH:MM" (seconds accepted)
    pub start_time: String,
    pub status: Option<String>,
    pub notes: Option<String>,
    /// Overrides the service price snapshot when present.
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityCheckRequest {
    pub professional_id: Uuid,
    pub service_id: Uuid,
    pub appointment_date: String,
    pub start_time: String,
    pub exclude_appointment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityCheckResponse {
    pub available: bool,
    /// "HH:MM"
    pub end_time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentSearchQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub professional_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub status: Option<String>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub professional_id: Option<Uuid>,
}

/// Event shape consumed by the calendar frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: Uuid,
    /// "<client name> - <service name>"
    pub title: String,
    /// "YYYY-MM-DDTHH:MM:SS"
    pub start: String,
    pub end: String,
    pub background_color: String,
    pub border_color: String,
    pub text_color: String,
    pub appointment: Appointment,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid service duration: {0} minutes")]
    InvalidDuration(i32),

    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    #[error("Appointment not found")]
    NotFound,

    #[error("Client not found")]
    ClientNotFound,

    #[error("Professional not found")]
    ProfessionalNotFound,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("Professional is not active")]
    InactiveProfessional,

    #[error("Service is not active")]
    InactiveService,

    #[error("Professional does not offer this service")]
    ServiceNotOffered,

    #[error("The requested time slot conflicts with an existing appointment")]
    SchedulingConflict,

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
