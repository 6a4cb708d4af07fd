use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_CALENDAR_COLOR: &str = "#3B82F6";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Hex color used to identify this professional in the calendar feed.
    pub color: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row of the professional_services join table. Assignments are stored as
/// plain foreign-key pairs and queried explicitly; neither side embeds the
/// other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfessionalServiceLink {
    pub professional_id: Uuid,
    pub service_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfessionalRequest {
    pub name: String,
    pub role: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub color: Option<String>,
    pub active: Option<bool>,
    pub service_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfessionalRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub color: Option<String>,
    pub active: Option<bool>,
    pub service_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfessionalSearchQuery {
    pub search: Option<String>,
    pub active_only: Option<bool>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// Professional plus the ids of the services they are assigned to.
#[derive(Debug, Clone, Serialize)]
pub struct ProfessionalWithServices {
    #[serde(flatten)]
    pub professional: Professional,
    pub service_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ProfessionalError {
    #[error("Professional not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
