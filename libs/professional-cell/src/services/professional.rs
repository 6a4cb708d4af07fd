use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    CreateProfessionalRequest, Professional, ProfessionalError, ProfessionalSearchQuery,
    ProfessionalServiceLink, ProfessionalWithServices, UpdateProfessionalRequest,
    DEFAULT_CALENDAR_COLOR,
};

pub struct ProfessionalService {
    supabase: SupabaseClient,
}

impl ProfessionalService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_professional(
        &self,
        request: CreateProfessionalRequest,
    ) -> Result<ProfessionalWithServices, ProfessionalError> {
        if request.name.trim().is_empty() || request.role.trim().is_empty() {
            return Err(ProfessionalError::ValidationError(
                "name and role are required".to_string(),
            ));
        }

        debug!("Creating professional: {}", request.name);

        let now = chrono::Utc::now();
        let professional_data = json!({
            "name": request.name,
            "role": request.role,
            "phone": request.phone,
            "email": request.email,
            "color": request.color.unwrap_or_else(|| DEFAULT_CALENDAR_COLOR.to_string()),
            "active": request.active.unwrap_or(true),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/professionals",
            Some(professional_data),
            Some(headers),
        ).await.map_err(|e| ProfessionalError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ProfessionalError::DatabaseError("Failed to create professional".to_string()));
        }

        let professional: Professional = serde_json::from_value(result[0].clone())
            .map_err(|e| ProfessionalError::DatabaseError(format!("Failed to parse professional: {}", e)))?;

        let service_ids = request.service_ids.unwrap_or_default();
        if !service_ids.is_empty() {
            self.replace_service_links(professional.id, &service_ids).await?;
        }

        Ok(ProfessionalWithServices { professional, service_ids })
    }

    pub async fn get_professional(
        &self,
        professional_id: Uuid,
    ) -> Result<ProfessionalWithServices, ProfessionalError> {
        debug!("Fetching professional: {}", professional_id);

        let path = format!("/rest/v1/professionals?id=eq.{}", professional_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
        ).await.map_err(|e| ProfessionalError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ProfessionalError::NotFound);
        }

        let professional: Professional = serde_json::from_value(result[0].clone())
            .map_err(|e| ProfessionalError::DatabaseError(format!("Failed to parse professional: {}", e)))?;

        let service_ids = self.service_ids_for(professional_id).await?;

        Ok(ProfessionalWithServices { professional, service_ids })
    }

    pub async fn update_professional(
        &self,
        professional_id: Uuid,
        request: UpdateProfessionalRequest,
    ) -> Result<ProfessionalWithServices, ProfessionalError> {
        debug!("Updating professional: {}", professional_id);

        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name {
            if name.trim().is_empty() {
                return Err(ProfessionalError::ValidationError("name cannot be empty".to_string()));
            }
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(role) = request.role {
            update_data.insert("role".to_string(), json!(role));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(email) = request.email {
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(color) = request.color {
            update_data.insert("color".to_string(), json!(color));
        }
        if let Some(active) = request.active {
            update_data.insert("active".to_string(), json!(active));
        }
        update_data.insert("updated_at".to_string(), json!(chrono::Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/professionals?id=eq.{}", professional_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(Value::Object(update_data)),
            Some(headers),
        ).await.map_err(|e| ProfessionalError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ProfessionalError::NotFound);
        }

        let professional: Professional = serde_json::from_value(result[0].clone())
            .map_err(|e| ProfessionalError::DatabaseError(format!("Failed to parse professional: {}", e)))?;

        let service_ids = match request.service_ids {
            Some(ids) => {
                self.replace_service_links(professional_id, &ids).await?;
                ids
            }
            None => self.service_ids_for(professional_id).await?,
        };

        Ok(ProfessionalWithServices { professional, service_ids })
    }

    pub async fn delete_professional(&self, professional_id: Uuid) -> Result<(), ProfessionalError> {
        debug!("Deleting professional: {}", professional_id);

        self.get_professional(professional_id).await?;

        // Join rows first, then the professional itself
        let links_path = format!("/rest/v1/professional_services?professional_id=eq.{}", professional_id);
        self.supabase.execute(Method::DELETE, &links_path, None)
            .await
            .map_err(|e| ProfessionalError::DatabaseError(e.to_string()))?;

        let path = format!("/rest/v1/professionals?id=eq.{}", professional_id);
        self.supabase.execute(Method::DELETE, &path, None)
            .await
            .map_err(|e| ProfessionalError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// List professionals ordered by name. `search` matches name or role as a
    /// substring; `active_only` drops inactive rows.
    pub async fn search_professionals(
        &self,
        query: ProfessionalSearchQuery,
    ) -> Result<Vec<Professional>, ProfessionalError> {
        let mut query_parts = Vec::new();

        if let Some(search) = query.search.filter(|s| !s.is_empty()) {
            let pattern = format!("(name.ilike.*{s}*,role.ilike.*{s}*)", s = search);
            query_parts.push(format!("or={}", urlencoding::encode(&pattern)));
        }
        if query.active_only.unwrap_or(false) {
            query_parts.push("active=eq.true".to_string());
        }

        query_parts.push("order=name.asc".to_string());

        if let Some(limit) = query.limit {
            query_parts.push(format!("limit={}", limit));
        }
        if let Some(offset) = query.offset {
            query_parts.push(format!("offset={}", offset));
        }

        let path = format!("/rest/v1/professionals?{}", query_parts.join("&"));

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
        ).await.map_err(|e| ProfessionalError::DatabaseError(e.to_string()))?;

        let professionals: Vec<Professional> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Professional>, _>>()
            .map_err(|e| ProfessionalError::DatabaseError(format!("Failed to parse professionals: {}", e)))?;

        Ok(professionals)
    }

    /// Assigned service ids, read from the join table in one query.
    pub async fn service_ids_for(&self, professional_id: Uuid) -> Result<Vec<Uuid>, ProfessionalError> {
        let path = format!("/rest/v1/professional_services?professional_id=eq.{}", professional_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
        ).await.map_err(|e| ProfessionalError::DatabaseError(e.to_string()))?;

        let links: Vec<ProfessionalServiceLink> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ProfessionalServiceLink>, _>>()
            .map_err(|e| ProfessionalError::DatabaseError(format!("Failed to parse service links: {}", e)))?;

        Ok(links.into_iter().map(|link| link.service_id).collect())
    }

    async fn replace_service_links(
        &self,
        professional_id: Uuid,
        service_ids: &[Uuid],
    ) -> Result<(), ProfessionalError> {
        let path = format!("/rest/v1/professional_services?professional_id=eq.{}", professional_id);
        self.supabase.execute(Method::DELETE, &path, None)
            .await
            .map_err(|e| ProfessionalError::DatabaseError(e.to_string()))?;

        if service_ids.is_empty() {
            return Ok(());
        }

        let rows: Vec<Value> = service_ids.iter()
            .map(|service_id| json!({
                "professional_id": professional_id,
                "service_id": service_id
            }))
            .collect();

        self.supabase.execute(
            Method::POST,
            "/rest/v1/professional_services",
            Some(Value::Array(rows)),
        ).await.map_err(|e| ProfessionalError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
