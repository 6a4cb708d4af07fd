use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    CreateServiceRequest, Service, ServiceError, ServiceSearchQuery, UpdateServiceRequest,
    DEFAULT_SERVICE_COLOR,
};

pub struct ServiceCatalog {
    supabase: SupabaseClient,
}

impl ServiceCatalog {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_service(&self, request: CreateServiceRequest) -> Result<Service, ServiceError> {
        if request.name.trim().is_empty() {
            return Err(ServiceError::ValidationError("name is required".to_string()));
        }
        if request.duration <= 0 {
            return Err(ServiceError::ValidationError(
                "duration must be a positive number of minutes".to_string(),
            ));
        }
        if request.price < 0.0 {
            return Err(ServiceError::ValidationError("price cannot be negative".to_string()));
        }

        debug!("Creating service: {}", request.name);

        let now = chrono::Utc::now();
        let service_data = json!({
            "name": request.name,
            "description": request.description,
            "price": request.price,
            "duration": request.duration,
            "color": request.color.unwrap_or_else(|| DEFAULT_SERVICE_COLOR.to_string()),
            "active": request.active.unwrap_or(true),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/services",
            Some(service_data),
            Some(headers),
        ).await.map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ServiceError::DatabaseError("Failed to create service".to_string()));
        }

        let service: Service = serde_json::from_value(result[0].clone())
            .map_err(|e| ServiceError::DatabaseError(format!("Failed to parse service: {}", e)))?;

        Ok(service)
    }

    pub async fn get_service(&self, service_id: Uuid) -> Result<Service, ServiceError> {
        debug!("Fetching service: {}", service_id);

        let path = format!("/rest/v1/services?id=eq.{}", service_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
        ).await.map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ServiceError::NotFound);
        }

        let service: Service = serde_json::from_value(result[0].clone())
            .map_err(|e| ServiceError::DatabaseError(format!("Failed to parse service: {}", e)))?;

        Ok(service)
    }

    pub async fn update_service(
        &self,
        service_id: Uuid,
        request: UpdateServiceRequest,
    ) -> Result<Service, ServiceError> {
        debug!("Updating service: {}", service_id);

        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError("name cannot be empty".to_string()));
            }
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(description) = request.description {
            update_data.insert("description".to_string(), json!(description));
        }
        if let Some(price) = request.price {
            if price < 0.0 {
                return Err(ServiceError::ValidationError("price cannot be negative".to_string()));
            }
            update_data.insert("price".to_string(), json!(price));
        }
        if let Some(duration) = request.duration {
            if duration <= 0 {
                return Err(ServiceError::ValidationError(
                    "duration must be a positive number of minutes".to_string(),
                ));
            }
            update_data.insert("duration".to_string(), json!(duration));
        }
        if let Some(color) = request.color {
            update_data.insert("color".to_string(), json!(color));
        }
        if let Some(active) = request.active {
            update_data.insert("active".to_string(), json!(active));
        }
        update_data.insert("updated_at".to_string(), json!(chrono::Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/services?id=eq.{}", service_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(Value::Object(update_data)),
            Some(headers),
        ).await.map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ServiceError::NotFound);
        }

        let service: Service = serde_json::from_value(result[0].clone())
            .map_err(|e| ServiceError::DatabaseError(format!("Failed to parse service: {}", e)))?;

        Ok(service)
    }

    pub async fn delete_service(&self, service_id: Uuid) -> Result<(), ServiceError> {
        debug!("Deleting service: {}", service_id);

        self.get_service(service_id).await?;

        let links_path = format!("/rest/v1/professional_services?service_id=eq.{}", service_id);
        self.supabase.execute(Method::DELETE, &links_path, None)
            .await
            .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

        let path = format!("/rest/v1/services?id=eq.{}", service_id);
        self.supabase.execute(Method::DELETE, &path, None)
            .await
            .map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// List services ordered by name. The professional filter goes through
    /// the join table explicitly instead of traversing a relationship.
    pub async fn search_services(&self, query: ServiceSearchQuery) -> Result<Vec<Service>, ServiceError> {
        let mut query_parts = Vec::new();

        if let Some(search) = query.search.filter(|s| !s.is_empty()) {
            let pattern = format!("*{}*", search);
            query_parts.push(format!("name=ilike.{}", urlencoding::encode(&pattern)));
        }
        if query.active_only.unwrap_or(false) {
            query_parts.push("active=eq.true".to_string());
        }
        if let Some(professional_id) = query.professional_id {
            let service_ids = self.service_ids_for_professional(professional_id).await?;
            if service_ids.is_empty() {
                return Ok(Vec::new());
            }
            let id_list = service_ids.iter()
                .map(Uuid::to_string)
                .collect::<Vec<_>>()
                .join(",");
            query_parts.push(format!("id=in.({})", id_list));
        }

        query_parts.push("order=name.asc".to_string());

        if let Some(limit) = query.limit {
            query_parts.push(format!("limit={}", limit));
        }
        if let Some(offset) = query.offset {
            query_parts.push(format!("offset={}", offset));
        }

        let path = format!("/rest/v1/services?{}", query_parts.join("&"));

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
        ).await.map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

        let services: Vec<Service> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Service>, _>>()
            .map_err(|e| ServiceError::DatabaseError(format!("Failed to parse services: {}", e)))?;

        Ok(services)
    }

    async fn service_ids_for_professional(&self, professional_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        let path = format!(
            "/rest/v1/professional_services?professional_id=eq.{}&select=service_id",
            professional_id
        );
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
        ).await.map_err(|e| ServiceError::DatabaseError(e.to_string()))?;

        result.into_iter()
            .map(|row| {
                serde_json::from_value::<Uuid>(row["service_id"].clone())
                    .map_err(|e| ServiceError::DatabaseError(format!("Failed to parse service link: {}", e)))
            })
            .collect()
    }
}
