use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Client, ClientError, CreateClientRequest, ClientSearchQuery, UpdateClientRequest};

pub struct ClientService {
    supabase: SupabaseClient,
}

impl ClientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn create_client(&self, request: CreateClientRequest) -> Result<Client, ClientError> {
        if request.name.trim().is_empty() {
            return Err(ClientError::ValidationError("name is required".to_string()));
        }

        debug!("Creating client: {}", request.name);

        let now = chrono::Utc::now();
        let client_data = json!({
            "name": request.name,
            "phone": request.phone,
            "email": request.email,
            "notes": request.notes,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/clients",
            Some(client_data),
            Some(headers),
        ).await.map_err(|e| ClientError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ClientError::DatabaseError("Failed to create client".to_string()));
        }

        let client: Client = serde_json::from_value(result[0].clone())
            .map_err(|e| ClientError::DatabaseError(format!("Failed to parse client: {}", e)))?;

        Ok(client)
    }

    pub async fn get_client(&self, client_id: Uuid) -> Result<Client, ClientError> {
        debug!("Fetching client: {}", client_id);

        let path = format!("/rest/v1/clients?id=eq.{}", client_id);
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
        ).await.map_err(|e| ClientError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ClientError::NotFound);
        }

        let client: Client = serde_json::from_value(result[0].clone())
            .map_err(|e| ClientError::DatabaseError(format!("Failed to parse client: {}", e)))?;

        Ok(client)
    }

    pub async fn update_client(
        &self,
        client_id: Uuid,
        request: UpdateClientRequest,
    ) -> Result<Client, ClientError> {
        debug!("Updating client: {}", client_id);

        let mut update_data = serde_json::Map::new();

        if let Some(name) = request.name {
            if name.trim().is_empty() {
                return Err(ClientError::ValidationError("name cannot be empty".to_string()));
            }
            update_data.insert("name".to_string(), json!(name));
        }
        if let Some(phone) = request.phone {
            update_data.insert("phone".to_string(), json!(phone));
        }
        if let Some(email) = request.email {
            update_data.insert("email".to_string(), json!(email));
        }
        if let Some(notes) = request.notes {
            update_data.insert("notes".to_string(), json!(notes));
        }
        update_data.insert("updated_at".to_string(), json!(chrono::Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/clients?id=eq.{}", client_id);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Prefer", reqwest::header::HeaderValue::from_static("return=representation"));

        let result: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(Value::Object(update_data)),
            Some(headers),
        ).await.map_err(|e| ClientError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(ClientError::NotFound);
        }

        let client: Client = serde_json::from_value(result[0].clone())
            .map_err(|e| ClientError::DatabaseError(format!("Failed to parse client: {}", e)))?;

        Ok(client)
    }

    pub async fn delete_client(&self, client_id: Uuid) -> Result<(), ClientError> {
        debug!("Deleting client: {}", client_id);

        // Presence check first so a missing id surfaces as 404, not a silent no-op
        self.get_client(client_id).await?;

        let path = format!("/rest/v1/clients?id=eq.{}", client_id);
        self.supabase.execute(Method::DELETE, &path, None)
            .await
            .map_err(|e| ClientError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// List clients ordered by name, optionally filtered by a substring
    /// matched against name, phone and email.
    pub async fn search_clients(&self, query: ClientSearchQuery) -> Result<Vec<Client>, ClientError> {
        let mut query_parts = Vec::new();

        if let Some(search) = query.search.filter(|s| !s.is_empty()) {
            let pattern = format!("(name.ilike.*{s}*,phone.ilike.*{s}*,email.ilike.*{s}*)", s = search);
            query_parts.push(format!("or={}", urlencoding::encode(&pattern)));
        }

        query_parts.push("order=name.asc".to_string());

        if let Some(limit) = query.limit {
            query_parts.push(format!("limit={}", limit));
        }
        if let Some(offset) = query.offset {
            query_parts.push(format!("offset={}", offset));
        }

        let path = format!("/rest/v1/clients?{}", query_parts.join("&"));

        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            &path,
            None,
        ).await.map_err(|e| ClientError::DatabaseError(e.to_string()))?;

        let clients: Vec<Client> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<Client>, _>>()
            .map_err(|e| ClientError::DatabaseError(format!("Failed to parse clients: {}", e)))?;

        Ok(clients)
    }
}
