use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use std::collections::HashMap;
use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use client_cell::models::Client;
use professional_cell::models::Professional;
use service_cell::models::Service;

use crate::models::{Appointment, AppointmentError, CalendarEvent, CalendarQuery};

const EVENT_TEXT_COLOR: &str = "#ffffff";

/// Builds the calendar feed. Related clients, professionals and services are
/// fetched in one batched `id=in.(...)` query per table, never per event.
pub struct CalendarService {
    supabase: Arc<SupabaseClient>,
}

impl CalendarService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub async fn calendar_events(
        &self,
        query: CalendarQuery,
    ) -> Result<Vec<CalendarEvent>, AppointmentError> {
        debug!(
            "Building calendar feed from {} to {}",
            query.start_date, query.end_date
        );

        let appointments = self.appointments_in_range(&query).await?;
        if appointments.is_empty() {
            return Ok(Vec::new());
        }

        let client_names = self
            .lookup::<Client>("clients", appointments.iter().map(|a| a.client_id))
            .await?
            .into_iter()
            .map(|(id, c)| (id, c.name))
            .collect::<HashMap<_, _>>();

        let service_names = self
            .lookup::<Service>("services", appointments.iter().map(|a| a.service_id))
            .await?
            .into_iter()
            .map(|(id, s)| (id, s.name))
            .collect::<HashMap<_, _>>();

        let professional_colors = self
            .lookup::<Professional>("professionals", appointments.iter().map(|a| a.professional_id))
            .await?
            .into_iter()
            .map(|(id, p)| (id, p.color))
            .collect::<HashMap<_, _>>();

        let events = appointments
            .into_iter()
            .map(|apt| {
                let client = client_names
                    .get(&apt.client_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown client".to_string());
                let service = service_names
                    .get(&apt.service_id)
                    .cloned()
                    .unwrap_or_else(|| "Unknown service".to_string());
                let color = professional_colors
                    .get(&apt.professional_id)
                    .cloned()
                    .unwrap_or_else(|| professional_cell::models::DEFAULT_CALENDAR_COLOR.to_string());

                CalendarEvent {
                    id: apt.id,
                    title: format!("{} - {}", client, service),
                    start: format!("{}T{}", apt.appointment_date, apt.start_time.format("%H:%M:%S")),
                    end: format!("{}T{}", apt.appointment_date, apt.end_time.format("%H:%M:%S")),
                    background_color: color.clone(),
                    border_color: color,
                    text_color: EVENT_TEXT_COLOR.to_string(),
                    appointment: apt,
                }
            })
            .collect();

        Ok(events)
    }

    async fn appointments_in_range(
        &self,
        query: &CalendarQuery,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let mut query_parts = vec![
            format!("appointment_date=gte.{}", query.start_date),
            format!("appointment_date=lte.{}", query.end_date),
        ];
        if let Some(professional_id) = query.professional_id {
            query_parts.push(format!("professional_id=eq.{}", professional_id));
        }

        let path = format!(
            "/rest/v1/appointments?{}&order=appointment_date.asc,start_time.asc",
            query_parts.join("&")
        );

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

    async fn lookup<T>(
        &self,
        table: &str,
        ids: impl Iterator<Item = Uuid>,
    ) -> Result<Vec<(Uuid, T)>, AppointmentError>
    where
        T: serde::de::DeserializeOwned + HasId,
    {
        let mut unique: Vec<Uuid> = ids.collect();
        unique.sort();
        unique.dedup();

        let id_list = unique
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let path = format!("/rest/v1/{}?id=in.({})", table, id_list);

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AppointmentError::DatabaseError(e.to_string()))?;

        result
            .into_iter()
            .map(|row| {
                serde_json::from_value::<T>(row)
                    .map(|entity| (entity.id(), entity))
                    .map_err(|e| {
                        AppointmentError::DatabaseError(format!("Failed to parse {} row: {}", table, e))
                    })
            })
            .collect()
    }
}

trait HasId {
    fn id(&self) -> Uuid;
}

impl HasId for Client {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl HasId for Professional {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl HasId for Service {
    fn id(&self) -> Uuid {
        self.id
    }
}
