use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use std::sync::Arc;

use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentError};

/// Two half-open windows [start, end) overlap exactly when each starts before
/// the other ends. Back-to-back bookings (end1 == start2) do not overlap.
pub fn windows_overlap(
    start1: NaiveTime,
    end1: NaiveTime,
    start2: NaiveTime,
    end2: NaiveTime,
) -> bool {
    start1 < end2 && start2 < end1
}

/// Find the first appointment whose window blocks [start, end).
///
/// Cancelled and no-show appointments never block; `exclude_id` skips the
/// appointment being rescheduled so it cannot conflict with itself.
pub fn find_conflict<'a>(
    appointments: &'a [Appointment],
    start: NaiveTime,
    end: NaiveTime,
    exclude_id: Option<Uuid>,
) -> Option<&'a Appointment> {
    appointments.iter().find(|apt| {
        if Some(apt.id) == exclude_id {
            return false;
        }
        if !apt.status.is_protected() {
            return false;
        }
        windows_overlap(start, end, apt.start_time, apt.end_time)
    })
}

pub struct ConflictDetectionService {
    supabase: Arc<SupabaseClient>,
}

impl ConflictDetectionService {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Check whether [start, end) collides with any existing appointment of
    /// the professional on that date.
    pub async fn has_conflict(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, AppointmentError> {
        debug!(
            "Checking conflicts for professional {} on {} from {} to {}",
            professional_id, date, start, end
        );

        let existing = self
            .appointments_for_professional_on(professional_id, date)
            .await?;

        let conflict = find_conflict(&existing, start, end, exclude_id);

        if let Some(apt) = conflict {
            warn!(
                "Conflict for professional {} on {}: appointment {} occupies {} to {}",
                professional_id, date, apt.id, apt.start_time, apt.end_time
            );
        }

        Ok(conflict.is_some())
    }

    async fn appointments_for_professional_on(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?professional_id=eq.{}&appointment_date=eq.{}&order=start_time.asc",
            professional_id, date
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
}
