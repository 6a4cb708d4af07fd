use tracing::debug;

use crate::models::{Appointment, AppointmentStatus};

/// Status lifecycle: scheduled, completed, cancelled, no_show.
///
/// Any status may move to any other, including back to scheduled; setting the
/// current status again is a no-op that still succeeds. Changing status never
/// re-validates the time window, so reviving a cancelled appointment can
/// produce an overlap with a booking made while the slot was free.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn apply_status_transition(
        &self,
        appointment: &mut Appointment,
        new_status: AppointmentStatus,
        notes: Option<String>,
    ) {
        debug!(
            "Appointment {} status {} -> {}",
            appointment.id, appointment.status, new_status
        );

        appointment.status = new_status;
        if let Some(notes) = notes {
            appointment.notes = Some(notes);
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
