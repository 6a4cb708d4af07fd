use chrono::{Duration, NaiveDate, NaiveTime};

use crate::models::AppointmentError;

/// Derive an appointment's end time from the service duration.
///
/// The date and start time are combined, the duration added, and the time
/// component read back. A duration that crosses midnight therefore yields an
/// end time smaller than the start time; callers compare windows within a
/// single date and inherit that quirk.
pub fn resolve_end_time(
    duration_minutes: i32,
    date: NaiveDate,
    start: NaiveTime,
) -> Result<NaiveTime, AppointmentError> {
    if duration_minutes <= 0 {
        return Err(AppointmentError::InvalidDuration(duration_minutes));
    }

    let start_at = date.and_time(start);
    let end_at = start_at + Duration::minutes(duration_minutes as i64);

    Ok(end_at.time())
}

pub fn parse_date(s: &str) -> Result<NaiveDate, AppointmentError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppointmentError::ValidationError(format!("Invalid date: {}", s)))
}

/// Accepts "HH:MM" and "HH:MM:SS".
pub fn parse_time(s: &str) -> Result<NaiveTime, AppointmentError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| AppointmentError::InvalidTimeFormat(s.to_string()))
}
