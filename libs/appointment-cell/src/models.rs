use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_config::SchedulingConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub practitioner_id: Uuid,
    pub patient_id: Uuid,
    pub start_time: DateTime<Utc>,
    /// Falls back to the configured default when absent.
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct BookingRules {
    pub max_daily_appointments: usize,
    pub default_duration_minutes: i64,
    pub min_duration_minutes: i64,
}

impl BookingRules {
    pub fn from_config(config: &SchedulingConfig) -> Self {
        Self {
            max_daily_appointments: config.max_daily_appointments,
            default_duration_minutes: config.default_duration_minutes,
            min_duration_minutes: config.min_duration_minutes,
        }
    }
}

impl Default for BookingRules {
    fn default() -> Self {
        Self::from_config(&SchedulingConfig::default())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BookingError {
    #[error("Practitioner {practitioner_id} reached the daily appointment limit")]
    CapacityExceeded { practitioner_id: Uuid },

    #[error("Practitioner {practitioner_id} already has appointment {existing_id} at this time")]
    OverlappingBooking { practitioner_id: Uuid, existing_id: Uuid },

    #[error("Appointment duration of {minutes} minutes is invalid, the minimum is {minimum}")]
    InvalidDuration { minutes: i64, minimum: i64 },

    #[error("Start time {0} has no local calendar day")]
    InvalidStartTime(DateTime<Utc>),

    #[error("Appointment storage failed: {0}")]
    Upstream(String),
}

impl BookingError {
    /// Rejections decided by the scheduling rules rather than by a failing
    /// collaborator.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            BookingError::CapacityExceeded { .. } | BookingError::OverlappingBooking { .. }
        )
    }
}
