use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: Uuid,
    pub practitioner_id: Uuid,
    pub patient_id: Uuid,
    pub start_time: DateTime<Utc>,
    /// Always `start_time + duration`; never supplied independently.
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// Half-open overlap: an appointment ending exactly when another starts
    /// does not overlap it.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }

    pub fn is_active(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

/// Insert payload for the booking path. The end is derived by the caller
/// from the requested duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub practitioner_id: Uuid,
    pub patient_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Inclusive bounds of one local calendar day, expressed as instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Storage for appointment records.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Number of non-cancelled appointments of the practitioner starting inside `day`.
    async fn count_same_day(&self, practitioner_id: Uuid, day: DayWindow) -> Result<usize>;

    /// First appointment of the practitioner overlapping `[start, end)` whose
    /// status differs from `exclude_status`.
    async fn find_overlapping(
        &self,
        practitioner_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_status: AppointmentStatus,
    ) -> Result<Option<Appointment>>;

    async fn create(&self, appointment: NewAppointment) -> Result<Appointment>;

    async fn list_by_practitioner(&self, practitioner_id: Uuid) -> Result<Vec<Appointment>>;

    async fn list_all(&self) -> Result<Vec<Appointment>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>>;
}
