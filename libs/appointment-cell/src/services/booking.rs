// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::SchedulingConfig;
use shared_models::{Appointment, AppointmentRepository, NewAppointment};

use crate::models::{BookAppointmentRequest, BookingError, BookingRules};
use crate::services::conflict::BookingConflictGuard;

pub struct AppointmentBookingService {
    repository: Arc<dyn AppointmentRepository>,
    guard: BookingConflictGuard,
    rules: BookingRules,
    practitioner_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl AppointmentBookingService {
    pub fn new(config: &SchedulingConfig, repository: Arc<dyn AppointmentRepository>) -> Self {
        Self::with_rules(BookingRules::from_config(config), config.timezone, repository)
    }

    pub fn with_rules(
        rules: BookingRules,
        timezone: Tz,
        repository: Arc<dyn AppointmentRepository>,
    ) -> Self {
        let guard = BookingConflictGuard::new(
            Arc::clone(&repository),
            timezone,
            rules.max_daily_appointments,
        );

        Self {
            repository,
            guard,
            rules,
            practitioner_locks: DashMap::new(),
        }
    }

    /// End of the booking. Durations under the minimum, or too long for the
    /// end to be representable, are rejected.
    fn resolve_end(
        &self,
        start: DateTime<Utc>,
        requested: Option<i64>,
    ) -> Result<DateTime<Utc>, BookingError> {
        let minutes = requested.unwrap_or(self.rules.default_duration_minutes);
        let invalid = || BookingError::InvalidDuration {
            minutes,
            minimum: self.rules.min_duration_minutes,
        };

        if minutes < self.rules.min_duration_minutes {
            return Err(invalid());
        }
        Duration::try_minutes(minutes)
            .and_then(|duration| start.checked_add_signed(duration))
            .ok_or_else(invalid)
    }

    fn lock_for(&self, practitioner_id: Uuid) -> Arc<Mutex<()>> {
        self.practitioner_locks
            .entry(practitioner_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Admits and stores a booking. The practitioner's lock is held from the
    /// capacity count until the record is created, so two requests for the
    /// same practitioner are never admitted against the same snapshot.
    pub async fn book(&self, request: BookAppointmentRequest) -> Result<Appointment, BookingError> {
        let start = request.start_time;
        let end = self.resolve_end(start, request.duration_minutes)?;

        let lock = self.lock_for(request.practitioner_id);
        let _held = lock.lock().await;
        debug!("Holding booking lock for practitioner {}", request.practitioner_id);

        self.guard.admit(request.practitioner_id, start, end).await?;

        let appointment = self
            .repository
            .create(NewAppointment {
                practitioner_id: request.practitioner_id,
                patient_id: request.patient_id,
                start_time: start,
                end_time: end,
            })
            .await
            .map_err(|e| BookingError::Upstream(e.to_string()))?;

        info!(
            "Booked appointment {} for patient {} with practitioner {} at {}",
            appointment.id, appointment.patient_id, appointment.practitioner_id, appointment.start_time
        );
        Ok(appointment)
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>, BookingError> {
        self.repository
            .find_by_id(appointment_id)
            .await
            .map_err(|e| BookingError::Upstream(e.to_string()))
    }

    /// All appointments ordered by start, optionally for one practitioner.
    pub async fn list_appointments(
        &self,
        practitioner_id: Option<Uuid>,
    ) -> Result<Vec<Appointment>, BookingError> {
        let listed = match practitioner_id {
            Some(id) => self.repository.list_by_practitioner(id).await,
            None => self.repository.list_all().await,
        };
        listed.map_err(|e| BookingError::Upstream(e.to_string()))
    }
}
