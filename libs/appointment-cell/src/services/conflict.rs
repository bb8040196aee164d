use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::{AppointmentRepository, AppointmentStatus, DayWindow};

use crate::models::BookingError;

/// Admission rules for a requested booking: a per-day cap and no overlap
/// with another non-cancelled appointment of the same practitioner.
///
/// The guard only reads. Callers must hold the practitioner's booking lock
/// from the check until the insert (see `AppointmentBookingService`).
pub struct BookingConflictGuard {
    repository: Arc<dyn AppointmentRepository>,
    timezone: Tz,
    max_daily_appointments: usize,
}

impl BookingConflictGuard {
    pub fn new(
        repository: Arc<dyn AppointmentRepository>,
        timezone: Tz,
        max_daily_appointments: usize,
    ) -> Self {
        Self {
            repository,
            timezone,
            max_daily_appointments,
        }
    }

    /// Local midnight to 23:59:59.999 of the day `instant` falls on.
    pub fn day_window(&self, instant: DateTime<Utc>) -> Result<DayWindow, BookingError> {
        let date = instant.with_timezone(&self.timezone).date_naive();
        let start = self
            .start_of_day(date)
            .ok_or(BookingError::InvalidStartTime(instant))?;
        let next = date
            .succ_opt()
            .and_then(|next| self.start_of_day(next))
            .ok_or(BookingError::InvalidStartTime(instant))?;

        Ok(DayWindow {
            start,
            end: next - Duration::milliseconds(1),
        })
    }

    // Midnight may not exist on a DST change; the day then starts at the
    // first valid hour.
    fn start_of_day(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        (0..3).find_map(|hour| {
            let naive = date.and_hms_opt(hour, 0, 0)?;
            self.timezone
                .from_local_datetime(&naive)
                .earliest()
                .map(|local| local.with_timezone(&Utc))
        })
    }

    /// Capacity first since it is a single count, then overlap.
    pub async fn admit(
        &self,
        practitioner_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        let day = self.day_window(start)?;

        let booked_that_day = self
            .repository
            .count_same_day(practitioner_id, day)
            .await
            .map_err(|e| BookingError::Upstream(e.to_string()))?;

        if booked_that_day >= self.max_daily_appointments {
            warn!(
                "Practitioner {} already has {} appointments on {}",
                practitioner_id,
                booked_that_day,
                day.start.with_timezone(&self.timezone).date_naive()
            );
            return Err(BookingError::CapacityExceeded { practitioner_id });
        }

        let overlapping = self
            .repository
            .find_overlapping(practitioner_id, start, end, AppointmentStatus::Cancelled)
            .await
            .map_err(|e| BookingError::Upstream(e.to_string()))?;

        if let Some(existing) = overlapping {
            warn!(
                "Requested {} - {} overlaps appointment {} of practitioner {}",
                start, end, existing.id, practitioner_id
            );
            return Err(BookingError::OverlappingBooking {
                practitioner_id,
                existing_id: existing.id,
            });
        }

        debug!("Booking admitted for practitioner {} at {}", practitioner_id, start);
        Ok(())
    }
}
