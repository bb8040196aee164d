use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, DurationRound, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::debug;
use uuid::Uuid;

use shared_config::SchedulingConfig;
use shared_models::{Appointment, AppointmentRepository, Clock};

use crate::models::{AvailabilityMap, SlotWindow};
use crate::services::slots::SlotGenerator;

/// `"YYYY-MM-DD HH"` of an instant seen from `timezone`. Slots and bookings
/// are only ever compared through this key.
pub fn canonical_key(instant: DateTime<Utc>, timezone: Tz) -> String {
    instant.with_timezone(&timezone).format("%Y-%m-%d %H").to_string()
}

/// Subtracts booked hours from the slot universe.
#[derive(Clone)]
pub struct AvailabilityCalculator {
    generator: SlotGenerator,
}

impl AvailabilityCalculator {
    pub fn new(generator: SlotGenerator) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &SlotGenerator {
        &self.generator
    }

    /// Free hours per day over the window, days without a free hour omitted.
    pub fn calculate(
        &self,
        booked: &[DateTime<Utc>],
        today: NaiveDate,
        window: &SlotWindow,
    ) -> AvailabilityMap {
        let timezone = self.generator.timezone();
        let booked_keys = booked_keys(booked, timezone);

        let mut free: BTreeMap<NaiveDate, BTreeSet<String>> = BTreeMap::new();
        for slot in self.generator.generate(today, window) {
            if booked_keys.contains(&canonical_key(slot.starts_at, timezone)) {
                continue;
            }
            free.entry(slot.date).or_default().insert(slot.label());
        }

        free.into_iter()
            .filter(|(_, times)| !times.is_empty())
            .map(|(date, times)| (date, times.into_iter().collect()))
            .collect()
    }

    /// Free hours of a single date, ascending.
    pub fn free_times_on(
        &self,
        date: NaiveDate,
        booked: &[DateTime<Utc>],
        window: &SlotWindow,
    ) -> Vec<String> {
        let timezone = self.generator.timezone();
        let booked_keys = booked_keys(booked, timezone);

        let times: BTreeSet<String> = self
            .generator
            .slots_for_day(date, window)
            .into_iter()
            .filter(|slot| !booked_keys.contains(&canonical_key(slot.starts_at, timezone)))
            .map(|slot| slot.label())
            .collect();

        times.into_iter().collect()
    }
}

fn booked_keys(booked: &[DateTime<Utc>], timezone: Tz) -> BTreeSet<String> {
    booked
        .iter()
        .map(|instant| canonical_key(*instant, timezone))
        .collect()
}

/// Every hour an appointment touches: its start, then each hour boundary
/// strictly before its end.
fn occupied_instants(appointment: &Appointment) -> Vec<DateTime<Utc>> {
    let mut instants = vec![appointment.start_time];
    let Ok(mut boundary) = appointment.start_time.duration_trunc(Duration::hours(1)) else {
        return instants;
    };
    boundary += Duration::hours(1);
    while boundary < appointment.end_time {
        instants.push(boundary);
        boundary += Duration::hours(1);
    }
    instants
}

/// Availability for a concrete practitioner, reading bookings from the
/// repository and "today" from the clock.
pub struct AvailabilityService {
    calculator: AvailabilityCalculator,
    repository: Arc<dyn AppointmentRepository>,
    clock: Arc<dyn Clock>,
    window: SlotWindow,
    booking_horizon_business_days: usize,
}

impl AvailabilityService {
    pub fn new(
        config: &SchedulingConfig,
        generator: SlotGenerator,
        repository: Arc<dyn AppointmentRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            calculator: AvailabilityCalculator::new(generator),
            repository,
            clock,
            window: SlotWindow::from_config(config),
            booking_horizon_business_days: config.booking_horizon_business_days as usize,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.calculator.generator().timezone()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.timezone()).date_naive()
    }

    /// Start instants of the practitioner's hours that are taken by a
    /// non-cancelled appointment.
    pub async fn booked_starts(&self, practitioner_id: Uuid) -> Result<Vec<DateTime<Utc>>> {
        let appointments = self.repository.list_by_practitioner(practitioner_id).await?;
        Ok(appointments
            .iter()
            .filter(|appointment| appointment.is_active())
            .flat_map(occupied_instants)
            .collect())
    }

    /// Free hours per day over the configured horizon.
    pub async fn practitioner_calendar(&self, practitioner_id: Uuid) -> Result<AvailabilityMap> {
        let booked = self.booked_starts(practitioner_id).await?;
        let calendar = self.calculator.calculate(&booked, self.today(), &self.window);

        debug!(
            "Practitioner {} has free hours on {} days",
            practitioner_id,
            calendar.len()
        );
        Ok(calendar)
    }

    pub async fn free_times_on(&self, practitioner_id: Uuid, date: NaiveDate) -> Result<Vec<String>> {
        let booked = self.booked_starts(practitioner_id).await?;
        Ok(self.calculator.free_times_on(date, &booked, &self.window))
    }

    /// Business days offered for booking, starting today.
    pub fn eligible_days(&self) -> Vec<NaiveDate> {
        self.calculator
            .generator()
            .business_days(self.today(), self.booking_horizon_business_days)
    }
}
