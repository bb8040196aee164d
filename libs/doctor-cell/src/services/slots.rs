use std::sync::Arc;

use chrono::{Days, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::models::{Slot, SlotWindow};
use crate::services::calendar::BusinessCalendar;

/// Produces the universe of candidate hourly slots. Dates come from the
/// business calendar and wall-clock hours are resolved in the clinic zone.
#[derive(Clone)]
pub struct SlotGenerator {
    timezone: Tz,
    calendar: Arc<dyn BusinessCalendar>,
}

impl SlotGenerator {
    pub fn new(timezone: Tz, calendar: Arc<dyn BusinessCalendar>) -> Self {
        Self { timezone, calendar }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Slots for `window.horizon_days` calendar days starting at `today`
    /// (inclusive), skipping closed days entirely.
    pub fn generate(&self, today: NaiveDate, window: &SlotWindow) -> Vec<Slot> {
        let slots: Vec<Slot> = (0..window.horizon_days)
            .filter_map(|offset| today.checked_add_days(Days::new(u64::from(offset))))
            .flat_map(|date| self.slots_for_day(date, window))
            .collect();

        debug!(
            "Generated {} slots over {} days from {}",
            slots.len(),
            window.horizon_days,
            today
        );
        slots
    }

    /// Contiguous hourly slots of one date, or nothing on a closed day.
    pub fn slots_for_day(&self, date: NaiveDate, window: &SlotWindow) -> Vec<Slot> {
        if !self.calendar.is_business_day(date) {
            return vec![];
        }

        window
            .hours()
            .filter_map(|hour| {
                let naive = date.and_hms_opt(hour, 0, 0)?;
                match self.timezone.from_local_datetime(&naive).earliest() {
                    Some(local) => Some(Slot {
                        date,
                        hour,
                        starts_at: local.with_timezone(&Utc),
                    }),
                    None => {
                        warn!("{} {:02}:00 does not exist in {}", date, hour, self.timezone);
                        None
                    }
                }
            })
            .collect()
    }

    /// The next `count` business days starting at `from` (inclusive).
    pub fn business_days(&self, from: NaiveDate, count: usize) -> Vec<NaiveDate> {
        from.iter_days()
            .filter(|date| self.calendar.is_business_day(*date))
            .take(count)
            .collect()
    }
}
