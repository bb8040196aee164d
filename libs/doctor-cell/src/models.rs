use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_config::SchedulingConfig;
use shared_models::Practitioner;

/// Free `HH:00` start times keyed by calendar date. Days without a free hour
/// are never present.
pub type AvailabilityMap = BTreeMap<NaiveDate, Vec<String>>;

/// One candidate start time. Slots are one hour long.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub date: NaiveDate,
    pub hour: u32,
    pub starts_at: DateTime<Utc>,
}

impl Slot {
    pub fn label(&self) -> String {
        format!("{:02}:00", self.hour)
    }
}

/// Shape of the slot universe: how many calendar days, how many hourly slots
/// per business day and the first hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotWindow {
    pub horizon_days: u32,
    pub slots_per_day: u32,
    pub first_hour: u32,
}

impl SlotWindow {
    pub fn from_config(config: &SchedulingConfig) -> Self {
        Self {
            horizon_days: config.availability_horizon_days,
            slots_per_day: config.slots_per_day,
            first_hour: config.first_slot_hour,
        }
    }

    pub fn hours(&self) -> impl Iterator<Item = u32> {
        let first = self.first_hour;
        (first..first + self.slots_per_day).filter(|hour| *hour < 24)
    }
}

impl Default for SlotWindow {
    fn default() -> Self {
        Self::from_config(&SchedulingConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub weekday: String,
    pub times: Vec<String>,
}

impl DayAvailability {
    pub fn from_map(map: &AvailabilityMap) -> Vec<DayAvailability> {
        map.iter()
            .map(|(date, times)| DayAvailability {
                date: *date,
                weekday: weekday_name(date.weekday()).to_string(),
                times: times.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PractitionerAvailabilityResponse {
    pub practitioner: Practitioner,
    pub timezone: String,
    pub calendar: Vec<DayAvailability>,
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Practitioner not found: {0}")]
    NotFound(String),

    #[error("Directory lookup failed: {0}")]
    Upstream(String),
}
