use chrono::{DateTime, Utc};

/// Source of the current instant. Everything time-relative reads it through
/// this trait so tests can pin the date.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
