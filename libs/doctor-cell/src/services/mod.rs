pub mod availability;
pub mod calendar;
pub mod matching;
pub mod slots;

pub use availability::{canonical_key, AvailabilityCalculator, AvailabilityService};
pub use calendar::{BusinessCalendar, WeekdayCalendar};
pub use matching::PractitionerChoice;
pub use slots::SlotGenerator;
