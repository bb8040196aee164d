use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};

/// Decides which calendar dates accept appointments.
pub trait BusinessCalendar: Send + Sync {
    fn is_business_day(&self, date: NaiveDate) -> bool;
}

/// Monday to Friday, minus an optional holiday list.
#[derive(Debug, Clone, Default)]
pub struct WeekdayCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl WeekdayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holidays(holidays: BTreeSet<NaiveDate>) -> Self {
        Self { holidays }
    }
}

impl BusinessCalendar for WeekdayCalendar {
    fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekends_are_closed() {
        let calendar = WeekdayCalendar::new();
        assert!(calendar.is_business_day(date(2026, 10, 23))); // Friday
        assert!(!calendar.is_business_day(date(2026, 10, 24))); // Saturday
        assert!(!calendar.is_business_day(date(2026, 10, 25))); // Sunday
        assert!(calendar.is_business_day(date(2026, 10, 26))); // Monday
    }

    #[test]
    fn test_holidays_are_closed() {
        let calendar = WeekdayCalendar::with_holidays(BTreeSet::from([date(2026, 11, 2)]));
        assert!(!calendar.is_business_day(date(2026, 11, 2)));
        assert!(calendar.is_business_day(date(2026, 11, 3)));
    }
}
