use std::collections::BTreeSet;
use std::env;
use std::str::FromStr;

use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::warn;

/// Rules shared by slot generation, availability and the booking guard.
#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    /// Zone used for canonical slot keys, the capacity window and presentation.
    pub timezone: Tz,
    pub availability_horizon_days: u32,
    pub booking_horizon_business_days: u32,
    pub slots_per_day: u32,
    pub first_slot_hour: u32,
    pub max_daily_appointments: usize,
    pub default_duration_minutes: i64,
    pub min_duration_minutes: i64,
    pub holidays: BTreeSet<NaiveDate>,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::Sao_Paulo,
            availability_horizon_days: 7,
            booking_horizon_business_days: 30,
            slots_per_day: 6,
            first_slot_hour: 8,
            max_daily_appointments: 6,
            default_duration_minutes: 60,
            min_duration_minutes: 15,
            holidays: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub idle_ttl_seconds: i64,
    pub sweep_interval_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_ttl_seconds: 1800,
            sweep_interval_seconds: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversationConfig {
    pub confirmation_token: String,
    pub cancel_token: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            confirmation_token: "yes".to_string(),
            cancel_token: "cancel".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub seed_data_path: Option<String>,
    pub scheduling: SchedulingConfig,
    pub session: SessionConfig,
    pub conversation: ConversationConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 3000,
            seed_data_path: None,
            scheduling: SchedulingConfig::default(),
            session: SessionConfig::default(),
            conversation: ConversationConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Unset keys keep
    /// their defaults; unparsable ones are reported and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let mut scheduling = defaults.scheduling.clone();

        scheduling.timezone = parse_or(&lookup, "SCHEDULING_TIMEZONE", scheduling.timezone);
        scheduling.availability_horizon_days = parse_or(
            &lookup,
            "AVAILABILITY_HORIZON_DAYS",
            scheduling.availability_horizon_days,
        );
        scheduling.booking_horizon_business_days = parse_or(
            &lookup,
            "BOOKING_HORIZON_BUSINESS_DAYS",
            scheduling.booking_horizon_business_days,
        );
        scheduling.max_daily_appointments =
            parse_or(&lookup, "MAX_DAILY_APPOINTMENTS", scheduling.max_daily_appointments);
        let default_duration = parse_or(
            &lookup,
            "DEFAULT_APPOINTMENT_MINUTES",
            scheduling.default_duration_minutes,
        );
        let min_duration =
            parse_or(&lookup, "MIN_APPOINTMENT_MINUTES", scheduling.min_duration_minutes);
        if min_duration < 1 || default_duration < min_duration {
            warn!(
                "DEFAULT_APPOINTMENT_MINUTES={} with MIN_APPOINTMENT_MINUTES={} is not a valid pair, using defaults",
                default_duration, min_duration
            );
        } else {
            scheduling.default_duration_minutes = default_duration;
            scheduling.min_duration_minutes = min_duration;
        }

        let slots_per_day = parse_or(&lookup, "SLOTS_PER_DAY", scheduling.slots_per_day);
        let first_slot_hour = parse_or(&lookup, "FIRST_SLOT_HOUR", scheduling.first_slot_hour);
        if slots_per_day == 0 || first_slot_hour.saturating_add(slots_per_day) > 24 {
            warn!(
                "SLOTS_PER_DAY={} with FIRST_SLOT_HOUR={} does not fit in a day, using defaults",
                slots_per_day, first_slot_hour
            );
        } else {
            scheduling.slots_per_day = slots_per_day;
            scheduling.first_slot_hour = first_slot_hour;
        }

        if let Some(raw) = lookup("CLINIC_HOLIDAYS") {
            scheduling.holidays = parse_holidays(&raw);
        }

        let session = SessionConfig {
            idle_ttl_seconds: parse_or(
                &lookup,
                "SESSION_IDLE_TTL_SECONDS",
                defaults.session.idle_ttl_seconds,
            ),
            sweep_interval_seconds: parse_or(
                &lookup,
                "SESSION_SWEEP_INTERVAL_SECONDS",
                defaults.session.sweep_interval_seconds,
            ),
        };

        let conversation = ConversationConfig {
            confirmation_token: lookup("CONFIRMATION_TOKEN")
                .filter(|token| !token.trim().is_empty())
                .unwrap_or(defaults.conversation.confirmation_token),
            cancel_token: lookup("CANCEL_TOKEN")
                .filter(|token| !token.trim().is_empty())
                .unwrap_or(defaults.conversation.cancel_token),
        };

        let seed_data_path = lookup("SEED_DATA_PATH").filter(|path| !path.is_empty());
        if seed_data_path.is_none() {
            warn!("SEED_DATA_PATH not set, starting with an empty directory");
        }

        Self {
            server_port: parse_or(&lookup, "SERVER_PORT", defaults.server_port),
            seed_data_path,
            scheduling,
            session,
            conversation,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!("{} has an invalid value '{}', using default", key, raw);
                default
            }
        },
        None => default,
    }
}

fn parse_holidays(raw: &str) -> BTreeSet<NaiveDate> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .filter_map(|item| match NaiveDate::parse_from_str(item, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                warn!("Ignoring invalid holiday date '{}'", item);
                None
            }
        })
        .collect()
}
