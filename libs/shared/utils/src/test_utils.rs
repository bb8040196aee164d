use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{InMemoryDatabase, SeedData};
use shared_models::{Appointment, AppointmentStatus, Clock, Patient, Practitioner};

pub const TEST_NATIONAL_ID: &str = "12345678900";

/// Clock pinned to a settable instant.
#[derive(Debug)]
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += by;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct TestConfig {
    pub timezone: Tz,
    pub now: DateTime<Utc>,
}

impl Default for TestConfig {
    fn default() -> Self {
        // Monday 2026-10-19, 08:00 in Sao Paulo.
        Self {
            timezone: chrono_tz::America::Sao_Paulo,
            now: Utc.with_ymd_and_hms(2026, 10, 19, 11, 0, 0).unwrap(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.scheduling.timezone = self.timezone;
        config
    }

    pub fn clock(&self) -> Arc<MockClock> {
        Arc::new(MockClock::at(self.now))
    }

    pub fn today(&self) -> NaiveDate {
        self.now.with_timezone(&self.timezone).date_naive()
    }
}

pub struct TestPractitioner;

impl TestPractitioner {
    pub fn new(name: &str, specialty: &str, license_id: &str) -> Practitioner {
        Practitioner {
            id: Uuid::new_v4(),
            name: name.to_string(),
            specialty: specialty.to_string(),
            license_id: license_id.to_string(),
        }
    }

    pub fn cardiologist(name: &str, license_id: &str) -> Practitioner {
        Self::new(name, "Cardiology", license_id)
    }
}

pub struct TestPatient;

impl TestPatient {
    pub fn new(name: &str, national_id: &str) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            name: name.to_string(),
            national_id: national_id.to_string(),
        }
    }
}

/// Wall-clock `hour:00` on `date` in `tz`, as an instant.
pub fn local_instant(tz: Tz, date: NaiveDate, hour: u32) -> DateTime<Utc> {
    let naive = date.and_hms_opt(hour, 0, 0).unwrap();
    tz.from_local_datetime(&naive).earliest().unwrap().with_timezone(&Utc)
}

pub fn booked_appointment(
    practitioner_id: Uuid,
    start: DateTime<Utc>,
    minutes: i64,
    status: AppointmentStatus,
) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        practitioner_id,
        patient_id: Uuid::new_v4(),
        start_time: start,
        end_time: start + Duration::minutes(minutes),
        status,
        created_at: start - Duration::days(1),
    }
}

/// A small clinic: two cardiologists, one dermatologist and one patient
/// registered under [`TEST_NATIONAL_ID`].
pub struct TestClinic {
    pub config: AppConfig,
    pub settings: TestConfig,
    pub clock: Arc<MockClock>,
    pub db: Arc<InMemoryDatabase>,
    pub cardiologists: Vec<Practitioner>,
    pub dermatologist: Practitioner,
    pub patient: Patient,
}

impl TestClinic {
    pub fn new() -> Self {
        let settings = TestConfig::default();
        let clock = settings.clock();

        let cardiologists = vec![
            TestPractitioner::cardiologist("Ana Souza", "CRM-1001"),
            TestPractitioner::cardiologist("Carlos Mendes", "CRM-1002"),
        ];
        let dermatologist = TestPractitioner::new("Beatriz Lima", "Dermatology", "CRM-2001");
        let patient = TestPatient::new("Maria Oliveira", TEST_NATIONAL_ID);

        let mut practitioners = cardiologists.clone();
        practitioners.push(dermatologist.clone());

        let seed = SeedData {
            practitioners,
            patients: vec![patient.clone()],
            appointments: vec![],
        };
        let db = Arc::new(InMemoryDatabase::with_seed(seed, clock.clone()));

        Self {
            config: settings.to_app_config(),
            settings,
            clock,
            db,
            cardiologists,
            dermatologist,
            patient,
        }
    }

    pub fn at(&self, date: NaiveDate, hour: u32) -> DateTime<Utc> {
        local_instant(self.settings.timezone, date, hour)
    }
}

impl Default for TestClinic {
    fn default() -> Self {
        Self::new()
    }
}
