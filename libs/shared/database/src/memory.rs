use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use shared_models::{
    Appointment, AppointmentRepository, AppointmentStatus, Clock, DayWindow, NewAppointment,
    Patient, PatientDirectory, Practitioner, PractitionerDirectory,
};

/// Records used to pre-populate the store, usually read from `SEED_DATA_PATH`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub practitioners: Vec<Practitioner>,
    #[serde(default)]
    pub patients: Vec<Patient>,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
}

impl SeedData {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        let seed: SeedData = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse seed file {}", path.display()))?;
        Ok(seed)
    }
}

/// Process-local store backing every collaborator trait. Insertion order is
/// preserved, so directory searches return a stable ordering.
pub struct InMemoryDatabase {
    practitioners: RwLock<Vec<Practitioner>>,
    patients: RwLock<Vec<Patient>>,
    appointments: RwLock<Vec<Appointment>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryDatabase {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_seed(SeedData::default(), clock)
    }

    pub fn with_seed(seed: SeedData, clock: Arc<dyn Clock>) -> Self {
        info!(
            "Seeding in-memory store with {} practitioners, {} patients, {} appointments",
            seed.practitioners.len(),
            seed.patients.len(),
            seed.appointments.len()
        );

        Self {
            practitioners: RwLock::new(seed.practitioners),
            patients: RwLock::new(seed.patients),
            appointments: RwLock::new(seed.appointments),
            clock,
        }
    }

    pub async fn add_practitioner(&self, practitioner: Practitioner) {
        self.practitioners.write().await.push(practitioner);
    }

    pub async fn add_patient(&self, patient: Patient) {
        self.patients.write().await.push(patient);
    }

    /// Inserts a record as-is, bypassing the booking path. Meant for seeding.
    pub async fn insert_appointment(&self, appointment: Appointment) {
        self.appointments.write().await.push(appointment);
    }

    pub async fn appointments(&self) -> Vec<Appointment> {
        self.appointments.read().await.clone()
    }
}

#[async_trait]
impl PractitionerDirectory for InMemoryDatabase {
    async fn find_by_specialty_or_name(&self, term: &str) -> Result<Vec<Practitioner>> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(vec![]);
        }

        let practitioners = self.practitioners.read().await;
        let matches: Vec<Practitioner> = practitioners
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.specialty.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        debug!("Directory search '{}' matched {} practitioners", term, matches.len());
        Ok(matches)
    }

    async fn find_by_license_id(&self, license_id: &str) -> Result<Option<Practitioner>> {
        let practitioners = self.practitioners.read().await;
        Ok(practitioners
            .iter()
            .find(|p| p.license_id == license_id)
            .cloned())
    }
}

#[async_trait]
impl PatientDirectory for InMemoryDatabase {
    async fn find_by_national_id(&self, national_id: &str) -> Result<Option<Patient>> {
        let patients = self.patients.read().await;
        Ok(patients
            .iter()
            .find(|p| p.national_id == national_id)
            .cloned())
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryDatabase {
    async fn count_same_day(&self, practitioner_id: Uuid, day: DayWindow) -> Result<usize> {
        let appointments = self.appointments.read().await;
        Ok(appointments
            .iter()
            .filter(|a| a.practitioner_id == practitioner_id)
            .filter(|a| a.is_active())
            .filter(|a| day.contains(a.start_time))
            .count())
    }

    async fn find_overlapping(
        &self,
        practitioner_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_status: AppointmentStatus,
    ) -> Result<Option<Appointment>> {
        let appointments = self.appointments.read().await;
        Ok(appointments
            .iter()
            .filter(|a| a.practitioner_id == practitioner_id)
            .filter(|a| a.status != exclude_status)
            .find(|a| a.overlaps(start, end))
            .cloned())
    }

    async fn create(&self, appointment: NewAppointment) -> Result<Appointment> {
        let record = Appointment {
            id: Uuid::new_v4(),
            practitioner_id: appointment.practitioner_id,
            patient_id: appointment.patient_id,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
            status: AppointmentStatus::Pending,
            created_at: self.clock.now(),
        };

        self.appointments.write().await.push(record.clone());
        debug!("Stored appointment {}", record.id);
        Ok(record)
    }

    async fn list_by_practitioner(&self, practitioner_id: Uuid) -> Result<Vec<Appointment>> {
        let appointments = self.appointments.read().await;
        let mut list: Vec<Appointment> = appointments
            .iter()
            .filter(|a| a.practitioner_id == practitioner_id)
            .cloned()
            .collect();
        list.sort_by_key(|a| a.start_time);
        Ok(list)
    }

    async fn list_all(&self) -> Result<Vec<Appointment>> {
        let mut list = self.appointments.read().await.clone();
        list.sort_by_key(|a| a.start_time);
        Ok(list)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Appointment>> {
        let appointments = self.appointments.read().await;
        Ok(appointments.iter().find(|a| a.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use shared_models::SystemClock;
    use std::io::Write;

    fn practitioner(name: &str, specialty: &str, license: &str) -> Practitioner {
        Practitioner {
            id: Uuid::new_v4(),
            name: name.to_string(),
            specialty: specialty.to_string(),
            license_id: license.to_string(),
        }
    }

    fn appointment(practitioner_id: Uuid, start: DateTime<Utc>, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            practitioner_id,
            patient_id: Uuid::new_v4(),
            start_time: start,
            end_time: start + Duration::minutes(60),
            status,
            created_at: start,
        }
    }

    #[tokio::test]
    async fn test_search_matches_name_or_specialty_case_insensitively() {
        let db = InMemoryDatabase::new(Arc::new(SystemClock));
        db.add_practitioner(practitioner("Ana Souza", "Cardiology", "CRM-1")).await;
        db.add_practitioner(practitioner("Bruno Lima", "Dermatology", "CRM-2")).await;
        db.add_practitioner(practitioner("Carla Cardoso", "Pediatrics", "CRM-3")).await;

        let by_specialty = db.find_by_specialty_or_name("CARDIO").await.unwrap();
        let names: Vec<&str> = by_specialty.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ana Souza"]);

        let by_name = db.find_by_specialty_or_name("card").await.unwrap();
        assert_eq!(by_name.len(), 2);
        assert_eq!(by_name[0].name, "Ana Souza");
        assert_eq!(by_name[1].name, "Carla Cardoso");

        assert!(db.find_by_specialty_or_name("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_and_overlap_skip_cancelled() {
        let db = InMemoryDatabase::new(Arc::new(SystemClock));
        let doctor = Uuid::new_v4();
        let nine = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();

        db.insert_appointment(appointment(doctor, nine, AppointmentStatus::Cancelled)).await;
        db.insert_appointment(appointment(doctor, nine + Duration::hours(2), AppointmentStatus::Confirmed)).await;

        let day = DayWindow {
            start: Utc.with_ymd_and_hms(2026, 10, 19, 3, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 10, 20, 2, 59, 59).unwrap(),
        };
        assert_eq!(db.count_same_day(doctor, day).await.unwrap(), 1);

        let clash = db
            .find_overlapping(doctor, nine, nine + Duration::minutes(60), AppointmentStatus::Cancelled)
            .await
            .unwrap();
        assert!(clash.is_none());

        let clash = db
            .find_overlapping(
                doctor,
                nine + Duration::minutes(90),
                nine + Duration::minutes(150),
                AppointmentStatus::Cancelled,
            )
            .await
            .unwrap();
        assert!(clash.is_some());
    }

    #[tokio::test]
    async fn test_list_all_is_ordered_and_find_by_id() {
        let db = InMemoryDatabase::new(Arc::new(SystemClock));
        let nine = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let later = appointment(Uuid::new_v4(), nine + Duration::hours(3), AppointmentStatus::Pending);
        let earlier = appointment(Uuid::new_v4(), nine, AppointmentStatus::Confirmed);

        db.insert_appointment(later.clone()).await;
        db.insert_appointment(earlier.clone()).await;

        let all = db.list_all().await.unwrap();
        assert_eq!(all, vec![earlier, later.clone()]);
        assert_eq!(db.find_by_id(later.id).await.unwrap(), Some(later));
        assert!(db.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[test]
    fn test_seed_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let body = serde_json::json!({
            "practitioners": [{
                "id": Uuid::new_v4(),
                "name": "Ana Souza",
                "specialty": "Cardiology",
                "license_id": "CRM-1"
            }],
            "patients": [{
                "id": Uuid::new_v4(),
                "account_id": Uuid::new_v4(),
                "name": "Maria",
                "national_id": "12345678900"
            }]
        });
        write!(file, "{}", body).unwrap();

        let seed = SeedData::from_file(file.path()).unwrap();
        assert_eq!(seed.practitioners.len(), 1);
        assert_eq!(seed.patients[0].national_id, "12345678900");
        assert!(seed.appointments.is_empty());
    }

    #[test]
    fn test_missing_seed_file_is_an_error() {
        let result = SeedData::from_file("/definitely/not/here.json");
        assert!(result.is_err());
    }
}
