use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Practitioner {
    /// Practitioner profile id, the reference stored on appointments.
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    /// Professional license number (CRM).
    pub license_id: String,
}

#[async_trait]
pub trait PractitionerDirectory: Send + Sync {
    /// Case-insensitive substring match on name or specialty, in a stable order.
    async fn find_by_specialty_or_name(&self, term: &str) -> Result<Vec<Practitioner>>;

    async fn find_by_license_id(&self, license_id: &str) -> Result<Option<Practitioner>>;
}
