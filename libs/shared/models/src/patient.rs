use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Patient {
    /// Patient profile id, distinct from the login account.
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub national_id: String,
}

#[async_trait]
pub trait PatientDirectory: Send + Sync {
    async fn find_by_national_id(&self, national_id: &str) -> Result<Option<Patient>>;
}
