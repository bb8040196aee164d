use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use shared_models::{AppError, PractitionerDirectory};

use crate::models::{DayAvailability, DoctorError, PractitionerAvailabilityResponse};
use crate::services::AvailabilityService;

pub struct DoctorCellState {
    pub directory: Arc<dyn PractitionerDirectory>,
    pub availability: Arc<AvailabilityService>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub term: String,
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound(_) => AppError::NotFound(err.to_string()),
            DoctorError::Upstream(_) => AppError::Internal(err.to_string()),
        }
    }
}

#[axum::debug_handler]
pub async fn search_practitioners(
    State(state): State<Arc<DoctorCellState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, AppError> {
    if query.term.trim().is_empty() {
        return Err(AppError::BadRequest("term must not be empty".to_string()));
    }

    let practitioners = state
        .directory
        .find_by_specialty_or_name(&query.term)
        .await
        .map_err(|e| DoctorError::Upstream(e.to_string()))?;

    Ok(Json(json!({
        "practitioners": practitioners,
        "total": practitioners.len()
    })))
}

#[axum::debug_handler]
pub async fn get_practitioner_availability(
    State(state): State<Arc<DoctorCellState>>,
    Path(license_id): Path<String>,
) -> Result<Json<PractitionerAvailabilityResponse>, AppError> {
    let practitioner = state
        .directory
        .find_by_license_id(&license_id)
        .await
        .map_err(|e| DoctorError::Upstream(e.to_string()))?
        .ok_or_else(|| DoctorError::NotFound(license_id.clone()))?;

    let calendar = state
        .availability
        .practitioner_calendar(practitioner.id)
        .await
        .map_err(|e| {
            error!("Availability lookup failed for {}: {}", license_id, e);
            DoctorError::Upstream(e.to_string())
        })?;

    Ok(Json(PractitionerAvailabilityResponse {
        timezone: state.availability.timezone().name().to_string(),
        calendar: DayAvailability::from_map(&calendar),
        practitioner,
    }))
}
