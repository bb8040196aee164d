use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::{AppError, Appointment};

use crate::models::{BookAppointmentRequest, BookingError};
use crate::services::booking::AppointmentBookingService;

pub struct AppointmentCellState {
    pub booking: Arc<AppointmentBookingService>,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentQueryParams {
    pub practitioner_id: Option<Uuid>,
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::CapacityExceeded { .. } | BookingError::OverlappingBooking { .. } => {
                AppError::Conflict(err.to_string())
            }
            BookingError::InvalidDuration { .. } | BookingError::InvalidStartTime(_) => {
                AppError::BadRequest(err.to_string())
            }
            BookingError::Upstream(_) => AppError::Internal(err.to_string()),
        }
    }
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let appointment = state.booking.book(request).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppointmentCellState>>,
    Query(params): Query<AppointmentQueryParams>,
) -> Result<Json<Value>, AppError> {
    let appointments = state.booking.list_appointments(params.practitioner_id).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    state
        .booking
        .get_appointment(appointment_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Appointment {} not found", appointment_id)))
}
