use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{self, AppointmentCellState};

pub fn appointment_routes(state: Arc<AppointmentCellState>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment).get(handlers::list_appointments))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .with_state(state)
}
