use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers::{self, DoctorCellState};

pub fn practitioner_routes(state: Arc<DoctorCellState>) -> Router {
    Router::new()
        .route("/search", get(handlers::search_practitioners))
        .route("/{license_id}/availability", get(handlers::get_practitioner_availability))
        .with_state(state)
}
