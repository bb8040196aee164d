use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use chat_cell::router::chat_routes;
use doctor_cell::router::practitioner_routes;

use crate::state::AppState;

pub fn create_router(state: &AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .nest("/chat", chat_routes(Arc::clone(&state.chat)))
        .nest("/appointments", appointment_routes(Arc::clone(&state.appointments)))
        .nest("/practitioners", practitioner_routes(Arc::clone(&state.practitioners)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use shared_utils::test_utils::TestClinic;
    use tower::ServiceExt;

    fn app() -> Router {
        let clinic = TestClinic::new();
        let state = AppState::build(&clinic.config, clinic.db.clone(), clinic.clock.clone()).unwrap();
        create_router(&state)
    }

    #[tokio::test]
    async fn test_liveness() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Clinic scheduling API is running!");
    }

    #[tokio::test]
    async fn test_cells_are_nested() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/practitioners/search?term=cardio")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["total"], 2);
    }

    #[tokio::test]
    async fn test_appointments_are_nested() {
        let response = app()
            .oneshot(Request::builder().uri("/appointments").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["total"], 0);
    }
}
