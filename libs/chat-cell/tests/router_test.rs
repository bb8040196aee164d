use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use appointment_cell::AppointmentBookingService;
use chat_cell::handlers::ChatCellState;
use chat_cell::router::chat_routes;
use chat_cell::{ConversationService, SessionStore};
use doctor_cell::{AvailabilityService, SlotGenerator, WeekdayCalendar};
use shared_utils::test_utils::{TestClinic, TEST_NATIONAL_ID};

fn app(clinic: &TestClinic) -> Router {
    let scheduling = &clinic.config.scheduling;
    let generator = SlotGenerator::new(scheduling.timezone, Arc::new(WeekdayCalendar::new()));
    let conversation = ConversationService::new(
        clinic.config.conversation.clone(),
        Arc::new(SessionStore::new(&clinic.config.session, clinic.clock.clone())),
        clinic.db.clone(),
        clinic.db.clone(),
        Arc::new(AvailabilityService::new(
            scheduling,
            generator,
            clinic.db.clone(),
            clinic.clock.clone(),
        )),
        Arc::new(AppointmentBookingService::new(scheduling, clinic.db.clone())),
    )
    .unwrap();

    chat_routes(Arc::new(ChatCellState {
        conversation: Arc::new(conversation),
    }))
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_start_then_continue() {
    let clinic = TestClinic::new();
    let app = app(&clinic);

    let (status, started) = post(&app, "/start", json!({ "text": TEST_NATIONAL_ID })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(started["text"].as_str().unwrap().contains("Maria Oliveira"));
    let session_id = started["session_id"].as_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&session_id).is_ok());

    let (status, reply) = post(
        &app,
        "/continue",
        json!({ "session_id": session_id, "text": "cardiology" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(reply["text"].as_str().unwrap().contains("Ana Souza"));
}

#[tokio::test]
async fn test_blank_fields_are_rejected() {
    let clinic = TestClinic::new();
    let app = app(&clinic);

    let (status, body) = post(&app, "/start", json!({ "text": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("text"));

    let (status, _) = post(&app, "/continue", json!({ "session_id": "", "text": "hi" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
