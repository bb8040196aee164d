use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use chrono::{Duration, NaiveDate};
use tower::ServiceExt;

use doctor_cell::handlers::DoctorCellState;
use doctor_cell::router::practitioner_routes;
use doctor_cell::{canonical_key, AvailabilityService, SlotGenerator, WeekdayCalendar};
use shared_models::{AppointmentStatus, Clock};
use shared_utils::test_utils::{booked_appointment, TestClinic};

fn availability_service(clinic: &TestClinic) -> AvailabilityService {
    let scheduling = &clinic.config.scheduling;
    let generator = SlotGenerator::new(scheduling.timezone, Arc::new(WeekdayCalendar::new()));
    AvailabilityService::new(scheduling, generator, clinic.db.clone(), clinic.clock.clone())
}

fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
}

#[tokio::test]
async fn test_calendar_never_offers_a_booked_hour() {
    let clinic = TestClinic::new();
    let doctor = clinic.cardiologists[0].id;
    let monday = clinic.settings.today();

    let booked = [clinic.at(monday, 9), clinic.at(tuesday(), 13), clinic.at(tuesday(), 8)];
    for start in booked {
        clinic
            .db
            .insert_appointment(booked_appointment(doctor, start, 60, AppointmentStatus::Confirmed))
            .await;
    }

    let service = availability_service(&clinic);
    let calendar = service.practitioner_calendar(doctor).await.unwrap();

    let tz = clinic.settings.timezone;
    let booked_keys: Vec<String> = booked.iter().map(|b| canonical_key(*b, tz)).collect();
    for (date, times) in &calendar {
        for time in times {
            let key = format!("{} {}", date.format("%Y-%m-%d"), &time[..2]);
            assert!(!booked_keys.contains(&key), "{} was offered", key);
        }
    }
    assert_eq!(calendar[&tuesday()], vec!["09:00", "10:00", "11:00", "12:00"]);
}

#[tokio::test]
async fn test_cancelled_appointments_free_their_hour() {
    let clinic = TestClinic::new();
    let doctor = clinic.cardiologists[0].id;
    clinic
        .db
        .insert_appointment(booked_appointment(
            doctor,
            clinic.at(tuesday(), 10),
            60,
            AppointmentStatus::Cancelled,
        ))
        .await;

    let service = availability_service(&clinic);
    let times = service.free_times_on(doctor, tuesday()).await.unwrap();
    assert_eq!(times.len(), 6);
}

#[tokio::test]
async fn test_other_practitioners_bookings_are_ignored() {
    let clinic = TestClinic::new();
    clinic
        .db
        .insert_appointment(booked_appointment(
            clinic.cardiologists[1].id,
            clinic.at(tuesday(), 10),
            60,
            AppointmentStatus::Pending,
        ))
        .await;

    let service = availability_service(&clinic);
    let times = service.free_times_on(clinic.cardiologists[0].id, tuesday()).await.unwrap();
    assert!(times.contains(&"10:00".to_string()));
}

#[tokio::test]
async fn test_eligible_days_follow_the_clock() {
    let clinic = TestClinic::new();
    let service = availability_service(&clinic);

    let days = service.eligible_days();
    assert_eq!(days.len(), 30);
    assert_eq!(days[0], clinic.settings.today());

    // Saturday: the first eligible day becomes the next Monday
    clinic.clock.advance(Duration::days(5));
    let days = service.eligible_days();
    assert_eq!(days[0], NaiveDate::from_ymd_opt(2026, 10, 26).unwrap());
    assert!(clinic.clock.now() > clinic.settings.now);
}

#[tokio::test]
async fn test_availability_route_returns_the_calendar() {
    let clinic = TestClinic::new();
    let state = Arc::new(DoctorCellState {
        directory: clinic.db.clone(),
        availability: Arc::new(availability_service(&clinic)),
    });
    let app = practitioner_routes(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/CRM-1001/availability")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["practitioner"]["name"], "Ana Souza");
    assert_eq!(json["timezone"], "America/Sao_Paulo");
    assert_eq!(json["calendar"][0]["weekday"], "Monday");
    assert_eq!(json["calendar"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_unknown_license_is_not_found() {
    let clinic = TestClinic::new();
    let state = Arc::new(DoctorCellState {
        directory: clinic.db.clone(),
        availability: Arc::new(availability_service(&clinic)),
    });

    let response = practitioner_routes(state)
        .oneshot(
            Request::builder()
                .uri("/CRM-9999/availability")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
