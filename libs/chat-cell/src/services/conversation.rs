use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;
use tracing::{debug, error, instrument, warn};

use appointment_cell::{AppointmentBookingService, BookAppointmentRequest, BookingError};
use doctor_cell::{weekday_name, AvailabilityService, PractitionerChoice};
use shared_config::ConversationConfig;
use shared_models::{Patient, PatientDirectory, Practitioner, PractitionerDirectory};
use shared_utils::text::{matches_keyword, normalize_national_id};

use crate::error::ConversationError;
use crate::models::{ChatRequest, ChatResponse, ConversationStep, PractitionerSelection};
use crate::services::session::SessionStore;

const TIME_PATTERN: &str = r"^([01]\d|2[0-3]):[0-5]\d$";
const DATE_FORMAT: &str = "%d/%m/%Y";

const GENERIC_FAILURE: &str =
    "Sorry, we could not complete your request right now. Please start again later.";
const BOOKING_FAILURE: &str =
    "Sorry, we could not book this appointment. Please start again and choose another time.";
const NOT_UNDERSTOOD: &str =
    "Sorry, I did not understand. Send a message to start a new booking.";

/// What a step does to the session when it succeeds.
enum Transition {
    Advance(ConversationStep, String),
    Finish(String),
}

/// The guided booking dialogue. One call to [`ConversationService::handle`]
/// processes one message while holding that session's lock.
pub struct ConversationService {
    sessions: Arc<SessionStore>,
    patients: Arc<dyn PatientDirectory>,
    practitioners: Arc<dyn PractitionerDirectory>,
    availability: Arc<AvailabilityService>,
    booking: Arc<AppointmentBookingService>,
    config: ConversationConfig,
    time_pattern: Regex,
}

impl ConversationService {
    pub fn new(
        config: ConversationConfig,
        sessions: Arc<SessionStore>,
        patients: Arc<dyn PatientDirectory>,
        practitioners: Arc<dyn PractitionerDirectory>,
        availability: Arc<AvailabilityService>,
        booking: Arc<AppointmentBookingService>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            sessions,
            patients,
            practitioners,
            availability,
            booking,
            config,
            time_pattern: Regex::new(TIME_PATTERN)?,
        })
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    #[instrument(skip(self, request), fields(session_id = %request.session_id))]
    pub async fn handle(&self, request: ChatRequest) -> ChatResponse {
        let mut session = self.sessions.lease(&request.session_id).await;
        let input = request.text.trim();
        let from = session.step.kind();

        if matches_keyword(input, &self.config.cancel_token) {
            self.sessions.discard(session);
            return ChatResponse::new("Booking cancelled. Send a message whenever you want to start again.");
        }

        let outcome = match &session.step {
            ConversationStep::AwaitingId => self.on_national_id(input).await,
            ConversationStep::AwaitingSpecialty { patient } => {
                self.on_specialty(patient, input).await
            }
            ConversationStep::AwaitingPractitioner { patient, candidates } => {
                self.on_practitioner(patient, candidates, input)
            }
            ConversationStep::AwaitingDay { selection, available_days } => {
                self.on_day(selection, available_days, input).await
            }
            ConversationStep::AwaitingTime { selection, day, free_times, .. } => {
                self.on_time(selection, *day, free_times, input)
            }
            ConversationStep::AwaitingConfirmation { selection, starts_at } => {
                self.on_confirmation(selection, *starts_at, input).await
            }
            ConversationStep::Done => Ok(Transition::Finish(NOT_UNDERSTOOD.to_string())),
        };

        match outcome {
            Ok(Transition::Advance(next, text)) => {
                debug!("Step {} -> {}", from, next.kind());
                session.step = next;
                ChatResponse::new(text)
            }
            Ok(Transition::Finish(text)) => {
                debug!("Conversation finished at {}", from);
                self.sessions.discard(session);
                ChatResponse::new(text)
            }
            Err(err) if err.is_recoverable() => {
                debug!("Re-prompting at {}: {}", from, err);
                ChatResponse::new(err.to_string())
            }
            Err(ConversationError::Booking(BookingError::Upstream(reason)))
            | Err(ConversationError::Upstream(reason)) => {
                error!("Upstream failure at {}: {}", from, reason);
                self.sessions.discard(session);
                ChatResponse::new(GENERIC_FAILURE)
            }
            Err(err) => {
                warn!("Booking failed at {}: {}", from, err);
                self.sessions.discard(session);
                ChatResponse::new(BOOKING_FAILURE)
            }
        }
    }

    async fn on_national_id(&self, input: &str) -> Result<Transition, ConversationError> {
        let national_id = normalize_national_id(input);
        if !national_id.chars().any(|c| c.is_ascii_digit()) {
            return Err(ConversationError::Validation(
                "Welcome! To book an appointment, please send your national ID (CPF).".to_string(),
            ));
        }

        let patient = self
            .patients
            .find_by_national_id(&national_id)
            .await?
            .ok_or_else(|| {
                ConversationError::NotFound(format!(
                    "We could not find a patient with national ID {}. Please check it and send it again.",
                    national_id
                ))
            })?;

        let text = format!(
            "Hello, {}! Which specialty (or practitioner name) are you looking for?",
            patient.name
        );
        Ok(Transition::Advance(ConversationStep::AwaitingSpecialty { patient }, text))
    }

    async fn on_specialty(&self, patient: &Patient, input: &str) -> Result<Transition, ConversationError> {
        if input.is_empty() {
            return Err(ConversationError::Validation(
                "Please tell me the specialty you are looking for.".to_string(),
            ));
        }

        let candidates = self.practitioners.find_by_specialty_or_name(input).await?;
        if candidates.is_empty() {
            return Err(ConversationError::NotFound(format!(
                "No practitioners found for \"{}\". Please try another specialty.",
                input
            )));
        }

        let listing: Vec<String> = candidates
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{}. {} ({})", i + 1, p.name, p.specialty))
            .collect();
        let text = format!(
            "These practitioners are available:\n{}\nReply with the number or the name of your choice.",
            listing.join("\n")
        );

        Ok(Transition::Advance(
            ConversationStep::AwaitingPractitioner {
                patient: patient.clone(),
                candidates,
            },
            text,
        ))
    }

    fn on_practitioner(
        &self,
        patient: &Patient,
        candidates: &[Practitioner],
        input: &str,
    ) -> Result<Transition, ConversationError> {
        let practitioner = PractitionerChoice::parse(input)
            .and_then(|choice| choice.resolve(candidates))
            .ok_or_else(|| {
                ConversationError::NotFound(format!(
                    "I could not match \"{}\" to the list. Reply with a number from 1 to {} or part of the name.",
                    input,
                    candidates.len()
                ))
            })?;

        let available_days = self.availability.eligible_days();
        let listing: Vec<String> = available_days
            .iter()
            .map(|day| format!("{} ({})", day.format(DATE_FORMAT), weekday_name(day.weekday())))
            .collect();
        let text = format!(
            "You chose {}. Which day works for you? Available days:\n{}\nReply with the date as DD/MM/YYYY.",
            practitioner.name,
            listing.join("\n")
        );

        Ok(Transition::Advance(
            ConversationStep::AwaitingDay {
                selection: PractitionerSelection {
                    patient: patient.clone(),
                    practitioner: practitioner.clone(),
                },
                available_days,
            },
            text,
        ))
    }

    async fn on_day(
        &self,
        selection: &PractitionerSelection,
        available_days: &[NaiveDate],
        input: &str,
    ) -> Result<Transition, ConversationError> {
        let day = NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|_| {
            ConversationError::Validation(
                "Please send the date in the format DD/MM/YYYY, for example 20/10/2026.".to_string(),
            )
        })?;

        if !available_days.contains(&day) {
            return Err(ConversationError::Validation(format!(
                "{} is not available for booking. Please choose one of the listed days.",
                day.format(DATE_FORMAT)
            )));
        }

        let free_times = self
            .availability
            .free_times_on(selection.practitioner.id, day)
            .await?;
        if free_times.is_empty() {
            return Err(ConversationError::NoAvailability(day));
        }

        let text = format!(
            "Free times on {} ({}): {}\nReply with the time as HH:mm.",
            day.format(DATE_FORMAT),
            weekday_name(day.weekday()),
            free_times.join(", ")
        );

        Ok(Transition::Advance(
            ConversationStep::AwaitingTime {
                selection: selection.clone(),
                available_days: available_days.to_vec(),
                day,
                free_times,
            },
            text,
        ))
    }

    fn on_time(
        &self,
        selection: &PractitionerSelection,
        day: NaiveDate,
        free_times: &[String],
        input: &str,
    ) -> Result<Transition, ConversationError> {
        if !self.time_pattern.is_match(input) {
            return Err(ConversationError::Validation(
                "Please send the time in the format HH:mm, for example 09:00.".to_string(),
            ));
        }
        if !free_times.iter().any(|time| time == input) {
            return Err(ConversationError::Validation(format!(
                "{} is not free on {}. Please choose one of: {}",
                input,
                day.format(DATE_FORMAT),
                free_times.join(", ")
            )));
        }

        let starts_at = self.combine(day, input)?;
        let local = starts_at.with_timezone(&self.availability.timezone());
        let text = format!(
            "Please confirm your appointment:\nPatient ID: {}\nPractitioner: {}\nSpecialty: {}\nDate and time: {}\nReply \"{}\" to confirm or anything else to cancel.",
            selection.patient.national_id,
            selection.practitioner.name,
            selection.practitioner.specialty,
            local.format("%d/%m/%Y %H:%M"),
            self.config.confirmation_token
        );

        Ok(Transition::Advance(
            ConversationStep::AwaitingConfirmation {
                selection: selection.clone(),
                starts_at,
            },
            text,
        ))
    }

    /// Wall-clock `day` + `HH:mm` in the reference zone, as an instant.
    fn combine(&self, day: NaiveDate, time: &str) -> Result<DateTime<Utc>, ConversationError> {
        let invalid = || {
            ConversationError::Validation(format!(
                "{} {} does not exist on the clinic's clock. Please choose another time.",
                day.format(DATE_FORMAT),
                time
            ))
        };
        let time = NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| invalid())?;
        self.availability
            .timezone()
            .from_local_datetime(&day.and_time(time))
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(invalid)
    }

    async fn on_confirmation(
        &self,
        selection: &PractitionerSelection,
        starts_at: DateTime<Utc>,
        input: &str,
    ) -> Result<Transition, ConversationError> {
        if !matches_keyword(input, &self.config.confirmation_token) {
            return Ok(Transition::Finish(
                "Booking cancelled. Send a message whenever you want to start again.".to_string(),
            ));
        }

        // Records may have changed since they were picked.
        let patient = self
            .patients
            .find_by_national_id(&selection.patient.national_id)
            .await?
            .ok_or_else(|| {
                ConversationError::StaleSelection(format!(
                    "patient {}",
                    selection.patient.national_id
                ))
            })?;
        let practitioner = self
            .practitioners
            .find_by_license_id(&selection.practitioner.license_id)
            .await?
            .ok_or_else(|| {
                ConversationError::StaleSelection(format!(
                    "practitioner {}",
                    selection.practitioner.license_id
                ))
            })?;

        let appointment = self
            .booking
            .book(BookAppointmentRequest {
                practitioner_id: practitioner.id,
                patient_id: patient.id,
                start_time: starts_at,
                duration_minutes: None,
            })
            .await?;

        let local = appointment.start_time.with_timezone(&self.availability.timezone());
        Ok(Transition::Finish(format!(
            "Your appointment with {} on {} is booked. Reference: {}",
            practitioner.name,
            local.format("%d/%m/%Y at %H:%M"),
            appointment.id
        )))
    }
}
