use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use shared_models::{Patient, Practitioner};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartChatRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartChatResponse {
    pub session_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(alias = "sessionId")]
    pub session_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
}

impl ChatResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Plain step label, without the answers gathered so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepKind {
    AwaitingId,
    AwaitingSpecialty,
    AwaitingPractitioner,
    AwaitingDay,
    AwaitingTime,
    AwaitingConfirmation,
    Done,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StepKind::AwaitingId => "AWAITING_ID",
            StepKind::AwaitingSpecialty => "AWAITING_SPECIALTY",
            StepKind::AwaitingPractitioner => "AWAITING_PRACTITIONER",
            StepKind::AwaitingDay => "AWAITING_DAY",
            StepKind::AwaitingTime => "AWAITING_TIME",
            StepKind::AwaitingConfirmation => "AWAITING_CONFIRMATION",
            StepKind::Done => "DONE",
        };
        f.write_str(label)
    }
}

/// The patient and the practitioner picked at `AWAITING_PRACTITIONER`. The
/// specialty echoed back is the practitioner's own.
#[derive(Debug, Clone, PartialEq)]
pub struct PractitionerSelection {
    pub patient: Patient,
    pub practitioner: Practitioner,
}

/// Where a conversation stands. Each variant owns exactly the answers
/// collected before it, so a later field cannot be read early.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConversationStep {
    #[default]
    AwaitingId,
    AwaitingSpecialty {
        patient: Patient,
    },
    AwaitingPractitioner {
        patient: Patient,
        candidates: Vec<Practitioner>,
    },
    AwaitingDay {
        selection: PractitionerSelection,
        available_days: Vec<NaiveDate>,
    },
    AwaitingTime {
        selection: PractitionerSelection,
        available_days: Vec<NaiveDate>,
        day: NaiveDate,
        free_times: Vec<String>,
    },
    AwaitingConfirmation {
        selection: PractitionerSelection,
        starts_at: DateTime<Utc>,
    },
    Done,
}

impl ConversationStep {
    pub fn kind(&self) -> StepKind {
        match self {
            ConversationStep::AwaitingId => StepKind::AwaitingId,
            ConversationStep::AwaitingSpecialty { .. } => StepKind::AwaitingSpecialty,
            ConversationStep::AwaitingPractitioner { .. } => StepKind::AwaitingPractitioner,
            ConversationStep::AwaitingDay { .. } => StepKind::AwaitingDay,
            ConversationStep::AwaitingTime { .. } => StepKind::AwaitingTime,
            ConversationStep::AwaitingConfirmation { .. } => StepKind::AwaitingConfirmation,
            ConversationStep::Done => StepKind::Done,
        }
    }
}
