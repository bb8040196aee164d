use appointment_cell::BookingError;
use chrono::NaiveDate;
use thiserror::Error;

/// Outcome of a step that did not advance. The first three are answered with
/// a corrective prompt and leave the session where it was; the others end
/// the session.
#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("There are no free times on {}. Please choose another day (DD/MM/YYYY).", .0.format("%d/%m/%Y"))]
    NoAvailability(NaiveDate),

    #[error("Selected {0} no longer exists")]
    StaleSelection(String),

    #[error("Booking rejected: {0}")]
    Booking(#[from] BookingError),

    #[error("Collaborator failure: {0}")]
    Upstream(String),
}

impl ConversationError {
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ConversationError::NotFound(_)
                | ConversationError::Validation(_)
                | ConversationError::NoAvailability(_)
        )
    }
}

impl From<anyhow::Error> for ConversationError {
    fn from(err: anyhow::Error) -> Self {
        ConversationError::Upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use uuid::Uuid;

    #[test]
    fn test_only_input_problems_are_recoverable() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        assert!(ConversationError::NoAvailability(day).is_recoverable());
        assert!(ConversationError::Validation("bad date".to_string()).is_recoverable());
        assert!(!ConversationError::Upstream("timeout".to_string()).is_recoverable());

        let err: ConversationError = BookingError::CapacityExceeded {
            practitioner_id: Uuid::nil(),
        }
        .into();
        assert!(!err.is_recoverable());
        assert_matches!(err, ConversationError::Booking(BookingError::CapacityExceeded { .. }));
    }

    #[test]
    fn test_no_availability_names_the_day() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        assert!(ConversationError::NoAvailability(day)
            .to_string()
            .contains("20/10/2026"));
    }

    #[test]
    fn test_collaborator_errors_become_upstream() {
        let err: ConversationError = anyhow::anyhow!("connection refused").into();
        assert_matches!(err, ConversationError::Upstream(reason) if reason.contains("refused"));
    }
}
