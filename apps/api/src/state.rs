use std::sync::Arc;

use appointment_cell::handlers::AppointmentCellState;
use appointment_cell::AppointmentBookingService;
use chat_cell::handlers::ChatCellState;
use chat_cell::{ConversationService, SessionStore};
use doctor_cell::handlers::DoctorCellState;
use doctor_cell::{AvailabilityService, SlotGenerator, WeekdayCalendar};
use shared_config::AppConfig;
use shared_database::InMemoryDatabase;
use shared_models::Clock;

/// Per-cell router state, all sharing one store and one clock.
pub struct AppState {
    pub chat: Arc<ChatCellState>,
    pub appointments: Arc<AppointmentCellState>,
    pub practitioners: Arc<DoctorCellState>,
}

impl AppState {
    pub fn build(
        config: &AppConfig,
        database: Arc<InMemoryDatabase>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let scheduling = &config.scheduling;

        let calendar = Arc::new(WeekdayCalendar::with_holidays(scheduling.holidays.clone()));
        let generator = SlotGenerator::new(scheduling.timezone, calendar);
        let availability = Arc::new(AvailabilityService::new(
            scheduling,
            generator,
            database.clone(),
            Arc::clone(&clock),
        ));
        let booking = Arc::new(AppointmentBookingService::new(scheduling, database.clone()));
        let sessions = Arc::new(SessionStore::new(&config.session, clock));

        let conversation = ConversationService::new(
            config.conversation.clone(),
            sessions,
            database.clone(),
            database.clone(),
            Arc::clone(&availability),
            Arc::clone(&booking),
        )?;

        Ok(Self {
            chat: Arc::new(ChatCellState {
                conversation: Arc::new(conversation),
            }),
            appointments: Arc::new(AppointmentCellState { booking }),
            practitioners: Arc::new(DoctorCellState {
                directory: database,
                availability,
            }),
        })
    }
}
