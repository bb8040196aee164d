pub mod appointment;
pub mod clock;
pub mod error;
pub mod patient;
pub mod practitioner;

pub use appointment::{Appointment, AppointmentRepository, AppointmentStatus, DayWindow, NewAppointment};
pub use clock::{Clock, SystemClock};
pub use error::AppError;
pub use patient::{Patient, PatientDirectory};
pub use practitioner::{Practitioner, PractitionerDirectory};
