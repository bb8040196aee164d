pub mod conversation;
pub mod session;

pub use conversation::ConversationService;
pub use session::{spawn_session_sweeper, SessionEntry, SessionLease, SessionStore};
