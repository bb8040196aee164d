use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use shared_config::SessionConfig;
use shared_models::Clock;

use crate::models::{ConversationStep, StepKind};

#[derive(Debug)]
pub struct SessionEntry {
    pub step: ConversationStep,
    pub last_activity: DateTime<Utc>,
    discarded: bool,
}

impl SessionEntry {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            step: ConversationStep::AwaitingId,
            last_activity: now,
            discarded: false,
        }
    }

    fn is_idle(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.last_activity > ttl
    }
}

/// Exclusive access to one session for the duration of a message.
pub struct SessionLease {
    session_id: String,
    cell: Arc<Mutex<SessionEntry>>,
    entry: OwnedMutexGuard<SessionEntry>,
}

impl SessionLease {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl Deref for SessionLease {
    type Target = SessionEntry;

    fn deref(&self) -> &Self::Target {
        &self.entry
    }
}

impl DerefMut for SessionLease {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.entry
    }
}

/// Conversation state keyed by session id. Each session sits behind its own
/// mutex, so messages of one session run one at a time while different
/// sessions never wait on each other.
pub struct SessionStore {
    sessions: DashMap<String, Arc<Mutex<SessionEntry>>>,
    clock: Arc<dyn Clock>,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(config: &SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: DashMap::new(),
            clock,
            idle_ttl: Duration::seconds(config.idle_ttl_seconds),
        }
    }

    fn cell(&self, session_id: &str) -> Arc<Mutex<SessionEntry>> {
        let now = self.clock.now();
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(SessionEntry::new(now))))
            .clone()
    }

    /// Waits for the session's lock, creating the session on first use. A
    /// session idle past the TTL starts over at `AWAITING_ID`.
    pub async fn lease(&self, session_id: &str) -> SessionLease {
        loop {
            let cell = self.cell(session_id);
            let mut entry = Arc::clone(&cell).lock_owned().await;

            // Discarded while we waited; the map no longer points at it.
            if entry.discarded {
                continue;
            }

            let now = self.clock.now();
            if entry.is_idle(now, self.idle_ttl) {
                debug!("Session {} expired after inactivity, restarting", session_id);
                entry.step = ConversationStep::AwaitingId;
            }
            entry.last_activity = now;

            return SessionLease {
                session_id: session_id.to_string(),
                cell,
                entry,
            };
        }
    }

    /// Drops the session. The next message for the same id starts a new flow.
    pub fn discard(&self, mut lease: SessionLease) {
        lease.entry.discarded = true;
        self.sessions
            .remove_if(&lease.session_id, |_, cell| Arc::ptr_eq(cell, &lease.cell));
        debug!("Session {} discarded", lease.session_id);
    }

    /// Current step of a live session, or `None` when there is none.
    pub async fn step_of(&self, session_id: &str) -> Option<StepKind> {
        let cell = self.sessions.get(session_id).map(|cell| Arc::clone(cell.value()))?;
        let entry = cell.lock().await;
        if entry.discarded || entry.is_idle(self.clock.now(), self.idle_ttl) {
            return None;
        }
        Some(entry.step.kind())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Removes sessions idle past the TTL. Sessions busy with a message are
    /// left alone.
    pub fn purge_idle(&self) -> usize {
        let now = self.clock.now();
        let before = self.sessions.len();

        self.sessions.retain(|_, cell| match cell.try_lock() {
            Ok(mut entry) if entry.is_idle(now, self.idle_ttl) => {
                entry.discarded = true;
                false
            }
            _ => true,
        });

        before.saturating_sub(self.sessions.len())
    }
}

/// Periodically purges idle sessions until the task is aborted.
pub fn spawn_session_sweeper(store: Arc<SessionStore>, every: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let purged = store.purge_idle();
            if purged > 0 {
                info!("Purged {} idle chat sessions", purged);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_utils::test_utils::TestConfig;

    fn store() -> (SessionStore, Arc<shared_utils::test_utils::MockClock>) {
        let clock = TestConfig::default().clock();
        let config = SessionConfig {
            idle_ttl_seconds: 600,
            sweep_interval_seconds: 60,
        };
        (SessionStore::new(&config, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_lease_creates_a_fresh_session() {
        let (store, _) = store();
        let lease = store.lease("s-1").await;
        assert_eq!(lease.step.kind(), StepKind::AwaitingId);
        assert_eq!(lease.session_id(), "s-1");
        drop(lease);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_discarded_session_starts_over() {
        let (store, _) = store();
        let mut lease = store.lease("s-1").await;
        lease.step = ConversationStep::Done;
        store.discard(lease);

        assert!(store.is_empty());
        assert_eq!(store.step_of("s-1").await, None);
        let lease = store.lease("s-1").await;
        assert_eq!(lease.step.kind(), StepKind::AwaitingId);
    }

    #[tokio::test]
    async fn test_idle_session_restarts_and_is_purged() {
        let (store, clock) = store();
        {
            let mut lease = store.lease("s-1").await;
            lease.step = ConversationStep::Done;
        }
        store.lease("s-2").await;

        clock.advance(Duration::seconds(601));
        assert_eq!(store.step_of("s-1").await, None);

        let lease = store.lease("s-1").await;
        assert_eq!(lease.step.kind(), StepKind::AwaitingId);
        drop(lease);

        assert_eq!(store.purge_idle(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_busy_session_is_not_purged() {
        let (store, clock) = store();
        let lease = store.lease("s-1").await;
        clock.advance(Duration::seconds(3600));

        assert_eq!(store.purge_idle(), 0);
        drop(lease);
        assert_eq!(store.purge_idle(), 1);
    }
}
