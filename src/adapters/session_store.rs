use crate::domain::model::ActivationRecord;
use crate::domain::ports::ActivationStorage;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Same lifetime as an untouched PHP session (`session.gc_maxlifetime`).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(24 * 60);

#[derive(Debug)]
struct SessionEntry {
    record: ActivationRecord,
    last_seen: Instant,
}

/// One activation record per browser session.
///
/// Sessions never see each other's flags: a vendor's scan only shows up in
/// the session of the device that scanned. A session that has not been
/// touched for the idle timeout is dropped on the next access.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub fn new_session_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }

    /// Storage view bound to one session id.
    pub fn scope(&self, session_id: impl Into<String>) -> SessionScope<'_> {
        SessionScope {
            store: self,
            session_id: session_id.into(),
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn expire_idle(&self, sessions: &mut HashMap<String, SessionEntry>) {
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() < self.idle_timeout);
        let expired = before - sessions.len();
        if expired > 0 {
            tracing::debug!(expired, active = sessions.len(), "Idle sessions dropped");
        }
    }
}

pub struct SessionScope<'a> {
    store: &'a SessionStore,
    session_id: String,
}

#[async_trait]
impl<'a> ActivationStorage for SessionScope<'a> {
    async fn load(&self) -> Result<ActivationRecord> {
        let mut sessions = self
            .store
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.store.expire_idle(&mut sessions);
        Ok(match sessions.get_mut(&self.session_id) {
            Some(entry) => {
                entry.last_seen = Instant::now();
                entry.record.clone()
            }
            None => ActivationRecord::default(),
        })
    }

    async fn save(&self, record: &ActivationRecord) -> Result<()> {
        let mut sessions = self
            .store
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.store.expire_idle(&mut sessions);
        sessions.insert(
            self.session_id.clone(),
            SessionEntry {
                record: record.clone(),
                last_seen: Instant::now(),
            },
        );
        tracing::debug!(sessions = sessions.len(), "Session record stored");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("session:{}", self.session_id)
    }
}
