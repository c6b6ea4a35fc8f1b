/// Session storage — keyed collection of active reading sessions.

use chrono::{Duration, Utc};
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

use crate::core::session::ReadingSession;
use crate::schema::session_id::SessionId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON serialization error: {0}")]
    RonWrite(#[from] ron::Error),
}

/// Storage for reading sessions.
///
/// Each operation is atomic on its own. Nothing spans two operations, so a
/// caller mutating the same session from two places at once must serialize
/// those calls itself.
pub trait SessionStore: Send + Sync {
    /// A copy of the stored session, if any.
    fn get(&self, id: &SessionId) -> Option<ReadingSession>;
    /// Insert or replace a session under its own id.
    fn put(&self, session: ReadingSession);
    /// Remove a session. Returns whether it existed.
    fn delete(&self, id: &SessionId) -> bool;
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<FxHashMap<SessionId, ReadingSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FxHashMap<SessionId, ReadingSession>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// All stored ids, sorted.
    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Drop sessions with no activity for longer than `max_idle`. Returns
    /// how many were removed.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, session| session.last_activity() >= cutoff);
        let evicted = before - sessions.len();
        if evicted > 0 {
            log::info!("evicted {} idle sessions", evicted);
        }
        evicted
    }

    /// Write every session to a RON file.
    pub fn save_snapshot(&self, path: &Path) -> Result<(), StoreError> {
        let mut sessions: Vec<ReadingSession> = self.lock().values().cloned().collect();
        sessions.sort_by(|a, b| a.id().cmp(b.id()));
        let pretty = ron::ser::PrettyConfig::new().depth_limit(6);
        let serialized = ron::ser::to_string_pretty(&sessions, pretty)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Load sessions from a RON file written by [`MemoryStore::save_snapshot`].
    pub fn load_snapshot(path: &Path) -> Result<MemoryStore, StoreError> {
        let contents = std::fs::read_to_string(path)?;
        let sessions: Vec<ReadingSession> = ron::from_str(&contents)?;
        let store = MemoryStore::new();
        for session in sessions {
            store.put(session);
        }
        Ok(store)
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, id: &SessionId) -> Option<ReadingSession> {
        self.lock().get(id).cloned()
    }

    fn put(&self, session: ReadingSession) {
        self.lock().insert(session.id().clone(), session);
    }

    fn delete(&self, id: &SessionId) -> bool {
        self.lock().remove(id).is_some()
    }
}
