//! Reviewer sessions
//!
//! A session is created on login and identified by a random bearer token.
//! It owns the reviewer's [`CurationStore`]; the store sits behind an async
//! mutex so one session's requests are applied one at a time.
//!
//! Sessions that see no request for the idle timeout are dropped: an
//! expired token is refused on its next use, and every login sweeps out
//! whatever else has gone idle.

use curate_common::CurationStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Idle time after which a session is dropped (8 hours)
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(8 * 60 * 60);

/// One logged-in reviewer
#[derive(Debug)]
pub struct Session {
    pub token: Uuid,
    pub username: String,
    pub store: Mutex<CurationStore>,
    last_seen: std::sync::Mutex<Instant>,
}

impl Session {
    fn new(username: &str) -> Self {
        Self {
            token: Uuid::new_v4(),
            username: username.to_string(),
            store: Mutex::new(CurationStore::new()),
            last_seen: std::sync::Mutex::new(Instant::now()),
        }
    }

    /// Time since the session was last used
    pub fn idle_for(&self) -> Duration {
        match self.last_seen.lock() {
            Ok(last_seen) => last_seen.elapsed(),
            Err(poisoned) => poisoned.into_inner().elapsed(),
        }
    }

    fn touch(&self) {
        let mut last_seen = match self.last_seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *last_seen = Instant::now();
    }
}

/// All live sessions, keyed by token
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Session>>>>,
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
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    fn is_expired(&self, session: &Session) -> bool {
        session.idle_for() >= self.idle_timeout
    }

    /// Start a session with an empty curation store
    ///
    /// Expired sessions are pruned first.
    pub async fn create(&self, username: &str) -> Arc<Session> {
        let session = Arc::new(Session::new(username));

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, existing| !self.is_expired(existing));
        let pruned = before - sessions.len();
        if pruned > 0 {
            info!("Pruned {} idle sessions", pruned);
        }
        sessions.insert(session.token, session.clone());
        drop(sessions);

        info!("Session started for '{}'", username);
        session
    }

    /// Look up a live session and mark it as used
    ///
    /// An expired session is removed and reported as absent.
    pub async fn get(&self, token: &Uuid) -> Option<Arc<Session>> {
        let session = self.sessions.read().await.get(token).cloned()?;
        if self.is_expired(&session) {
            self.sessions.write().await.remove(token);
            debug!("Session of '{}' expired", session.username);
            return None;
        }
        session.touch();
        Some(session)
    }

    /// End a session; unsaved state is already on disk since every change persists
    pub async fn remove(&self, token: &Uuid) -> Option<Arc<Session>> {
        let removed = self.sessions.write().await.remove(token);
        if let Some(session) = &removed {
            info!("Session ended for '{}'", session.username);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
