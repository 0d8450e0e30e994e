//! Maps browser sessions to their result caches.

use super::ResultCache;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;
use uuid::Uuid;

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "snip_session";

/// Handle to one session's cache. Holding the lock serializes renders of
/// the same session.
pub type SessionHandle = Arc<AsyncMutex<ResultCache>>;

/// Idle time after which a session is dropped, unless configured.
const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

struct Entry {
    handle: SessionHandle,
    last_seen: Instant,
}

/// In-memory registry of sessions.
///
/// Sessions idle for longer than the timeout are swept on the next lookup,
/// so a cache lives only as long as its browser keeps using it.
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Entry>>,
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

    /// Find the session for `id`, or start a new one.
    ///
    /// Returns the session id actually used and whether it was created.
    pub fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, SessionHandle, bool) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) <= self.idle_timeout);
        if sessions.len() < before {
            debug!("Dropped {} idle session(s)", before - sessions.len());
        }

        if let Some(id) = id {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_seen = now;
                return (id, entry.handle.clone(), false);
            }
        }

        let id = Uuid::new_v4();
        let handle: SessionHandle = Arc::new(AsyncMutex::new(ResultCache::new()));
        sessions.insert(
            id,
            Entry {
                handle: handle.clone(),
                last_seen: now,
            },
        );
        (id, handle, true)
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extract the session id from a `Cookie` header value.
pub fn session_id_from_cookie(header: &str) -> Option<Uuid> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// `Set-Cookie` value for a session. No expiry: the cookie ends with the
/// browser session.
pub fn session_cookie(id: Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}
