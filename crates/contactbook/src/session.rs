//! Session-scoped flash messages.
//!
//! A flash message is set by one request and consumed by the next render of
//! the view it targets. Sessions live in memory, keyed by a random id carried
//! in a cookie, and expire after a period without access.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Flash key used for the status line on the contact list.
pub const FLASH_MSG: &str = "msg";

/// Opaque session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        let bytes: [u8; 16] = rand::thread_rng().gen();
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Accept an id from a cookie value if it is well formed.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let ok = value.len() == 32 && value.bytes().all(|b| b.is_ascii_hexdigit());
        ok.then(|| Self(value.to_ascii_lowercase()))
    }

    /// The id as it appears in the cookie.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug)]
struct Session {
    flashes: HashMap<String, String>,
    touched: Instant,
}

/// In-memory store of per-session flash slots.
#[derive(Debug)]
pub struct FlashStore {
    max_age: Duration,
    sessions: Mutex<HashMap<SessionId, Session>>,
}

impl FlashStore {
    /// Create a store whose sessions expire `max_age` after their last use.
    #[must_use]
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Store `value` under `key` for the session, replacing any earlier value.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store's lock is poisoned.
    pub fn set(&self, session: &SessionId, key: &str, value: impl Into<String>) -> Result<()> {
        let mut sessions = self.lock()?;
        self.prune(&mut sessions);
        let entry = sessions.entry(session.clone()).or_insert_with(|| Session {
            flashes: HashMap::new(),
            touched: Instant::now(),
        });
        entry.touched = Instant::now();
        entry.flashes.insert(key.to_string(), value.into());
        debug!("Flash {key:?} set for session {session}");
        Ok(())
    }

    /// Take the value stored under `key`, leaving the slot empty.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store's lock is poisoned.
    pub fn consume(&self, session: &SessionId, key: &str) -> Result<Option<String>> {
        let mut sessions = self.lock()?;
        self.prune(&mut sessions);
        let Some(entry) = sessions.get_mut(session) else {
            return Ok(None);
        };
        entry.touched = Instant::now();
        let value = entry.flashes.remove(key);
        if entry.flashes.is_empty() {
            sessions.remove(session);
        }
        Ok(value)
    }

    /// Number of live sessions.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store's lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        let mut sessions = self.lock()?;
        self.prune(&mut sessions);
        Ok(sessions.len())
    }

    /// Whether no session holds a pending flash.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store's lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn prune(&self, sessions: &mut HashMap<SessionId, Session>) {
        let before = sessions.len();
        sessions.retain(|_, s| s.touched.elapsed() < self.max_age);
        let expired = before - sessions.len();
        if expired > 0 {
            trace!("Expired {expired} flash session(s)");
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, Session>>> {
        self.sessions
            .lock()
            .map_err(|_| Error::internal("flash store lock poisoned"))
    }
}
