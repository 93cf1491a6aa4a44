//! Server-side sessions keyed by an opaque cookie token.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Opaque session token (256 random bits, hex encoded).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        let bytes: [u8; 32] = rand::random();
        Self(hex::encode(bytes))
    }

    /// Accept a token presented by a client. Only the shape is checked here;
    /// unknown tokens simply do not resolve to a session.
    pub fn parse(raw: &str) -> Option<Self> {
        (raw.len() == 64 && raw.bytes().all(|b| b.is_ascii_hexdigit())).then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for SessionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A live CAPTCHA challenge bound to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub text: String,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub authenticated: bool,
    /// At most one live challenge per session.
    pub challenge: Option<Challenge>,
}

impl SessionState {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            last_seen: now,
            authenticated: false,
            challenge: None,
        }
    }
}

/// Session storage. Each call is atomic with respect to the session it
/// touches; sessions idle past their TTL behave as absent.
pub trait SessionStore: Send + Sync {
    fn create(&self, now: DateTime<Utc>) -> SessionId;

    /// Current state, refreshing `last_seen`.
    fn touch(&self, id: &SessionId, now: DateTime<Utc>) -> Option<SessionState>;

    /// Mutate a session in place; returns `false` if it does not exist.
    fn modify(&self, id: &SessionId, now: DateTime<Utc>, f: &mut dyn FnMut(&mut SessionState)) -> bool;

    fn remove(&self, id: &SessionId);
}

/// In-process session table.
#[derive(Debug)]
pub struct InMemorySessionStore {
    ttl: Duration,
    inner: Mutex<HashMap<SessionId, SessionState>>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expired(&self, state: &SessionState, now: DateTime<Utc>) -> bool {
        now - state.last_seen > self.ttl
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, now: DateTime<Utc>) -> SessionId {
        let id = SessionId::generate();
        if let Ok(mut map) = self.inner.lock() {
            // Sweep expired sessions.
            map.retain(|_, s| now - s.last_seen <= self.ttl);
            map.insert(id.clone(), SessionState::new(now));
        }
        id
    }

    fn touch(&self, id: &SessionId, now: DateTime<Utc>) -> Option<SessionState> {
        let mut map = self.inner.lock().ok()?;
        let state = map.get_mut(id)?;
        if self.expired(state, now) {
            map.remove(id);
            return None;
        }
        state.last_seen = now;
        Some(state.clone())
    }

    fn modify(&self, id: &SessionId, now: DateTime<Utc>, f: &mut dyn FnMut(&mut SessionState)) -> bool {
        let Ok(mut map) = self.inner.lock() else {
            return false;
        };
        let Some(state) = map.get_mut(id) else {
            return false;
        };
        if self.expired(state, now) {
            map.remove(id);
            return false;
        }
        state.last_seen = now;
        f(state);
        true
    }

    fn remove(&self, id: &SessionId) {
        if let Ok(mut map) = self.inner.lock() {
            map.remove(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn session_ids_are_random_hex() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert_eq!(SessionId::parse(a.as_str()), Some(a));
        assert_eq!(SessionId::parse("short"), None);
        assert_eq!(SessionId::parse(&"z".repeat(64)), None);
    }

    #[test]
    fn sessions_expire_after_idle_ttl() {
        let store = InMemorySessionStore::new(Duration::minutes(10));
        let id = store.create(t0());

        assert!(store.touch(&id, t0() + Duration::minutes(9)).is_some());
        // Touch refreshed last_seen, so 18 minutes after creation is fine.
        assert!(store.touch(&id, t0() + Duration::minutes(18)).is_some());
        assert!(store.touch(&id, t0() + Duration::minutes(29)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn modify_and_remove() {
        let store = InMemorySessionStore::new(Duration::minutes(10));
        let id = store.create(t0());
        assert!(store.modify(&id, t0(), &mut |s| s.authenticated = true));
        assert!(store.touch(&id, t0()).unwrap().authenticated);

        store.remove(&id);
        assert!(!store.modify(&id, t0(), &mut |s| s.authenticated = true));
        assert!(store.touch(&id, t0()).is_none());
    }
}
