//! AuthGate: single-admin login with a single-use CAPTCHA challenge.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::challenge::ChallengeGenerator;
use crate::password::PasswordHasher;
use crate::session::{Challenge, SessionId, SessionStore};

/// Authentication failure. Callers learn whether the challenge or the
/// credentials failed, never which credential.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid captcha")]
    InvalidCaptcha,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unauthenticated")]
    Unauthenticated,
}

/// The configured admin identity. The hash is secret material supplied by
/// configuration, never compiled in.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub username: String,
    pub password_hash: String,
}

impl core::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct AuthGate {
    sessions: Arc<dyn SessionStore>,
    challenges: Arc<dyn ChallengeGenerator>,
    hasher: Arc<dyn PasswordHasher>,
    admin: AdminCredentials,
}

impl AuthGate {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        challenges: Arc<dyn ChallengeGenerator>,
        hasher: Arc<dyn PasswordHasher>,
        admin: AdminCredentials,
    ) -> Self {
        Self {
            sessions,
            challenges,
            hasher,
            admin,
        }
    }

    /// Reuse the presented session if it is still live, otherwise start a new
    /// one. Returns the session and whether it was newly created.
    pub fn ensure_session(&self, presented: Option<&SessionId>) -> (SessionId, bool) {
        let now = Utc::now();
        if let Some(id) = presented {
            if self.sessions.touch(id, now).is_some() {
                return (id.clone(), false);
            }
        }
        (self.sessions.create(now), true)
    }

    /// Bind a fresh challenge to the session, replacing any unconsumed one.
    pub fn issue_challenge(&self, session: &SessionId) -> Result<String, AuthError> {
        let now = Utc::now();
        let text = self.challenges.generate();
        let challenge = Challenge {
            text: text.clone(),
            issued_at: now,
        };

        let bound = self.sessions.modify(session, now, &mut |state| {
            state.challenge = Some(challenge.clone());
        });
        if !bound {
            return Err(AuthError::Unauthenticated);
        }
        Ok(text)
    }

    /// Consume the session's challenge, then check the credentials.
    ///
    /// The challenge is gone after this call whatever the outcome, so a
    /// response can never be replayed. On success the pre-login session is
    /// dropped and a fresh authenticated one is returned in its place.
    pub fn verify_login(
        &self,
        session: &SessionId,
        username: &str,
        password: &str,
        challenge_response: &str,
    ) -> Result<SessionId, AuthError> {
        let now = Utc::now();

        let mut consumed: Option<Challenge> = None;
        self.sessions.modify(session, now, &mut |state| {
            consumed = state.challenge.take();
        });

        let challenge_ok = consumed
            .map(|c| c.text.eq_ignore_ascii_case(challenge_response.trim()))
            .unwrap_or(false);
        if !challenge_ok {
            tracing::warn!("login rejected: invalid captcha");
            return Err(AuthError::InvalidCaptcha);
        }

        // Verify the hash even for an unknown username.
        let password_ok = self.hasher.verify(password, &self.admin.password_hash);
        if username != self.admin.username || !password_ok {
            tracing::warn!("login rejected: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        if self.sessions.touch(session, now).is_none() {
            return Err(AuthError::Unauthenticated);
        }
        self.sessions.remove(session);

        let fresh = self.sessions.create(now);
        let marked = self.sessions.modify(&fresh, now, &mut |state| {
            state.authenticated = true;
        });
        if !marked {
            return Err(AuthError::Unauthenticated);
        }

        tracing::info!("admin logged in");
        Ok(fresh)
    }

    /// Guard for every mutating operation.
    pub fn require_authenticated(&self, session: Option<&SessionId>) -> Result<(), AuthError> {
        let state = session.and_then(|id| self.sessions.touch(id, Utc::now()));
        match state {
            Some(s) if s.authenticated => Ok(()),
            _ => Err(AuthError::Unauthenticated),
        }
    }

    pub fn logout(&self, session: &SessionId) {
        self.sessions.remove(session);
        tracing::info!("session cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::Argon2PasswordHasher;
    use crate::session::InMemorySessionStore;
    use std::sync::Mutex;

    /// Hands out queued challenge strings in order.
    struct Scripted(Mutex<Vec<&'static str>>);

    impl ChallengeGenerator for Scripted {
        fn generate(&self) -> String {
            self.0.lock().unwrap().remove(0).to_string()
        }
    }

    fn gate(script: Vec<&'static str>) -> AuthGate {
        let hasher = Argon2PasswordHasher::with_cost(8, 1, 1).unwrap();
        let admin = AdminCredentials {
            username: "admin".into(),
            password_hash: hasher.hash("password123").unwrap(),
        };
        AuthGate::new(
            Arc::new(InMemorySessionStore::new(chrono::Duration::hours(1))),
            Arc::new(Scripted(Mutex::new(script))),
            Arc::new(hasher),
            admin,
        )
    }

    #[test]
    fn successful_login_marks_session() {
        let gate = gate(vec!["AB12C"]);
        let (sid, created) = gate.ensure_session(None);
        assert!(created);
        assert_eq!(gate.require_authenticated(Some(&sid)), Err(AuthError::Unauthenticated));

        assert_eq!(gate.issue_challenge(&sid).unwrap(), "AB12C");
        let authed = gate.verify_login(&sid, "admin", "password123", "ab12c").unwrap();
        assert_eq!(gate.require_authenticated(Some(&authed)), Ok(()));
    }

    #[test]
    fn login_rotates_session_id() {
        let gate = gate(vec!["AB12C"]);
        let (sid, _) = gate.ensure_session(None);
        gate.issue_challenge(&sid).unwrap();
        let authed = gate.verify_login(&sid, "admin", "password123", "AB12C").unwrap();

        assert_ne!(authed, sid);
        assert_eq!(gate.require_authenticated(Some(&sid)), Err(AuthError::Unauthenticated));
    }

    #[test]
    fn challenge_is_single_use_even_on_success() {
        let gate = gate(vec!["AB12C"]);
        let (sid, _) = gate.ensure_session(None);
        gate.issue_challenge(&sid).unwrap();
        let authed = gate.verify_login(&sid, "admin", "password123", "AB12C").unwrap();
        assert_eq!(
            gate.verify_login(&authed, "admin", "password123", "AB12C"),
            Err(AuthError::InvalidCaptcha)
        );
    }

    #[test]
    fn challenge_is_consumed_by_failed_attempt() {
        let gate = gate(vec!["AB12C"]);
        let (sid, _) = gate.ensure_session(None);
        gate.issue_challenge(&sid).unwrap();

        assert_eq!(
            gate.verify_login(&sid, "admin", "wrong", "AB12C"),
            Err(AuthError::InvalidCredentials)
        );
        // Right password, replayed challenge.
        assert_eq!(
            gate.verify_login(&sid, "admin", "password123", "AB12C"),
            Err(AuthError::InvalidCaptcha)
        );
        assert!(gate.require_authenticated(Some(&sid)).is_err());
    }

    #[test]
    fn wrong_captcha_consumes_too() {
        let gate = gate(vec!["AB12C"]);
        let (sid, _) = gate.ensure_session(None);
        gate.issue_challenge(&sid).unwrap();
        assert_eq!(
            gate.verify_login(&sid, "admin", "password123", "XXXXX"),
            Err(AuthError::InvalidCaptcha)
        );
        assert_eq!(
            gate.verify_login(&sid, "admin", "password123", "AB12C"),
            Err(AuthError::InvalidCaptcha)
        );
    }

    #[test]
    fn reissuing_invalidates_previous_challenge() {
        let gate = gate(vec!["FIRST", "SECND"]);
        let (sid, _) = gate.ensure_session(None);
        gate.issue_challenge(&sid).unwrap();
        gate.issue_challenge(&sid).unwrap();
        assert_eq!(
            gate.verify_login(&sid, "admin", "password123", "FIRST"),
            Err(AuthError::InvalidCaptcha)
        );
    }

    #[test]
    fn unknown_user_is_generic_credentials_error() {
        let gate = gate(vec!["AB12C"]);
        let (sid, _) = gate.ensure_session(None);
        gate.issue_challenge(&sid).unwrap();
        assert_eq!(
            gate.verify_login(&sid, "root", "password123", "AB12C"),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn login_without_challenge_fails() {
        let gate = gate(vec![]);
        let (sid, _) = gate.ensure_session(None);
        assert_eq!(
            gate.verify_login(&sid, "admin", "password123", ""),
            Err(AuthError::InvalidCaptcha)
        );
    }

    #[test]
    fn logout_clears_authentication() {
        let gate = gate(vec!["AB12C"]);
        let (sid, _) = gate.ensure_session(None);
        gate.issue_challenge(&sid).unwrap();
        let authed = gate.verify_login(&sid, "admin", "password123", "AB12C").unwrap();

        gate.logout(&authed);
        assert_eq!(gate.require_authenticated(Some(&authed)), Err(AuthError::Unauthenticated));
        assert_eq!(gate.require_authenticated(None), Err(AuthError::Unauthenticated));

        // A stale cookie gets a fresh session.
        let (again, created) = gate.ensure_session(Some(&authed));
        assert!(created);
        assert_ne!(again, authed);
    }
}
