use axum::http::{HeaderMap, header};

use shelfkeeper_auth::{CookiePolicy, SessionId};

/// Session presented by the client for this request, if any.
///
/// Inserted by the session middleware for every route. The id has only been
/// shape-checked; whether it still names a live session is the gate's call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    session: Option<SessionId>,
}

impl SessionContext {
    pub fn new(session: Option<SessionId>) -> Self {
        Self { session }
    }

    pub fn from_headers(headers: &HeaderMap, policy: &CookiePolicy) -> Self {
        let session = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|raw| policy.read(raw))
            .and_then(SessionId::parse);
        Self { session }
    }

    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }
}
