use std::sync::Arc;

use axum::{extract::State, middleware::Next, response::Response};

use shelfkeeper_auth::{AuthGate, CookiePolicy};

use crate::app::errors;
use crate::context::SessionContext;

#[derive(Clone)]
pub struct AuthState {
    pub gate: Arc<AuthGate>,
    pub cookie: CookiePolicy,
}

/// Attach the presented session (if any) to every request.
pub async fn session_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let ctx = SessionContext::from_headers(req.headers(), &state.cookie);
    req.extensions_mut().insert(ctx);
    next.run(req).await
}

/// Reject requests without an authenticated admin session.
pub async fn require_admin(
    State(state): State<AuthState>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let ctx = match req.extensions().get::<SessionContext>() {
        Some(ctx) => ctx.clone(),
        None => SessionContext::from_headers(req.headers(), &state.cookie),
    };

    if let Err(e) = state.gate.require_authenticated(ctx.session()) {
        tracing::debug!(path = %req.uri().path(), "unauthenticated request rejected");
        return errors::auth_error_to_response(e);
    }

    next.run(req).await
}
