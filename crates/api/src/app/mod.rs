//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store, backups, auth gate and challenge rendering
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: AppServices) -> Router {
    let auth_state = middleware::AuthState {
        gate: services.gate.clone(),
        cookie: services.cookie.clone(),
    };
    let body_limit = services.max_upload_bytes;
    let services = Arc::new(services);

    // Admin routes: require an authenticated session.
    let protected = routes::router().route_layer(axum::middleware::from_fn_with_state(
        auth_state.clone(),
        middleware::require_admin,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::public_router())
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    auth_state,
                    middleware::session_middleware,
                ))
                .layer(Extension(services))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
}
