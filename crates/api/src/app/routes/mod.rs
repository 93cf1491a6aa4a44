use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod backup;
pub mod brands;
pub mod categories;
pub mod common;
pub mod products;
pub mod storefront;
pub mod system;

/// Endpoints reachable without a session.
pub fn public_router() -> Router {
    Router::new()
        .route("/captcha", get(auth::captcha))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/storefront", get(storefront::storefront))
        .route("/uploads/:file", get(storefront::asset))
}

/// Router for all admin endpoints (wrapped in the session guard by the caller).
pub fn router() -> Router {
    Router::new()
        .route("/dashboard", get(storefront::dashboard))
        .nest("/brands", brands::router())
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .route("/download", get(backup::download))
        .route("/upload", post(backup::upload))
}
