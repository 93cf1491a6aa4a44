//! HTTP boundary for the catalog admin: routing, sessions and request mapping.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;

pub use app::{build_app, AppServices};
pub use config::AppConfig;
