//! `shelfkeeper-auth`: admin session gate.
//!
//! This crate is intentionally decoupled from HTTP and from the catalog data:
//! it only knows sessions, challenges and the admin credential.

pub mod challenge;
pub mod cookie;
pub mod gate;
pub mod password;
pub mod session;

pub use challenge::{ChallengeGenerator, RandomChallenge};
pub use cookie::{CookiePolicy, SameSite};
pub use gate::{AdminCredentials, AuthError, AuthGate};
pub use password::{Argon2PasswordHasher, PasswordHashError, PasswordHasher};
pub use session::{InMemorySessionStore, SessionId, SessionState, SessionStore};
