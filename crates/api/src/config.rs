//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Duration;

use shelfkeeper_auth::{AdminCredentials, Argon2PasswordHasher, CookiePolicy, PasswordHasher};
use shelfkeeper_store::StoreConfig;

const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_DATA_DIR: &str = "static";
const DEFAULT_ADMIN: &str = "admin";
const DEV_PASSWORD: &str = "password123";
const DEFAULT_SESSION_TTL_MINUTES: i64 = 720;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub store: StoreConfig,
    pub admin: AdminCredentials,
    pub session_ttl: Duration,
    /// Request body limit; also the per-entry limit for backup imports.
    pub max_upload_bytes: usize,
    pub cookie: CookiePolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind = get("SHELFKEEPER_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .context("SHELFKEEPER_BIND must be a socket address")?;

        let data_dir = PathBuf::from(get("SHELFKEEPER_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));

        let max_upload_bytes = match get("MAX_UPLOAD_BYTES") {
            Some(raw) => raw.parse::<usize>().context("MAX_UPLOAD_BYTES must be a byte count")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let ttl_minutes = match get("SESSION_TTL_MINUTES") {
            Some(raw) => raw.parse::<i64>().context("SESSION_TTL_MINUTES must be an integer")?,
            None => DEFAULT_SESSION_TTL_MINUTES,
        };
        if ttl_minutes <= 0 {
            anyhow::bail!("SESSION_TTL_MINUTES must be positive");
        }

        let secure = match get("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).context("COOKIE_SECURE must be true or false")?,
            None => true,
        };
        if !secure {
            tracing::warn!("COOKIE_SECURE=false; session cookie will be sent over plain HTTP");
        }

        let password_hash = match get("ADMIN_PASSWORD_HASH") {
            Some(hash) => {
                Argon2PasswordHasher::check_encoded(&hash)
                    .context("ADMIN_PASSWORD_HASH must be an argon2 PHC string")?;
                hash
            }
            None => {
                tracing::warn!("ADMIN_PASSWORD_HASH not set; using insecure dev default password");
                Argon2PasswordHasher::default()
                    .hash(DEV_PASSWORD)
                    .context("failed to hash dev default password")?
            }
        };

        Ok(Self {
            bind,
            store: StoreConfig::new(data_dir).with_max_entry_bytes(max_upload_bytes as u64),
            admin: AdminCredentials {
                username: get("ADMIN_USERNAME").unwrap_or_else(|| DEFAULT_ADMIN.to_string()),
                password_hash,
            },
            session_ttl: Duration::minutes(ttl_minutes),
            max_upload_bytes,
            cookie: CookiePolicy {
                secure,
                ..CookiePolicy::default()
            },
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind.to_string(), "0.0.0.0:8080");
        assert_eq!(cfg.store.data_dir, PathBuf::from("static"));
        assert_eq!(cfg.admin.username, "admin");
        assert!(Argon2PasswordHasher::default().verify(DEV_PASSWORD, &cfg.admin.password_hash));
        assert_eq!(cfg.session_ttl, Duration::minutes(720));
        assert_eq!(cfg.max_upload_bytes, 32 * 1024 * 1024);
        assert!(cfg.cookie.secure);
        assert!(cfg.cookie.http_only);
    }

    fn admin_hash() -> String {
        Argon2PasswordHasher::with_cost(8, 1, 1).unwrap().hash("s3cret").unwrap()
    }

    #[test]
    fn overrides() {
        let hash = admin_hash();
        let cfg = config(&[
            ("SHELFKEEPER_BIND", "127.0.0.1:9000"),
            ("SHELFKEEPER_DATA_DIR", "/srv/catalog"),
            ("ADMIN_USERNAME", "root"),
            ("ADMIN_PASSWORD_HASH", hash.as_str()),
            ("SESSION_TTL_MINUTES", "30"),
            ("MAX_UPLOAD_BYTES", "1024"),
            ("COOKIE_SECURE", "false"),
        ])
        .unwrap();
        assert_eq!(cfg.bind.port(), 9000);
        assert_eq!(cfg.store.data_dir, PathBuf::from("/srv/catalog"));
        assert_eq!(cfg.store.max_entry_bytes, 1024);
        assert_eq!(cfg.admin.username, "root");
        assert_eq!(cfg.admin.password_hash, hash);
        assert_eq!(cfg.session_ttl, Duration::minutes(30));
        assert!(!cfg.cookie.secure);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("SHELFKEEPER_BIND", "nope")]).is_err());
        assert!(config(&[("SESSION_TTL_MINUTES", "0")]).is_err());
        assert!(config(&[("MAX_UPLOAD_BYTES", "-1")]).is_err());
        assert!(config(&[("COOKIE_SECURE", "maybe")]).is_err());
        assert!(config(&[("ADMIN_PASSWORD_HASH", "sha256$1$00$00")]).is_err());
        assert!(config(&[("ADMIN_PASSWORD_HASH", "password123")]).is_err());
    }

    #[test]
    fn blank_values_are_unset() {
        let cfg = config(&[("ADMIN_USERNAME", "  ")]).unwrap();
        assert_eq!(cfg.admin.username, "admin");
    }
}
