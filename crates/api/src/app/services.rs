//! Service wiring: store, backups and the auth gate behind one handle.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Context;
use rand::Rng;

use shelfkeeper_auth::{
    Argon2PasswordHasher, AuthGate, ChallengeGenerator, CookiePolicy, InMemorySessionStore, RandomChallenge,
};
use shelfkeeper_store::{BackupBundler, CatalogStore};

use crate::config::AppConfig;

/// A challenge rendered for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChallenge {
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Turns challenge text into something a human can read and a script cannot.
pub trait ChallengeRenderer: Send + Sync {
    fn render(&self, text: &str) -> RenderedChallenge;
}

/// Renders the text verbatim. Useful for tests and accessibility fallbacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextChallenge;

impl ChallengeRenderer for PlainTextChallenge {
    fn render(&self, text: &str) -> RenderedChallenge {
        RenderedChallenge {
            content_type: "text/plain; charset=utf-8",
            body: text.as_bytes().to_vec(),
        }
    }
}

/// SVG with jittered, rotated glyphs over a few noise strokes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgChallenge;

const GLYPH_WIDTH: i32 = 26;
const HEIGHT: i32 = 56;

impl ChallengeRenderer for SvgChallenge {
    fn render(&self, text: &str) -> RenderedChallenge {
        let mut rng = rand::rng();
        let width = 20 + GLYPH_WIDTH * text.chars().count() as i32;

        let mut svg = format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{HEIGHT}" viewBox="0 0 {width} {HEIGHT}"><rect width="100%" height="100%" fill="#f4f4f4"/>"##
        );
        for _ in 0..4 {
            let _ = write!(
                svg,
                r##"<line x1="0" y1="{}" x2="{width}" y2="{}" stroke="#999" stroke-width="1.5"/>"##,
                rng.random_range(5..HEIGHT - 5),
                rng.random_range(5..HEIGHT - 5),
            );
        }
        for (i, ch) in text.chars().enumerate() {
            let x = 14 + GLYPH_WIDTH * i as i32;
            let y = rng.random_range(34..44);
            let angle = rng.random_range(-25..=25);
            let _ = write!(
                svg,
                r##"<text x="{x}" y="{y}" transform="rotate({angle} {x} {y})" font-family="monospace" font-size="28" fill="#333">{}</text>"##,
                escape_xml(ch),
            );
        }
        svg.push_str("</svg>");

        RenderedChallenge {
            content_type: "image/svg+xml",
            body: svg.into_bytes(),
        }
    }
}

fn escape_xml(ch: char) -> String {
    match ch {
        '&' => "&amp;".to_string(),
        '<' => "&lt;".to_string(),
        '>' => "&gt;".to_string(),
        '"' => "&quot;".to_string(),
        c => c.to_string(),
    }
}

/// Everything a handler needs, shared via an `Extension`.
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogStore>,
    pub backups: Arc<BackupBundler>,
    pub gate: Arc<AuthGate>,
    pub renderer: Arc<dyn ChallengeRenderer>,
    pub cookie: CookiePolicy,
    pub max_upload_bytes: usize,
}

impl AppServices {
    /// Production wiring: random challenges rendered as SVG.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        Self::with_challenges(config, Arc::new(RandomChallenge::default()), Arc::new(SvgChallenge))
    }

    pub fn with_challenges(
        config: &AppConfig,
        challenges: Arc<dyn ChallengeGenerator>,
        renderer: Arc<dyn ChallengeRenderer>,
    ) -> anyhow::Result<Self> {
        let catalog = Arc::new(
            CatalogStore::open(&config.store)
                .with_context(|| format!("failed to open catalog in {}", config.store.data_dir.display()))?,
        );
        let backups = Arc::new(BackupBundler::new(catalog.clone(), &config.store));

        let gate = Arc::new(AuthGate::new(
            Arc::new(InMemorySessionStore::new(config.session_ttl)),
            challenges,
            Arc::new(Argon2PasswordHasher::default()),
            config.admin.clone(),
        ));

        Ok(Self {
            catalog,
            backups,
            gate,
            renderer,
            cookie: config.cookie.clone(),
            max_upload_bytes: config.max_upload_bytes,
        })
    }
}
