//! Session cookie attributes and header (de)serialization.

use chrono::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Attributes of the session cookie: `HttpOnly`, `Secure`, `SameSite=Lax`
/// unless configured otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    pub name: String,
    pub path: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub max_age: Option<Duration>,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            name: "shelfkeeper_session".to_string(),
            path: "/".to_string(),
            http_only: true,
            secure: true,
            same_site: SameSite::Lax,
            max_age: None,
        }
    }
}

impl CookiePolicy {
    /// `Set-Cookie` value carrying `value`.
    pub fn set_cookie(&self, value: &str) -> String {
        let mut out = format!("{}={}; Path={}", self.name, value, self.path);
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={}", max_age.num_seconds()));
        }
        self.push_flags(&mut out);
        out
    }

    /// `Set-Cookie` value that makes the client drop the cookie.
    pub fn clear_cookie(&self) -> String {
        let mut out = format!("{}=; Path={}; Max-Age=0", self.name, self.path);
        self.push_flags(&mut out);
        out
    }

    fn push_flags(&self, out: &mut String) {
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        out.push_str("; SameSite=");
        out.push_str(self.same_site.as_str());
    }

    /// Find this policy's cookie in a `Cookie` request header.
    pub fn read<'a>(&self, cookie_header: &'a str) -> Option<&'a str> {
        cookie_header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.name)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }
}
