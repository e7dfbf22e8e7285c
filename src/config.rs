use std::time::Duration;

use crate::errors::SyncError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_SUGGEST_DEBOUNCE: Duration = Duration::from_millis(200);

/// Runtime settings for the storefront sync client.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    /// Raw `Cookie` header forwarded on every request (session + `csrftoken`).
    pub cookie: String,
    /// Server-rendered authentication flag.
    pub authenticated: bool,
    /// Whether the environment offers a live update channel.
    pub streaming: bool,
    pub poll_interval: Duration,
    pub login_url: String,
    pub cart_preview_url: String,
    pub cart_remove_url: String,
    pub suggest_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            cookie: String::new(),
            authenticated: false,
            streaming: true,
            poll_interval: DEFAULT_POLL_INTERVAL,
            login_url: "/login/".to_string(),
            cart_preview_url: "/cart/preview/".to_string(),
            cart_remove_url: "/cart/remove/".to_string(),
            suggest_url: "/shop/suggest/".to_string(),
        }
    }
}

impl Config {
    /// Reads `STOREFRONT_*` variables, falling back to defaults for unset ones.
    pub fn from_env() -> Result<Self, SyncError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SyncError> {
        let defaults = Self::default();
        let text = |key: &str, default: String| lookup(key).unwrap_or(default);

        let poll_interval = match lookup("STOREFRONT_POLL_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|e| SyncError::InvalidConfig {
                    key: "STOREFRONT_POLL_INTERVAL_SECS".to_string(),
                    message: format!("{e}"),
                })?;
                if secs == 0 {
                    return Err(SyncError::InvalidConfig {
                        key: "STOREFRONT_POLL_INTERVAL_SECS".to_string(),
                        message: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => defaults.poll_interval,
        };

        Ok(Self {
            base_url: text("STOREFRONT_BASE_URL", defaults.base_url)
                .trim_end_matches('/')
                .to_string(),
            cookie: text("STOREFRONT_COOKIE", defaults.cookie),
            authenticated: parse_flag(
                "STOREFRONT_AUTHENTICATED",
                lookup("STOREFRONT_AUTHENTICATED"),
                defaults.authenticated,
            )?,
            streaming: parse_flag("STOREFRONT_STREAMING", lookup("STOREFRONT_STREAMING"), defaults.streaming)?,
            poll_interval,
            login_url: text("STOREFRONT_LOGIN_URL", defaults.login_url),
            cart_preview_url: text("STOREFRONT_CART_PREVIEW_URL", defaults.cart_preview_url),
            cart_remove_url: text("STOREFRONT_CART_REMOVE_URL", defaults.cart_remove_url),
            suggest_url: text("STOREFRONT_SUGGEST_URL", defaults.suggest_url),
        })
    }
}

/// Accepts the same spellings a template renders for a boolean data attribute.
fn parse_flag(key: &str, raw: Option<String>, default: bool) -> Result<bool, SyncError> {
    let Some(raw) = raw else { return Ok(default) };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(SyncError::InvalidConfig {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}
