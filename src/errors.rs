use thiserror::Error;

/// Generic text shown to the user when sending a chat message fails.
pub const SEND_FAILED_TEXT: &str = "خطا در ارسال پیام.";

/// Prompt shown before redirecting an anonymous user to the login page.
pub const AUTH_REQUIRED_TEXT: &str = "برای استفاده از چت باید وارد حساب شوید.";

/// Top-level error for every sync controller.
/// Nothing here is fatal to the page: callers degrade to stale state.
#[derive(Debug, Error)]
pub enum SyncError {
    // ── Local refusals ───────────────────────────────────────────────────────
    #[error("Authentication required; sign in at {login_url}")]
    AuthRequired { login_url: String },

    // ── Transport errors ─────────────────────────────────────────────────────
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Transport failure: {message}")]
    Transport { message: String },

    #[error("Server error: HTTP {status}")]
    Status { status: u16 },

    // ── Payload errors ───────────────────────────────────────────────────────
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("Request rejected by server: {}", message.as_deref().unwrap_or("no reason given"))]
    Rejected { message: Option<String> },

    #[error("Template error: {0}")]
    Render(#[from] askama::Error),

    // ── Configuration errors ─────────────────────────────────────────────────
    #[error("Invalid configuration for {key}: {message}")]
    InvalidConfig { key: String, message: String },
}

impl SyncError {
    pub fn transport(message: impl Into<String>) -> Self {
        SyncError::Transport { message: message.into() }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        SyncError::MalformedResponse { message: message.into() }
    }

    pub fn is_auth_required(&self) -> bool {
        matches!(self, SyncError::AuthRequired { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SyncError::Network(_) | SyncError::Transport { .. } | SyncError::Status { .. }
        )
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, SyncError::MalformedResponse { .. })
    }

    /// Text suitable for a user-facing alert after a failed user action.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::AuthRequired { .. } => AUTH_REQUIRED_TEXT.to_string(),
            SyncError::Rejected { message: Some(message) } if !message.trim().is_empty() => {
                message.clone()
            }
            _ => SEND_FAILED_TEXT.to_string(),
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::malformed(err.to_string())
        } else if let Some(status) = err.status() {
            SyncError::Status { status: status.as_u16() }
        } else {
            SyncError::Network(err)
        }
    }
}
