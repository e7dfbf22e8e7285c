use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Server identifier that may arrive as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Uint(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Identifier(n.to_string()),
            Raw::Uint(n) => Identifier(n.to_string()),
            Raw::Text(s) => Identifier(s),
        })
    }
}

// ── Chat ─────────────────────────────────────────────────────────────────────

/// One chat line as returned by `GET /chat/messages/`. Identity is positional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub text: String,
    /// Already display-formatted by the server.
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagesEnvelope {
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
}

/// Payload of one live-channel event.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamNotice {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

pub const NEW_MESSAGE_NOTICE: &str = "new_message";

/// Body of `POST /chat/send/`.
#[derive(Debug, Clone, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message_id: Option<Identifier>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /chat/bot/`.
#[derive(Debug, Clone, Deserialize)]
pub struct BotResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub handoff: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Acknowledgement of a stored user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendAck {
    pub message_id: Option<Identifier>,
}

/// What the bot endpoint is asked to answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotRequest {
    /// Reference to an already stored message; the server must not store it again.
    ById(Identifier),
    /// Raw text, used only when the send step returned no identifier.
    ByText(String),
}

impl BotRequest {
    pub fn form_field(&self) -> (&'static str, &str) {
        match self {
            BotRequest::ById(id) => ("message_id", id.as_str()),
            BotRequest::ByText(text) => ("message", text.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotAck {
    pub handoff: bool,
}

// ── Cart ─────────────────────────────────────────────────────────────────────

/// A cart line. Numeric fields stay raw JSON so garbage renders instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: Identifier,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: Value,
    #[serde(default)]
    pub unit_price: Value,
    #[serde(default)]
    pub total_price: Value,
    #[serde(default = "available_by_default")]
    pub is_available: bool,
    #[serde(default)]
    pub removed: bool,
}

fn available_by_default() -> bool {
    true
}

/// Preview and remove responses share this shape.
#[derive(Debug, Clone, Deserialize)]
pub struct CartEnvelope {
    #[serde(default)]
    pub items: Option<Vec<CartItem>>,
    #[serde(default)]
    pub total: Value,
    #[serde(default)]
    pub removed_unavailable: Vec<String>,
}

/// Authoritative server-side cart state after a fetch or mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub total: Value,
    /// Names the server dropped since the cart was last materialized.
    pub removed_unavailable: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestEnvelope {
    #[serde(default)]
    pub suggestions: Vec<String>,
}
