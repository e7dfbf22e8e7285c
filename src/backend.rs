//! Seams between the sync controllers and the storefront backend.
//!
//! Controllers only ever talk to these traits; [`crate::http::HttpBackend`]
//! implements all of them over HTTP.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::errors::SyncError;
use crate::models::{BotAck, BotRequest, CartSnapshot, ChatMessage, SendAck};

/// Raw `data` payloads of the live channel. An `Err` item or the end of the
/// stream both mean the channel is gone.
pub type EventStream = BoxStream<'static, Result<String, SyncError>>;

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// `GET /chat/messages/`: the full ordered message list.
    async fn fetch_messages(&self) -> Result<Vec<ChatMessage>, SyncError>;

    /// `POST /chat/send/`: stores the user's message.
    async fn send_message(&self, text: &str) -> Result<SendAck, SyncError>;

    /// `POST /chat/bot/`: asks for an automated reply.
    async fn request_bot_reply(&self, request: &BotRequest) -> Result<BotAck, SyncError>;

    /// `GET /chat/stream/`: opens the live update channel.
    async fn subscribe(&self) -> Result<EventStream, SyncError>;

    /// Whether a live channel can be opened at all in this environment.
    fn supports_streaming(&self) -> bool {
        true
    }
}

#[async_trait]
pub trait CartBackend: Send + Sync {
    async fn preview(&self, url: &str) -> Result<CartSnapshot, SyncError>;

    async fn remove(&self, url: &str, product_id: &str) -> Result<CartSnapshot, SyncError>;
}

#[async_trait]
pub trait SuggestBackend: Send + Sync {
    async fn suggestions(&self, query: &str) -> Result<Vec<String>, SyncError>;
}
