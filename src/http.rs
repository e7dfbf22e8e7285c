use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, StatusCode, Url};
use reqwest_eventsource::{Event, EventSource};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::backend::{CartBackend, ChatBackend, EventStream, SuggestBackend};
use crate::config::Config;
use crate::csrf::{token_from_cookies, CSRF_HEADER};
use crate::errors::SyncError;
use crate::models::{
    BotAck, BotRequest, BotResponse, CartEnvelope, CartSnapshot, ChatMessage, MessagesEnvelope,
    SendAck, SendResponse, SuggestEnvelope,
};

const MESSAGES_PATH: &str = "/chat/messages/";
const STREAM_PATH: &str = "/chat/stream/";
const SEND_PATH: &str = "/chat/send/";
const BOT_PATH: &str = "/chat/bot/";

/// Talks to the storefront backend over HTTP with the page's session cookie.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    csrf_token: Option<String>,
    streaming: bool,
    suggest_url: String,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self, SyncError> {
        let base_url = Url::parse(&format!("{}/", config.base_url.trim_end_matches('/')))
            .map_err(|e| SyncError::InvalidConfig {
                key: "STOREFRONT_BASE_URL".to_string(),
                message: e.to_string(),
            })?;

        let mut headers = HeaderMap::new();
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        if !config.cookie.is_empty() {
            let cookie = HeaderValue::from_str(&config.cookie).map_err(|e| SyncError::InvalidConfig {
                key: "STOREFRONT_COOKIE".to_string(),
                message: e.to_string(),
            })?;
            headers.insert(COOKIE, cookie);
        }

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url,
            csrf_token: token_from_cookies(&config.cookie),
            streaming: config.streaming,
            suggest_url: config.suggest_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a path or absolute URL against the backend origin.
    fn url(&self, path: &str) -> Result<Url, SyncError> {
        self.base_url
            .join(path)
            .map_err(|e| SyncError::transport(format!("Invalid URL '{path}': {e}")))
    }

    fn post(&self, url: Url) -> reqwest::RequestBuilder {
        let request = self.client.post(url);
        match &self.csrf_token {
            Some(token) => request.header(CSRF_HEADER, token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, SyncError> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(SyncError::Status { status: resp.status().as_u16() });
        }
        Ok(resp.json::<T>().await?)
    }
}

/// Decodes a JSON body regardless of status so server error fields survive.
async fn read_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<(StatusCode, T), SyncError> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    match serde_json::from_slice::<T>(&bytes) {
        Ok(body) => Ok((status, body)),
        Err(_) if !status.is_success() => Err(SyncError::Status { status: status.as_u16() }),
        Err(e) => Err(SyncError::malformed(format!("invalid JSON: {e}"))),
    }
}

/// A 2xx with `status: "ok"` and no error text is the only success shape
/// for chat writes.
fn ensure_ok(status: StatusCode, body_status: Option<&str>, error: Option<String>) -> Result<(), SyncError> {
    let error = error.filter(|e| !e.trim().is_empty());
    if error.is_some() {
        return Err(SyncError::Rejected { message: error });
    }
    if status.is_success() && body_status == Some("ok") {
        return Ok(());
    }
    if !status.is_success() {
        return Err(SyncError::Status { status: status.as_u16() });
    }
    Err(SyncError::Rejected { message: None })
}

fn into_snapshot(envelope: CartEnvelope) -> Result<CartSnapshot, SyncError> {
    let items = envelope
        .items
        .ok_or_else(|| SyncError::malformed("cart response has no items array"))?;
    Ok(CartSnapshot {
        items,
        total: envelope.total,
        removed_unavailable: envelope.removed_unavailable,
    })
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn fetch_messages(&self) -> Result<Vec<ChatMessage>, SyncError> {
        let envelope: MessagesEnvelope = self.get_json(self.url(MESSAGES_PATH)?).await?;
        envelope
            .messages
            .ok_or_else(|| SyncError::malformed("messages field missing"))
    }

    async fn send_message(&self, text: &str) -> Result<SendAck, SyncError> {
        let resp = self
            .post(self.url(SEND_PATH)?)
            .form(&[("message", text)])
            .send()
            .await?;
        let (status, body): (_, SendResponse) = read_body(resp).await?;
        ensure_ok(status, body.status.as_deref(), body.error)?;
        Ok(SendAck { message_id: body.message_id })
    }

    async fn request_bot_reply(&self, request: &BotRequest) -> Result<BotAck, SyncError> {
        let resp = self
            .post(self.url(BOT_PATH)?)
            .form(&[request.form_field()])
            .send()
            .await?;
        let (status, body): (_, BotResponse) = read_body(resp).await?;
        ensure_ok(status, body.status.as_deref(), body.error)?;
        Ok(BotAck { handoff: body.handoff })
    }

    async fn subscribe(&self) -> Result<EventStream, SyncError> {
        let request = self.client.get(self.url(STREAM_PATH)?);
        let source = EventSource::new(request).map_err(|e| SyncError::transport(e.to_string()))?;

        let events = futures_util::stream::unfold(Some(source), |state| async move {
            let mut source = state?;
            loop {
                match source.next().await {
                    Some(Ok(Event::Open)) => debug!("Live channel opened"),
                    Some(Ok(Event::Message(message))) => return Some((Ok(message.data), Some(source))),
                    Some(Err(e)) => {
                        source.close();
                        return Some((Err(SyncError::transport(e.to_string())), None));
                    }
                    None => return None,
                }
            }
        });
        Ok(events.boxed())
    }

    fn supports_streaming(&self) -> bool {
        self.streaming
    }
}

#[async_trait]
impl CartBackend for HttpBackend {
    async fn preview(&self, url: &str) -> Result<CartSnapshot, SyncError> {
        let envelope: CartEnvelope = self.get_json(self.url(url)?).await?;
        into_snapshot(envelope)
    }

    async fn remove(&self, url: &str, product_id: &str) -> Result<CartSnapshot, SyncError> {
        let resp = self
            .post(self.url(url)?)
            .form(&[("product_id", product_id)])
            .send()
            .await?;
        let (status, envelope): (_, CartEnvelope) = read_body(resp).await?;
        if !status.is_success() {
            return Err(SyncError::Status { status: status.as_u16() });
        }
        into_snapshot(envelope)
    }
}

#[async_trait]
impl SuggestBackend for HttpBackend {
    async fn suggestions(&self, query: &str) -> Result<Vec<String>, SyncError> {
        let mut url = self.url(&self.suggest_url)?;
        url.query_pairs_mut().append_pair("q", query);
        let envelope: SuggestEnvelope = self.get_json(url).await?;
        Ok(envelope.suggestions)
    }
}
