use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, error};

use crate::backend::ChatBackend;
use crate::chat::view::ChatView;
use crate::errors::SyncError;
use crate::models::ChatMessage;

/// A render target for the chat log (floating widget, full-page panel).
pub trait ChatSink: Send + Sync {
    /// Replaces the sink's content. `html` is the escaped rendering of `view`.
    fn commit(&self, view: &ChatView, html: &str);

    /// Scrolls so the latest message is visible.
    fn scroll_to_bottom(&self);
}

/// The sinks present on the current page. Either, both or neither may exist.
#[derive(Clone, Default)]
pub struct ChatSinks {
    pub widget: Option<Arc<dyn ChatSink>>,
    pub page: Option<Arc<dyn ChatSink>>,
}

impl ChatSinks {
    pub fn has_page(&self) -> bool {
        self.page.is_some()
    }

    fn iter(&self) -> impl Iterator<Item = &dyn ChatSink> {
        self.widget.iter().chain(self.page.iter()).map(|s| s.as_ref())
    }
}

/// Renders `messages` into `sink`; a missing sink is a no-op.
pub fn render(sink: Option<&dyn ChatSink>, messages: &[ChatMessage]) -> Result<(), SyncError> {
    let Some(sink) = sink else { return Ok(()) };
    let view = ChatView::build(messages);
    let html = view.to_html()?;
    sink.commit(&view, &html);
    sink.scroll_to_bottom();
    Ok(())
}

struct Cached {
    messages: Vec<ChatMessage>,
    /// Ticket of the fetch that produced `messages`.
    ticket: u64,
}

struct StoreInner {
    backend: Arc<dyn ChatBackend>,
    sinks: ChatSinks,
    issued: AtomicU64,
    cache: Mutex<Cached>,
}

/// Last-known-good message list, replaced wholesale on every successful fetch.
#[derive(Clone)]
pub struct MessageStore {
    inner: Arc<StoreInner>,
}

impl MessageStore {
    pub fn new(backend: Arc<dyn ChatBackend>, sinks: ChatSinks) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                backend,
                sinks,
                issued: AtomicU64::new(0),
                cache: Mutex::new(Cached { messages: Vec::new(), ticket: 0 }),
            }),
        }
    }

    pub fn sinks(&self) -> &ChatSinks {
        &self.inner.sinks
    }

    /// Snapshot of the cached list.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock_cache().messages.clone()
    }

    /// Fetches the full list and renders it into every present sink.
    ///
    /// On failure the cache and the rendered sinks are left untouched.
    /// Returns `Ok(false)` when a newer fetch already landed and this
    /// response was discarded.
    pub async fn reload(&self) -> Result<bool, SyncError> {
        let ticket = self.inner.issued.fetch_add(1, Ordering::SeqCst) + 1;

        let messages = match self.inner.backend.fetch_messages().await {
            Ok(messages) => messages,
            Err(e) => {
                error!("Failed to fetch chat messages: {e}");
                return Err(e);
            }
        };

        let mut cache = self.lock_cache();
        if ticket < cache.ticket {
            debug!("Discarding stale message list (ticket {ticket} < {})", cache.ticket);
            return Ok(false);
        }
        cache.ticket = ticket;
        cache.messages = messages;
        self.render_all(&cache.messages)?;
        Ok(true)
    }

    fn render_all(&self, messages: &[ChatMessage]) -> Result<(), SyncError> {
        for sink in self.inner.sinks.iter() {
            render(Some(sink), messages)?;
        }
        Ok(())
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, Cached> {
        self.inner.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
