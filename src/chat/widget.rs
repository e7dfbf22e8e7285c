use std::sync::Arc;

use crate::backend::ChatBackend;
use crate::chat::feed::{ConnectionState, FeedController};
use crate::chat::send::{ChatForm, Notifier, SendOutcome, SendPipeline};
use crate::chat::store::{ChatSinks, MessageStore};
use crate::config::Config;
use crate::errors::SyncError;

/// The floating chat panel and its toggle button.
pub trait WidgetPanel: Send + Sync {
    fn set_open(&self, open: bool);
    fn focus_input(&self);
}

/// Support chat as mounted on one page: store, realtime feed and send
/// pipeline sharing one backend.
pub struct SupportChat {
    store: MessageStore,
    feed: FeedController,
    pipeline: SendPipeline,
    panel: Option<Arc<dyn WidgetPanel>>,
    authenticated: bool,
    login_url: String,
}

impl SupportChat {
    pub fn new(
        config: &Config,
        backend: Arc<dyn ChatBackend>,
        sinks: ChatSinks,
        panel: Option<Arc<dyn WidgetPanel>>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        let store = MessageStore::new(backend.clone(), sinks);
        let feed = FeedController::new(
            backend.clone(),
            store.clone(),
            config.authenticated,
            config.poll_interval,
            config.login_url.clone(),
        );
        let pipeline = SendPipeline::new(
            backend,
            store.clone(),
            notifier,
            config.authenticated,
            config.login_url.clone(),
        );
        Self {
            store,
            feed,
            pipeline,
            panel,
            authenticated: config.authenticated,
            login_url: config.login_url.clone(),
        }
    }

    /// Page load: a full-page chat starts updating right away for signed-in users.
    pub async fn mount(&self) -> Result<(), SyncError> {
        if self.authenticated && self.store.sinks().has_page() {
            self.feed.start().await?;
        }
        Ok(())
    }

    pub async fn open_widget(&self) -> Result<(), SyncError> {
        if !self.authenticated {
            return Err(SyncError::AuthRequired { login_url: self.login_url.clone() });
        }
        if let Some(panel) = &self.panel {
            panel.set_open(true);
        }
        self.feed.start().await?;
        if let Some(panel) = &self.panel {
            panel.focus_input();
        }
        Ok(())
    }

    /// Hides the widget. Updates keep running while a full-page chat is shown.
    pub fn close_widget(&self) {
        if let Some(panel) = &self.panel {
            panel.set_open(false);
        }
        if !self.store.sinks().has_page() {
            self.feed.stop();
        }
    }

    pub async fn submit(&self, text: &str, form: &dyn ChatForm) -> Result<SendOutcome, SyncError> {
        self.pipeline.submit(text, form).await
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.feed.state()
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn pipeline(&self) -> &SendPipeline {
        &self.pipeline
    }

    /// Page unload.
    pub fn teardown(&self) {
        self.feed.stop();
    }
}
