use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::backend::ChatBackend;
use crate::chat::store::MessageStore;
use crate::errors::SyncError;
use crate::models::BotRequest;

pub const HANDOFF_TITLE: &str = "پیام پشتیبانی";
pub const HANDOFF_BODY: &str = "سؤال شما برای پشتیبان ارسال شد.";

/// The form a message is submitted from.
pub trait ChatForm: Send + Sync {
    /// Disables the submit control and marks it busy, or restores it.
    fn set_submit_busy(&self, busy: bool);
    fn clear_input(&self);
    fn focus_input(&self);
    /// Shows a user-visible error for a failed send.
    fn show_error(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
    Granted,
    Denied,
    /// Not decided yet; asking is allowed.
    Default,
    Unsupported,
}

/// Desktop notifications, best effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn permission(&self) -> NotificationPermission;
    async fn request_permission(&self) -> NotificationPermission;
    fn show(&self, title: &str, body: &str);
}

/// Shows a notification if allowed, asking first when undecided.
/// Returns whether one was shown.
pub async fn notify_best_effort(notifier: &dyn Notifier, title: &str, body: &str) -> bool {
    let permission = match notifier.permission() {
        NotificationPermission::Default => notifier.request_permission().await,
        other => other,
    };
    if permission == NotificationPermission::Granted {
        notifier.show(title, body);
        true
    } else {
        debug!("Skipping notification ({permission:?})");
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Sending,
    AwaitingBotReply,
}

impl PipelineState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => PipelineState::Sending,
            2 => PipelineState::AwaitingBotReply,
            _ => PipelineState::Idle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Both steps succeeded.
    Delivered { handoff: bool },
    /// Empty input or a send already in flight; nothing was requested.
    Ignored,
}

/// Two-step send: store the user's message, then ask for a bot reply.
#[derive(Clone)]
pub struct SendPipeline {
    backend: Arc<dyn ChatBackend>,
    store: MessageStore,
    notifier: Option<Arc<dyn Notifier>>,
    authenticated: bool,
    login_url: String,
    state: Arc<AtomicU8>,
}

impl SendPipeline {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        store: MessageStore,
        notifier: Option<Arc<dyn Notifier>>,
        authenticated: bool,
        login_url: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            store,
            notifier,
            authenticated,
            login_url: login_url.into(),
            state: Arc::new(AtomicU8::new(PipelineState::Idle as u8)),
        }
    }

    pub fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: PipelineState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    /// Submits `text` from `form`.
    ///
    /// The submit control stays disabled across both steps; the input is
    /// cleared as soon as the message itself is stored. Any failure aborts
    /// the rest, is shown on the form and returned.
    pub async fn submit(&self, text: &str, form: &dyn ChatForm) -> Result<SendOutcome, SyncError> {
        if !self.authenticated {
            return Err(SyncError::AuthRequired { login_url: self.login_url.clone() });
        }
        let text = text.trim();
        if text.is_empty() {
            return Ok(SendOutcome::Ignored);
        }

        // The control is a mutex substitute: only an idle pipeline may claim it.
        if self
            .state
            .compare_exchange(
                PipelineState::Idle as u8,
                PipelineState::Sending as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            debug!("Send already in progress; ignoring submit");
            return Ok(SendOutcome::Ignored);
        }
        form.set_submit_busy(true);

        let result = self.run(text, form).await;

        if let Err(e) = &result {
            error!("Chat send failed: {e}");
            form.show_error(&e.user_message());
        }
        self.set_state(PipelineState::Idle);
        form.set_submit_busy(false);
        form.focus_input();
        result
    }

    async fn run(&self, text: &str, form: &dyn ChatForm) -> Result<SendOutcome, SyncError> {
        let ack = self.backend.send_message(text).await?;
        form.clear_input();
        form.focus_input();
        let store = self.store.clone();
        tokio::spawn(async move {
            let _ = store.reload().await;
        });

        // A zero or empty id counts as missing.
        let request = match ack.message_id {
            Some(id) if !matches!(id.as_str(), "" | "0") => BotRequest::ById(id),
            _ => BotRequest::ByText(text.to_string()),
        };
        self.set_state(PipelineState::AwaitingBotReply);
        let reply = self.backend.request_bot_reply(&request).await?;
        let _ = self.store.reload().await;

        if reply.handoff {
            info!("Chat escalated to a human operator");
            if let Some(notifier) = &self.notifier {
                notify_best_effort(notifier.as_ref(), HANDOFF_TITLE, HANDOFF_BODY).await;
            }
        }
        Ok(SendOutcome::Delivered { handoff: reply.handoff })
    }
}
