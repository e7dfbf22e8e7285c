#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::json;
use tokio::sync::{mpsc, Notify};

use storefront_sync::cart::{CartDrawer, PageHost, ToggleControl};
use storefront_sync::chat::view::ChatView;
use storefront_sync::chat::{ChatForm, ChatSink, NotificationPermission, Notifier};
use storefront_sync::models::{BotAck, BotRequest, CartItem, CartSnapshot, ChatMessage, Identifier, SendAck};
use storefront_sync::{CartBackend, ChatBackend, EventStream, SuggestBackend, SyncError};

/// Lets spawned tasks run; under a paused clock the sleep auto-advances.
pub async fn settle() {
    for _ in 0..5 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

pub fn message(sender: &str, text: &str) -> ChatMessage {
    ChatMessage {
        sender: sender.to_string(),
        text: text.to_string(),
        created_at: "۱۰:۳۰".to_string(),
        is_admin: sender == "پشتیبان",
    }
}

pub fn cart_item(id: i64, name: &str, total: i64) -> CartItem {
    CartItem {
        id: Identifier::from(id),
        name: name.to_string(),
        quantity: json!(1),
        unit_price: json!(total),
        total_price: json!(total),
        is_available: true,
        removed: false,
    }
}

pub fn snapshot(items: Vec<CartItem>, total: i64, removed: &[&str]) -> CartSnapshot {
    CartSnapshot {
        items,
        total: json!(total),
        removed_unavailable: removed.iter().map(|s| s.to_string()).collect(),
    }
}

// ── Chat backend ──────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeChatBackend {
    pub messages: Mutex<Vec<ChatMessage>>,
    /// Scripted fetch results, consumed before falling back to `messages`.
    pub fetch_script: Mutex<VecDeque<(Duration, Result<Vec<ChatMessage>, SyncError>)>>,
    pub fail_fetch: AtomicBool,
    pub fetch_calls: AtomicUsize,

    pub send_results: Mutex<VecDeque<Result<SendAck, SyncError>>>,
    pub send_calls: Mutex<Vec<String>>,
    /// When set, `send_message` waits for a notification before answering.
    pub send_gate: Option<Arc<Notify>>,

    pub bot_results: Mutex<VecDeque<Result<BotAck, SyncError>>>,
    pub bot_calls: Mutex<Vec<BotRequest>>,

    pub streaming: bool,
    pub subscribe_fails: bool,
    pub subscribe_calls: AtomicUsize,
    pub stream_tx: Mutex<Option<mpsc::UnboundedSender<Result<String, SyncError>>>>,
}

impl FakeChatBackend {
    pub fn streaming() -> Self {
        Self { streaming: true, ..Self::default() }
    }

    pub fn polling() -> Self {
        Self { streaming: false, ..Self::default() }
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Pushes one event onto the currently open live channel.
    pub fn push_event(&self, event: Result<String, SyncError>) {
        let tx = self.stream_tx.lock().unwrap();
        tx.as_ref().expect("no live channel open").send(event).unwrap();
    }

    pub fn script_fetch(&self, delay: Duration, result: Result<Vec<ChatMessage>, SyncError>) {
        self.fetch_script.lock().unwrap().push_back((delay, result));
    }
}

#[async_trait]
impl ChatBackend for FakeChatBackend {
    async fn fetch_messages(&self) -> Result<Vec<ChatMessage>, SyncError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.fetch_script.lock().unwrap().pop_front();
        if let Some((delay, result)) = scripted {
            tokio::time::sleep(delay).await;
            return result;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(SyncError::transport("connection reset"));
        }
        Ok(self.messages.lock().unwrap().clone())
    }

    async fn send_message(&self, text: &str) -> Result<SendAck, SyncError> {
        self.send_calls.lock().unwrap().push(text.to_string());
        if let Some(gate) = &self.send_gate {
            gate.notified().await;
        }
        self.send_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(SendAck { message_id: Some(Identifier::from(1)) }))
    }

    async fn request_bot_reply(&self, request: &BotRequest) -> Result<BotAck, SyncError> {
        self.bot_calls.lock().unwrap().push(request.clone());
        self.bot_results.lock().unwrap().pop_front().unwrap_or(Ok(BotAck { handoff: false }))
    }

    async fn subscribe(&self) -> Result<EventStream, SyncError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        if self.subscribe_fails {
            return Err(SyncError::Status { status: 503 });
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.stream_tx.lock().unwrap() = Some(tx);
        let events = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });
        Ok(events.boxed())
    }

    fn supports_streaming(&self) -> bool {
        self.streaming
    }
}

// ── Chat host ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub commits: Mutex<Vec<String>>,
    pub views: Mutex<Vec<ChatView>>,
    pub scrolls: AtomicUsize,
}

impl RecordingSink {
    pub fn last_html(&self) -> Option<String> {
        self.commits.lock().unwrap().last().cloned()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.lock().unwrap().len()
    }
}

impl ChatSink for RecordingSink {
    fn commit(&self, view: &ChatView, html: &str) {
        self.views.lock().unwrap().push(view.clone());
        self.commits.lock().unwrap().push(html.to_string());
    }

    fn scroll_to_bottom(&self) {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct RecordingForm {
    pub busy_events: Mutex<Vec<bool>>,
    pub cleared: AtomicUsize,
    pub focused: AtomicUsize,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingForm {
    pub fn busy(&self) -> bool {
        self.busy_events.lock().unwrap().last().copied().unwrap_or(false)
    }
}

impl ChatForm for RecordingForm {
    fn set_submit_busy(&self, busy: bool) {
        self.busy_events.lock().unwrap().push(busy);
    }

    fn clear_input(&self) {
        self.cleared.fetch_add(1, Ordering::SeqCst);
    }

    fn focus_input(&self) {
        self.focused.fetch_add(1, Ordering::SeqCst);
    }

    fn show_error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

pub struct FakeNotifier {
    pub permission: Mutex<NotificationPermission>,
    /// Answer given when permission is requested.
    pub grant_on_request: NotificationPermission,
    pub requests: AtomicUsize,
    pub shown: Mutex<Vec<(String, String)>>,
}

impl FakeNotifier {
    pub fn new(permission: NotificationPermission, grant_on_request: NotificationPermission) -> Self {
        Self {
            permission: Mutex::new(permission),
            grant_on_request,
            requests: AtomicUsize::new(0),
            shown: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    fn permission(&self) -> NotificationPermission {
        *self.permission.lock().unwrap()
    }

    async fn request_permission(&self) -> NotificationPermission {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.permission.lock().unwrap() = self.grant_on_request;
        self.grant_on_request
    }

    fn show(&self, title: &str, body: &str) {
        self.shown.lock().unwrap().push((title.to_string(), body.to_string()));
    }
}

// ── Cart ──────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeCartBackend {
    pub preview_script: Mutex<VecDeque<(Duration, Result<CartSnapshot, SyncError>)>>,
    pub remove_script: Mutex<VecDeque<(Duration, Result<CartSnapshot, SyncError>)>>,
    pub preview_calls: Mutex<Vec<String>>,
    pub remove_calls: Mutex<Vec<(String, String)>>,
}

impl FakeCartBackend {
    pub fn script_preview(&self, delay: Duration, result: Result<CartSnapshot, SyncError>) {
        self.preview_script.lock().unwrap().push_back((delay, result));
    }

    pub fn script_remove(&self, delay: Duration, result: Result<CartSnapshot, SyncError>) {
        self.remove_script.lock().unwrap().push_back((delay, result));
    }
}

#[async_trait]
impl CartBackend for FakeCartBackend {
    async fn preview(&self, url: &str) -> Result<CartSnapshot, SyncError> {
        self.preview_calls.lock().unwrap().push(url.to_string());
        let scripted = self.preview_script.lock().unwrap().pop_front();
        let (delay, result) = scripted.unwrap_or((Duration::ZERO, Ok(snapshot(vec![], 0, &[]))));
        tokio::time::sleep(delay).await;
        result
    }

    async fn remove(&self, url: &str, product_id: &str) -> Result<CartSnapshot, SyncError> {
        self.remove_calls.lock().unwrap().push((url.to_string(), product_id.to_string()));
        let scripted = self.remove_script.lock().unwrap().pop_front();
        let (delay, result) = scripted.unwrap_or((Duration::ZERO, Ok(snapshot(vec![], 0, &[]))));
        tokio::time::sleep(delay).await;
        result
    }
}

#[derive(Default)]
pub struct RecordingDrawer {
    pub open: Mutex<Option<bool>>,
    pub items_html: Mutex<Vec<String>>,
    pub totals: Mutex<Vec<String>>,
    pub alerts: Mutex<Vec<Option<String>>>,
}

impl RecordingDrawer {
    pub fn last_items(&self) -> String {
        self.items_html.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn last_total(&self) -> String {
        self.totals.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn last_alert(&self) -> Option<String> {
        self.alerts.lock().unwrap().last().cloned().flatten()
    }
}

impl CartDrawer for RecordingDrawer {
    fn set_open(&self, open: bool) {
        *self.open.lock().unwrap() = Some(open);
    }

    fn set_items_html(&self, html: &str) {
        self.items_html.lock().unwrap().push(html.to_string());
    }

    fn set_total(&self, total: &str) {
        self.totals.lock().unwrap().push(total.to_string());
    }

    fn set_alert(&self, alert: Option<&str>) {
        self.alerts.lock().unwrap().push(alert.map(str::to_string));
    }
}

pub struct FakeControl {
    pub checked: AtomicBool,
    pub disabled: AtomicBool,
    pub disabled_events: Mutex<Vec<bool>>,
}

impl FakeControl {
    /// A checkbox as it is right after the user toggled it.
    pub fn with_checked(checked: bool) -> Self {
        Self {
            checked: AtomicBool::new(checked),
            disabled: AtomicBool::new(false),
            disabled_events: Mutex::new(Vec::new()),
        }
    }

    pub fn is_checked(&self) -> bool {
        self.checked.load(Ordering::SeqCst)
    }
}

impl ToggleControl for FakeControl {
    fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::SeqCst);
        self.disabled_events.lock().unwrap().push(disabled);
    }

    fn set_checked(&self, checked: bool) {
        self.checked.store(checked, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakePage {
    pub scroll_y: Mutex<f64>,
    pub scrolled_to: Mutex<Vec<f64>>,
    pub navigations: Mutex<Vec<String>>,
    pub history: Mutex<Vec<String>>,
    pub session: Mutex<HashMap<String, String>>,
}

impl PageHost for FakePage {
    fn scroll_y(&self) -> f64 {
        *self.scroll_y.lock().unwrap()
    }

    fn scroll_to(&self, y: f64) {
        self.scrolled_to.lock().unwrap().push(y);
    }

    fn navigate(&self, url: &str) {
        self.navigations.lock().unwrap().push(url.to_string());
    }

    fn replace_history(&self, url: &str) {
        self.history.lock().unwrap().push(url.to_string());
    }

    fn session_get(&self, key: &str) -> Option<String> {
        self.session.lock().unwrap().get(key).cloned()
    }

    fn session_set(&self, key: &str, value: &str) {
        self.session.lock().unwrap().insert(key.to_string(), value.to_string());
    }

    fn session_remove(&self, key: &str) {
        self.session.lock().unwrap().remove(key);
    }
}

// ── Suggestions ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeSuggestBackend {
    pub queries: Mutex<Vec<String>>,
    pub fail: AtomicBool,
    pub delay: Duration,
}

#[async_trait]
impl SuggestBackend for FakeSuggestBackend {
    async fn suggestions(&self, query: &str) -> Result<Vec<String>, SyncError> {
        self.queries.lock().unwrap().push(query.to_string());
        tokio::time::sleep(self.delay).await;
        if self.fail.load(Ordering::SeqCst) {
            return Err(SyncError::Status { status: 500 });
        }
        Ok(vec![format!("{query} صنعتی"), format!("{query} گازی")])
    }
}
