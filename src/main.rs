use std::sync::{Arc, Mutex};

use anyhow::{bail, Context};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use storefront_sync::cart::{CartDrawer, CartSync, PageHost, ToggleControl};
use storefront_sync::chat::view::{ChatView, EMPTY_CHAT_TEXT};
use storefront_sync::chat::{ChatForm, ChatSink, ChatSinks, NotificationPermission, Notifier, SupportChat};
use storefront_sync::{Config, HttpBackend, SuggestBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_sync=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env().context("Failed to read STOREFRONT_* configuration")?;
    let backend = Arc::new(HttpBackend::new(&config)?);
    info!("Using storefront backend at {}", backend.base_url());

    let mut args = std::env::args().skip(1);
    match args.next().as_deref().unwrap_or("chat") {
        "chat" => run_chat(&config, backend).await,
        "cart" => run_cart(&config, backend, None).await,
        "cart-remove" => {
            let product_id = args.next().context("usage: storefront_sync cart-remove <product-id>")?;
            run_cart(&config, backend, Some(product_id)).await
        }
        "suggest" => {
            let query = args.collect::<Vec<_>>().join(" ");
            for option in backend.suggestions(query.trim()).await? {
                println!("{option}");
            }
            Ok(())
        }
        other => bail!("Unknown command '{other}' (expected chat, cart, cart-remove or suggest)"),
    }
}

// ── Chat ──────────────────────────────────────────────────────────────────────

async fn run_chat(config: &Config, backend: Arc<HttpBackend>) -> anyhow::Result<()> {
    let sink: Arc<dyn ChatSink> = Arc::new(TerminalChat::default());
    let sinks = ChatSinks { widget: None, page: Some(sink) };
    let notifier: Arc<dyn Notifier> = Arc::new(TerminalNotifier);
    let chat = SupportChat::new(config, backend, sinks, None, Some(notifier));

    if !config.authenticated {
        bail!("Set STOREFRONT_AUTHENTICATED=true and a session cookie to use the chat");
    }
    chat.mount().await?;
    info!("Connected ({:?}); type a message and press enter", chat.connection_state());

    let form = TerminalForm;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        // Errors were already shown on the form.
        let _ = chat.submit(&line, &form).await;
    }

    chat.teardown();
    Ok(())
}

/// Prints messages as they appear; positional identity means only the tail is new.
#[derive(Default)]
struct TerminalChat {
    printed: Mutex<Option<usize>>,
}

impl ChatSink for TerminalChat {
    fn commit(&self, view: &ChatView, _html: &str) {
        let mut printed = self.printed.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match view {
            ChatView::Empty => {
                if *printed != Some(0) {
                    println!("{EMPTY_CHAT_TEXT}");
                }
                *printed = Some(0);
            }
            ChatView::Messages(messages) => {
                let from = match *printed {
                    Some(n) if n <= messages.len() => n,
                    _ => 0,
                };
                for m in &messages[from..] {
                    println!("[{}] {}: {}", m.created_at, m.sender, m.text);
                }
                *printed = Some(messages.len());
            }
        }
    }

    fn scroll_to_bottom(&self) {}
}

struct TerminalForm;

impl ChatForm for TerminalForm {
    fn set_submit_busy(&self, busy: bool) {
        tracing::debug!(busy, "Submit control");
    }

    fn clear_input(&self) {}

    fn focus_input(&self) {}

    fn show_error(&self, message: &str) {
        eprintln!("! {message}");
    }
}

struct TerminalNotifier;

#[async_trait]
impl Notifier for TerminalNotifier {
    fn permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    async fn request_permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn show(&self, title: &str, body: &str) {
        println!("** {title}: {body}");
    }
}

// ── Cart ──────────────────────────────────────────────────────────────────────

async fn run_cart(config: &Config, backend: Arc<HttpBackend>, remove: Option<String>) -> anyhow::Result<()> {
    let cart = CartSync::new(config, backend, Arc::new(TerminalDrawer), Arc::new(HeadlessPage));
    match remove {
        Some(product_id) => cart.remove_item(&product_id, &NoControl).await?,
        None => cart.open_preview().await?,
    }
    Ok(())
}

struct TerminalDrawer;

impl CartDrawer for TerminalDrawer {
    fn set_open(&self, _open: bool) {}

    fn set_items_html(&self, html: &str) {
        println!("{html}");
    }

    fn set_total(&self, total: &str) {
        println!("جمع کل: {total} تومان");
    }

    fn set_alert(&self, alert: Option<&str>) {
        if let Some(alert) = alert {
            println!("! {alert}");
        }
    }
}

struct NoControl;

impl ToggleControl for NoControl {
    fn is_disabled(&self) -> bool {
        false
    }

    fn set_disabled(&self, _disabled: bool) {}

    fn set_checked(&self, _checked: bool) {}
}

/// No scrolling, history or storage outside a browser.
struct HeadlessPage;

impl PageHost for HeadlessPage {
    fn scroll_y(&self) -> f64 {
        0.0
    }

    fn scroll_to(&self, _y: f64) {}

    fn navigate(&self, url: &str) {
        println!("→ {url}");
    }

    fn replace_history(&self, _url: &str) {}

    fn session_get(&self, _key: &str) -> Option<String> {
        None
    }

    fn session_set(&self, _key: &str, _value: &str) {}

    fn session_remove(&self, _key: &str) {}
}
