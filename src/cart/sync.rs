use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::backend::CartBackend;
use crate::cart::view::CartView;
use crate::config::Config;
use crate::errors::SyncError;

/// Session-storage key for the scroll offset saved before an add-to-cart redirect.
pub const SCROLL_KEY: &str = "styra_scroll_y_before_cart";
/// Query flag the add-to-cart redirect appends to reopen the drawer.
pub const CART_OPEN_PARAM: &str = "cart_open";
const ADD_TO_CART_MARKER: &str = "add-to-cart";

/// The mini-cart drawer.
pub trait CartDrawer: Send + Sync {
    fn set_open(&self, open: bool);
    /// Replaces the item area with already-escaped HTML.
    fn set_items_html(&self, html: &str);
    fn set_total(&self, total: &str);
    /// Shows the transient banner, or hides it on `None`.
    fn set_alert(&self, alert: Option<&str>);
}

/// A control that triggered a cart mutation (card checkbox or remove button).
pub trait ToggleControl: Send + Sync {
    fn is_disabled(&self) -> bool;
    fn set_disabled(&self, disabled: bool);
    fn set_checked(&self, checked: bool);
}

/// Scroll, navigation and session storage of the hosting page.
/// Storage failures are swallowed by the host.
pub trait PageHost: Send + Sync {
    fn scroll_y(&self) -> f64;
    fn scroll_to(&self, y: f64);
    /// Full navigation away from the page.
    fn navigate(&self, url: &str);
    /// Rewrites the current history entry without navigating.
    fn replace_history(&self, url: &str);
    fn session_get(&self, key: &str) -> Option<String>;
    fn session_set(&self, key: &str, value: &str);
    fn session_remove(&self, key: &str);
}

/// Data attributes of a product card's add/remove checkbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartToggle {
    pub product_id: String,
    pub add_url: String,
    pub remove_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Navigated to the add-to-cart endpoint.
    Navigated,
    Removed,
    /// Control disabled or missing data; nothing happened.
    Ignored,
}

/// Read-through cart preview with server-confirmed removals.
pub struct CartSync {
    backend: Arc<dyn CartBackend>,
    drawer: Arc<dyn CartDrawer>,
    page: Arc<dyn PageHost>,
    preview_url: Option<String>,
    remove_url: String,
    issued: AtomicU64,
    applied: Mutex<u64>,
}

impl CartSync {
    pub fn new(
        config: &Config,
        backend: Arc<dyn CartBackend>,
        drawer: Arc<dyn CartDrawer>,
        page: Arc<dyn PageHost>,
    ) -> Self {
        let preview_url = Some(config.cart_preview_url.clone()).filter(|u| !u.is_empty());
        Self {
            backend,
            drawer,
            page,
            preview_url,
            remove_url: config.cart_remove_url.clone(),
            issued: AtomicU64::new(0),
            applied: Mutex::new(0),
        }
    }

    fn next_ticket(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Applies `view` unless a response issued later already landed.
    fn commit(&self, ticket: u64, view: &CartView) -> Result<bool, SyncError> {
        let mut applied = self.applied.lock().unwrap_or_else(PoisonError::into_inner);
        if ticket < *applied {
            debug!("Discarding stale cart response (ticket {ticket} < {})", *applied);
            return Ok(false);
        }
        let html = view.items_html()?;
        *applied = ticket;
        self.drawer.set_items_html(&html);
        self.drawer.set_total(&view.total);
        self.drawer.set_alert(view.alert.as_deref());
        Ok(true)
    }

    /// Shows the drawer and loads the current cart into it.
    pub async fn open_preview(&self) -> Result<(), SyncError> {
        self.drawer.set_open(true);
        let Some(url) = &self.preview_url else { return Ok(()) };

        let ticket = self.next_ticket();
        self.drawer.set_items_html(&CartView::loading().items_html()?);

        match self.backend.preview(url).await {
            Ok(snapshot) => {
                self.commit(ticket, &CartView::from_snapshot(&snapshot))?;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load cart preview: {e}");
                self.commit(ticket, &CartView::failed())?;
                Err(e)
            }
        }
    }

    pub fn close(&self) {
        self.drawer.set_open(false);
    }

    /// Removes an item through the drawer's own remove control.
    pub async fn remove_item(&self, product_id: &str, control: &dyn ToggleControl) -> Result<(), SyncError> {
        self.remove_via(&self.remove_url, product_id, control).await
    }

    /// The DOM only changes from the server's post-removal state; on any
    /// failure the control is re-checked.
    async fn remove_via(
        &self,
        url: &str,
        product_id: &str,
        control: &dyn ToggleControl,
    ) -> Result<(), SyncError> {
        control.set_disabled(true);
        let ticket = self.next_ticket();

        let result = match self.backend.remove(url, product_id).await {
            Ok(snapshot) => self.commit(ticket, &CartView::from_snapshot(&snapshot)).map(|_| ()),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            warn!("Failed to remove product {product_id} from cart: {e}");
            control.set_checked(true);
        } else {
            info!("Removed product {product_id} from cart");
        }
        control.set_disabled(false);
        result
    }

    /// Handles a card checkbox change. Checking navigates to the add
    /// endpoint; unchecking removes in place.
    pub async fn toggle(
        &self,
        toggle: &CartToggle,
        control: &dyn ToggleControl,
        checked: bool,
    ) -> Result<ToggleOutcome, SyncError> {
        if control.is_disabled() {
            return Ok(ToggleOutcome::Ignored);
        }

        if checked {
            if toggle.add_url.is_empty() {
                return Ok(ToggleOutcome::Ignored);
            }
            self.stash_scroll();
            self.page.navigate(&toggle.add_url);
            return Ok(ToggleOutcome::Navigated);
        }

        if toggle.remove_url.is_empty() || toggle.product_id.is_empty() {
            return Ok(ToggleOutcome::Ignored);
        }
        self.remove_via(&toggle.remove_url, &toggle.product_id, control).await?;
        Ok(ToggleOutcome::Removed)
    }

    /// Call before following any link; add-to-cart links save the scroll offset.
    pub fn note_link_followed(&self, href: &str) {
        if href.contains(ADD_TO_CART_MARKER) {
            self.stash_scroll();
        }
    }

    fn stash_scroll(&self) {
        let y = self.page.scroll_y();
        let y = if y.is_finite() { y } else { 0.0 };
        self.page.session_set(SCROLL_KEY, &y.to_string());
    }

    /// Page load after an add-to-cart redirect: restores scroll, reopens the
    /// drawer and strips the flag from history. Returns whether it reopened.
    pub async fn restore_after_redirect(&self, current_url: &str) -> Result<bool, SyncError> {
        let Ok(mut url) = Url::parse(current_url) else {
            debug!("Not restoring cart drawer for unparseable URL {current_url}");
            return Ok(false);
        };
        let reopen = url.query_pairs().any(|(k, v)| k == CART_OPEN_PARAM && v == "1");
        if !reopen {
            return Ok(false);
        }

        if let Some(saved) = self.page.session_get(SCROLL_KEY) {
            match saved.trim().parse::<f64>() {
                Ok(y) if y.is_finite() => self.page.scroll_to(y),
                _ => debug!("Ignoring unusable saved scroll offset '{saved}'"),
            }
            self.page.session_remove(SCROLL_KEY);
        }

        strip_query_param(&mut url, CART_OPEN_PARAM);
        let result = self.open_preview().await;
        self.page.replace_history(url.as_str());
        result.map(|()| true)
    }
}

fn strip_query_param(url: &mut Url, name: &str) {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != name)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
}
