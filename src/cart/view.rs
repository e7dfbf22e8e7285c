use askama::Template;

use crate::errors::SyncError;
use crate::format::{format_number, format_total};
use crate::models::{CartItem, CartSnapshot};

pub const LOADING_TEXT: &str = "در حال بارگذاری...";
pub const EMPTY_CART_TEXT: &str = "سبد خرید شما خالی است.";
pub const PREVIEW_FAILED_TEXT: &str = "خطا در دریافت سبد خرید. لطفاً دوباره تلاش کنید.";
pub const UNAVAILABLE_LABEL: &str = "ناموجود";
pub const REMOVED_LABEL: &str = "ناموجود - از سبد حذف شد";
pub const REMOVE_BUTTON_LABEL: &str = "حذف از سبد خرید";
pub const REMOVED_ALERT_PREFIX: &str = "محصولات ناموجود از سبد حذف شدند: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub unavailable: bool,
    /// Empty when the item is available.
    pub status: &'static str,
    pub meta: String,
    pub price: String,
}

impl From<&CartItem> for CartItemView {
    fn from(item: &CartItem) -> Self {
        let unavailable = !item.is_available;
        let status = match (unavailable, item.removed) {
            (false, _) => "",
            (true, true) => REMOVED_LABEL,
            (true, false) => UNAVAILABLE_LABEL,
        };
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            unavailable,
            status,
            meta: format!(
                "{} عدد {} تومان",
                format_number(&item.quantity),
                format_number(&item.unit_price)
            ),
            price: format!("{} تومان", format_number(&item.total_price)),
        }
    }
}

/// The drawer's item area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemsView {
    Loading,
    Empty,
    Failed,
    Items(Vec<CartItemView>),
}

/// Everything the drawer shows for one cart state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: ItemsView,
    pub total: String,
    /// One-shot banner naming items the server dropped; `None` hides it.
    pub alert: Option<String>,
}

impl CartView {
    pub fn loading() -> Self {
        Self { items: ItemsView::Loading, total: format_total(&serde_json::Value::Null), alert: None }
    }

    pub fn failed() -> Self {
        Self { items: ItemsView::Failed, total: format_total(&serde_json::Value::Null), alert: None }
    }

    pub fn from_snapshot(snapshot: &CartSnapshot) -> Self {
        let items = if snapshot.items.is_empty() {
            ItemsView::Empty
        } else {
            ItemsView::Items(snapshot.items.iter().map(CartItemView::from).collect())
        };
        let total = if snapshot.items.is_empty() {
            format_total(&serde_json::Value::Null)
        } else {
            format_total(&snapshot.total)
        };
        Self { items, total, alert: removed_alert(&snapshot.removed_unavailable) }
    }

    pub fn items_html(&self) -> Result<String, SyncError> {
        let html = match &self.items {
            ItemsView::Loading => CartPlaceholderTemplate { message: LOADING_TEXT }.render()?,
            ItemsView::Empty => CartPlaceholderTemplate { message: EMPTY_CART_TEXT }.render()?,
            ItemsView::Failed => CartPlaceholderTemplate { message: PREVIEW_FAILED_TEXT }.render()?,
            ItemsView::Items(items) => CartItemsTemplate { items, remove_label: REMOVE_BUTTON_LABEL }.render()?,
        };
        Ok(html)
    }
}

pub fn removed_alert(names: &[String]) -> Option<String> {
    if names.is_empty() {
        None
    } else {
        Some(format!("{REMOVED_ALERT_PREFIX}{}", names.join(", ")))
    }
}

#[derive(Template)]
#[template(path = "cart_placeholder.html")]
struct CartPlaceholderTemplate<'a> {
    message: &'a str,
}

#[derive(Template)]
#[template(path = "cart_items.html")]
struct CartItemsTemplate<'a> {
    items: &'a [CartItemView],
    remove_label: &'a str,
}
