pub mod sync;
pub mod view;

pub use sync::{CartDrawer, CartSync, CartToggle, PageHost, ToggleControl, ToggleOutcome};
pub use view::{CartItemView, CartView, ItemsView};
