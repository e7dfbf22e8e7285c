//! Client-side synchronization for the storefront's support chat and mini-cart.
//!
//! The chat side keeps any number of render sinks in sync with the server
//! (live channel with a polling fallback) and runs the two-step
//! send-then-bot-reply pipeline. The cart side renders a read-through preview
//! of the server cart and applies server-confirmed removals.

pub mod backend;
pub mod cart;
pub mod chat;
pub mod config;
pub mod csrf;
pub mod errors;
pub mod format;
pub mod http;
pub mod models;
pub mod suggest;

pub use backend::{CartBackend, ChatBackend, EventStream, SuggestBackend};
pub use config::Config;
pub use errors::SyncError;
pub use http::HttpBackend;
