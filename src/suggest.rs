use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::backend::SuggestBackend;

const MIN_QUERY_CHARS: usize = 2;

/// The datalist the suggestions are written into.
pub trait SuggestList: Send + Sync {
    fn set_options(&self, options: &[String]);
    fn clear(&self);
}

/// Debounced search suggestions. Each keystroke cancels the pending
/// debounce and any in-flight request, so only the latest query can write
/// to the list.
pub struct SuggestController {
    backend: Arc<dyn SuggestBackend>,
    list: Arc<dyn SuggestList>,
    debounce: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SuggestController {
    pub fn new(backend: Arc<dyn SuggestBackend>, list: Arc<dyn SuggestList>, debounce: Duration) -> Self {
        Self { backend, list, debounce, pending: Mutex::new(None) }
    }

    pub fn on_input(&self, value: &str) {
        let query = value.trim().to_string();
        let backend = self.backend.clone();
        let list = self.list.clone();
        let debounce = self.debounce;

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if query.chars().count() < MIN_QUERY_CHARS {
                list.clear();
                return;
            }
            match backend.suggestions(&query).await {
                Ok(options) => list.set_options(&options),
                Err(e) => {
                    debug!("Suggestion lookup for '{query}' failed: {e}");
                    list.clear();
                }
            }
        }));
    }

    pub fn cancel(&self) {
        if let Some(task) = self.pending.lock().unwrap_or_else(PoisonError::into_inner).take() {
            task.abort();
        }
    }
}

impl Drop for SuggestController {
    fn drop(&mut self) {
        self.cancel();
    }
}
