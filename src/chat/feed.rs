use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::backend::ChatBackend;
use crate::chat::store::MessageStore;
use crate::errors::SyncError;
use crate::models::{StreamNotice, NEW_MESSAGE_NOTICE};

/// Which update mechanism is currently installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Streaming,
    Polling,
}

/// Update mechanism picked once per `start()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Stream,
    Poll,
}

/// Whether a live-channel payload should trigger a reload.
/// Unparseable payloads reload anyway.
pub fn notice_requires_reload(data: &str) -> bool {
    let data = if data.trim().is_empty() { "{}" } else { data };
    match serde_json::from_str::<StreamNotice>(data) {
        Ok(notice) => notice.kind.as_deref() == Some(NEW_MESSAGE_NOTICE),
        Err(e) => {
            debug!("Unparseable live event, reloading anyway: {e}");
            true
        }
    }
}

/// The single slot holding the active mechanism. Holding at most one task
/// here is what keeps streaming and polling mutually exclusive.
struct Slot {
    state: ConnectionState,
    task: Option<JoinHandle<()>>,
    /// Bumped on every start/stop so a superseded stream task cannot
    /// install a poll timer after the fact.
    generation: u64,
}

impl Slot {
    fn clear(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.state = ConnectionState::Disconnected;
        self.generation += 1;
    }
}

#[derive(Clone)]
struct FeedShared {
    backend: Arc<dyn ChatBackend>,
    store: MessageStore,
    poll_interval: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl FeedShared {
    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn spawn_poll(&self) -> JoinHandle<()> {
        let store = self.store.clone();
        let period = self.poll_interval;
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let _ = store.reload().await;
            }
        })
    }

    async fn run_stream(self, generation: u64) {
        match self.backend.subscribe().await {
            Ok(mut events) => {
                while let Some(event) = events.next().await {
                    match event {
                        Ok(data) => {
                            if notice_requires_reload(&data) {
                                let _ = self.store.reload().await;
                            }
                        }
                        Err(e) => {
                            warn!("Live channel failed: {e}");
                            break;
                        }
                    }
                }
                // Dropping the stream closes the channel exactly once.
                drop(events);
            }
            Err(e) => warn!("Could not open live channel: {e}"),
        }
        self.fall_back_to_polling(generation);
    }

    fn fall_back_to_polling(&self, generation: u64) {
        let mut slot = self.lock();
        if slot.generation != generation || slot.state != ConnectionState::Streaming {
            debug!("Stream task superseded; not installing poll fallback");
            return;
        }
        info!("Falling back to polling every {:?}", self.poll_interval);
        slot.state = ConnectionState::Polling;
        // The handle being replaced belongs to the stream task that is
        // finishing right now, so it is detached rather than aborted.
        slot.task = Some(self.spawn_poll());
    }
}

/// Keeps chat sinks in sync with the server, over a live channel when
/// available and a fixed-interval poll otherwise.
pub struct FeedController {
    shared: FeedShared,
    authenticated: bool,
    login_url: String,
}

impl FeedController {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        store: MessageStore,
        authenticated: bool,
        poll_interval: Duration,
        login_url: impl Into<String>,
    ) -> Self {
        Self {
            shared: FeedShared {
                backend,
                store,
                poll_interval,
                slot: Arc::new(Mutex::new(Slot {
                    state: ConnectionState::Disconnected,
                    task: None,
                    generation: 0,
                })),
            },
            authenticated,
            login_url: login_url.into(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.lock().state
    }

    pub fn strategy(&self) -> Strategy {
        if self.shared.backend.supports_streaming() {
            Strategy::Stream
        } else {
            Strategy::Poll
        }
    }

    /// Installs the live channel or, if the environment has none, a poll
    /// timer, then reloads immediately. Any previous mechanism is torn down
    /// first; a `stop()` during the initial reload wins.
    pub async fn start(&self) -> Result<(), SyncError> {
        if !self.authenticated {
            return Err(SyncError::AuthRequired { login_url: self.login_url.clone() });
        }

        let strategy = self.strategy();
        let generation = {
            let mut slot = self.shared.lock();
            slot.clear();
            let generation = slot.generation;
            match strategy {
                Strategy::Stream => {
                    slot.state = ConnectionState::Streaming;
                    slot.task = Some(tokio::spawn(self.shared.clone().run_stream(generation)));
                }
                Strategy::Poll => {
                    slot.state = ConnectionState::Polling;
                    slot.task = Some(self.shared.spawn_poll());
                }
            }
            generation
        };
        info!("Realtime chat updates started ({strategy:?})");

        let _ = self.shared.store.reload().await;
        if self.shared.lock().generation != generation {
            debug!("Chat updates were stopped or restarted during the initial load");
        }
        Ok(())
    }

    /// Tears down whichever mechanism is active. Safe to call repeatedly.
    pub fn stop(&self) {
        let mut slot = self.shared.lock();
        if slot.state != ConnectionState::Disconnected {
            info!("Realtime chat updates stopped");
        }
        slot.clear();
    }
}

impl Drop for FeedController {
    fn drop(&mut self) {
        self.stop();
    }
}
