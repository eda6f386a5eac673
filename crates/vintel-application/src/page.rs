//! FeedPage - composition root for one running conversation feed.
//!
//! A page owns exactly one transport connection, one countdown clock and the
//! session task that applies their output. Dropping the page tears all of
//! them down.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vintel_core::Result;
use vintel_core::clock::Clock;
use vintel_core::config::VintelConfig;
use vintel_core::conversation::{ConversationApi, PushChannel, StartResponse};
use vintel_core::investigation::InvestigationReport;
use vintel_interaction::{RetryPolicy, TransportAdapter, TransportHandle};

use crate::countdown_clock::CountdownClock;
use crate::feed_actions::FeedActions;
use crate::session::{FeedSession, FeedSnapshot, SessionIo};

const EVENT_BUFFER: usize = 64;
const TICK_BUFFER: usize = 4;
const COMMAND_BUFFER: usize = 16;

pub struct FeedPage {
    transport: Option<TransportHandle>,
    session: Option<JoinHandle<()>>,
    palette_sync: Option<JoinHandle<()>>,
    cancel: CancellationToken,
    snapshots: watch::Receiver<Arc<FeedSnapshot>>,
    actions: FeedActions,
}

impl FeedPage {
    /// Connects the transport and starts the session. Must be called from
    /// within a Tokio runtime.
    pub fn open(
        config: &VintelConfig,
        api: Arc<dyn ConversationApi>,
        push: Option<Arc<dyn PushChannel>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let mut adapter = TransportAdapter::new(
            api.clone(),
            config.transport.clone(),
            RetryPolicy::from(&config.retry),
        );
        if let Some(push) = push {
            adapter = adapter.with_push(push);
        }
        let transport = adapter.connect(event_tx);

        let (tick_tx, tick_rx) = mpsc::channel(TICK_BUFFER);
        let countdown = CountdownClock::new(clock.clone(), config.feed.tick_interval()).start(
            None,
            move |tick| {
                // A full buffer means the session is behind; the next tick
                // carries the same information.
                let _ = tick_tx.try_send(tick);
            },
        );

        let session = FeedSession::new(&config.feed, clock);
        let (publish, snapshots) = watch::channel(Arc::new(session.snapshot()));
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(session.run(SessionIo {
            events: event_rx,
            ticks: tick_rx,
            commands: command_rx,
            publish,
            countdown,
            cancel: cancel.clone(),
        }));
        let actions = FeedActions::new(api, snapshots.clone(), command_tx);
        let palette_sync = spawn_palette_sync(actions.clone(), snapshots.clone(), cancel.clone());
        tracing::info!("[FeedPage] Opened");

        Self {
            transport: Some(transport),
            session: Some(task),
            palette_sync: Some(palette_sync),
            cancel,
            actions,
            snapshots,
        }
    }

    /// Receiver that is notified after every visible change.
    pub fn subscribe(&self) -> watch::Receiver<Arc<FeedSnapshot>> {
        self.snapshots.clone()
    }

    pub fn current(&self) -> Arc<FeedSnapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn actions(&self) -> &FeedActions {
        &self.actions
    }

    /// Fetches status and messages right away.
    pub fn refresh(&self) {
        if let Some(transport) = &self.transport {
            transport.refresh();
        }
    }

    pub async fn request_investigation(&self, message_id: &str) -> Result<InvestigationReport> {
        self.actions.request_investigation(message_id).await
    }

    /// Starts a conversation and, when the backend accepts, refreshes so
    /// the new state shows up without waiting for the next poll.
    pub async fn start_conversation_manually(&self) -> Result<StartResponse> {
        let response = self.actions.start_conversation_manually().await?;
        if response.success {
            self.refresh();
        }
        Ok(response)
    }

    /// Shuts everything down and waits for the tasks to finish.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(transport) = self.transport.take() {
            transport.shutdown().await;
        }
        if let Some(session) = self.session.take() {
            let _ = session.await;
        }
        if let Some(palette_sync) = self.palette_sync.take() {
            let _ = palette_sync.await;
        }
        tracing::info!("[FeedPage] Closed");
    }
}

impl Drop for FeedPage {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(session) = self.session.take() {
            session.abort();
        }
        if let Some(palette_sync) = self.palette_sync.take() {
            palette_sync.abort();
        }
    }
}

/// Fetches the mood palette once per conversation id seen in the feed.
fn spawn_palette_sync(
    actions: FeedActions,
    mut snapshots: watch::Receiver<Arc<FeedSnapshot>>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut requested: Option<String> = None;
        loop {
            let current = snapshots.borrow_and_update().state.conversation_id.clone();
            if let Some(id) = current.filter(|id| requested.as_ref() != Some(id)) {
                requested = Some(id.clone());
                let loaded = tokio::select! {
                    _ = cancel.cancelled() => break,
                    loaded = actions.load_palette(&id) => loaded,
                };
                if let Err(err) = loaded {
                    tracing::debug!("[FeedPage] Keeping default theme for {}: {}", id, err);
                }
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    })
}
