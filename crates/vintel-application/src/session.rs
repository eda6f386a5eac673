//! Feed session: the single writer of a page's state.
//!
//! Every transport event, countdown tick and command is applied here, in one
//! task, so the state store needs no locking. Readers get immutable
//! [`FeedSnapshot`]s published through a `watch` channel after each change.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use vintel_core::VintelError;
use vintel_core::clock::Clock;
use vintel_core::config::FeedSettings;
use vintel_core::conversation::{ConversationState, Message, StateStore, StoreChange};
use vintel_core::countdown::{Countdown, CountdownTick};
use vintel_core::mood::MoodPalette;
use vintel_core::notification::{Notification, NotificationCenter, NotificationLevel};
use vintel_interaction::{ConnectivityState, TransportEvent};

use crate::countdown_clock::CountdownHandle;

/// Immutable view of a page at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub state: ConversationState,
    /// Oldest first.
    pub messages: Vec<Message>,
    pub countdown: CountdownTick,
    pub notifications: Vec<Notification>,
    pub connectivity: Option<ConnectivityState>,
    /// Theme of the current conversation, once fetched.
    pub palette: Option<MoodPalette>,
}

impl FeedSnapshot {
    pub fn find_message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }
}

/// Requests from outside the session task.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Notify {
        level: NotificationLevel,
        action: String,
        message: String,
    },
    NotifyError {
        action: String,
        error: VintelError,
    },
    Dismiss(String),
    /// Palette fetched for `conversation_id`. Ignored once the feed has
    /// moved on to another conversation.
    ApplyPalette {
        conversation_id: String,
        palette: MoodPalette,
    },
}

/// Channels the running session reads from and publishes to.
pub struct SessionIo {
    pub events: mpsc::Receiver<TransportEvent>,
    pub ticks: mpsc::Receiver<CountdownTick>,
    pub commands: mpsc::Receiver<SessionCommand>,
    pub publish: watch::Sender<Arc<FeedSnapshot>>,
    pub countdown: CountdownHandle,
    pub cancel: CancellationToken,
}

pub struct FeedSession {
    store: StateStore,
    countdown: Countdown,
    last_tick: CountdownTick,
    notifications: NotificationCenter,
    connectivity: Option<ConnectivityState>,
    palette: Option<(String, MoodPalette)>,
    clock: Arc<dyn Clock>,
}

impl FeedSession {
    pub fn new(settings: &FeedSettings, clock: Arc<dyn Clock>) -> Self {
        let countdown = Countdown::default();
        let last_tick = countdown.tick(clock.now(), false);
        Self {
            store: StateStore::new(settings.round_capacity, settings.max_messages),
            countdown,
            last_tick,
            notifications: NotificationCenter::new(settings.notification_ttl()),
            connectivity: None,
            palette: None,
            clock,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn countdown_target(&self) -> Option<DateTime<Utc>> {
        self.countdown.target()
    }

    pub fn last_tick(&self) -> &CountdownTick {
        &self.last_tick
    }

    /// Applies one transport event. Returns whether anything visible changed.
    pub fn handle_transport_event(&mut self, event: TransportEvent) -> bool {
        let now = self.clock.now();
        match event {
            TransportEvent::Feed(feed_event) => {
                let kind = feed_event.kind();
                match self.store.apply_feed_event(feed_event, now) {
                    Ok(StoreChange::State) => {
                        self.countdown
                            .reanchor(self.store.state().next_event_time_utc);
                        self.retick(now);
                        true
                    }
                    Ok(StoreChange::Messages) => true,
                    Ok(StoreChange::Unchanged) => false,
                    Err(err) if err.is_stale() => {
                        tracing::debug!("[FeedSession] Ignoring {}: {}", kind, err);
                        false
                    }
                    Err(err) => {
                        tracing::warn!("[FeedSession] Failed to apply {}: {}", kind, err);
                        self.notifications
                            .push_error(format!("apply {}", kind), &err, now);
                        true
                    }
                }
            }
            TransportEvent::Connectivity(state) => {
                let previous = self.connectivity.replace(state);
                if previous == Some(ConnectivityState::Push)
                    && state == ConnectivityState::Disconnected
                {
                    self.notifications.push(
                        NotificationLevel::Warning,
                        "receive live updates",
                        "Live updates lost, switching to periodic refresh",
                        now,
                    );
                }
                previous != Some(state)
            }
            TransportEvent::Failure { resource, error } => {
                self.notifications
                    .push_error(format!("load conversation {}", resource), &error, now);
                true
            }
        }
    }

    /// Applies a countdown tick, re-deriving the mode from the current
    /// store state.
    pub fn handle_tick(&mut self, tick: CountdownTick) -> bool {
        self.notifications.prune(tick.at);
        self.retick(tick.at);
        true
    }

    pub fn handle_command(&mut self, command: SessionCommand) -> bool {
        let now = self.clock.now();
        match command {
            SessionCommand::Notify {
                level,
                action,
                message,
            } => {
                self.notifications.push(level, action, message, now);
                true
            }
            SessionCommand::NotifyError { action, error } => {
                self.notifications.push_error(action, &error, now);
                true
            }
            SessionCommand::Dismiss(id) => self.notifications.dismiss(&id),
            SessionCommand::ApplyPalette {
                conversation_id,
                palette,
            } => {
                let current = self.store.state().conversation_id.as_deref();
                if current != Some(conversation_id.as_str()) {
                    tracing::debug!(
                        "[FeedSession] Ignoring palette for past conversation {}",
                        conversation_id
                    );
                    return false;
                }
                self.palette = Some((conversation_id, palette));
                true
            }
        }
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            state: self.store.state().clone(),
            messages: self.store.messages().cloned().collect(),
            countdown: self.last_tick,
            notifications: self.notifications.active(self.last_tick.at),
            connectivity: self.connectivity,
            palette: self.current_palette().cloned(),
        }
    }

    fn current_palette(&self) -> Option<&MoodPalette> {
        let current = self.store.state().conversation_id.as_deref()?;
        self.palette
            .as_ref()
            .filter(|(id, _)| id == current)
            .map(|(_, palette)| palette)
    }

    fn retick(&mut self, now: DateTime<Utc>) {
        self.last_tick = self.countdown.tick(now, self.store.state().active);
    }

    /// Runs until cancelled or until the transport stream ends.
    pub async fn run(mut self, io: SessionIo) {
        let SessionIo {
            mut events,
            mut ticks,
            mut commands,
            publish,
            countdown,
            cancel,
        } = io;

        tracing::debug!("[FeedSession] Started");
        loop {
            let changed = tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => {
                        let changed = self.handle_transport_event(event);
                        countdown.reanchor(self.countdown_target());
                        countdown.set_active(self.store.state().active);
                        changed
                    }
                    None => {
                        tracing::debug!("[FeedSession] Transport closed");
                        break;
                    }
                },
                Some(tick) = ticks.recv() => self.handle_tick(tick),
                Some(command) = commands.recv() => self.handle_command(command),
            };

            if changed && publish.send(Arc::new(self.snapshot())).is_err() {
                tracing::debug!("[FeedSession] No readers left");
                break;
            }
        }
        tracing::debug!("[FeedSession] Stopped");
    }
}
