//! Transport Adapter: the single source of feed events for a page.
//!
//! Prefers the push channel when one is configured. When subscribing fails,
//! the connection errors, or the server closes it, the adapter reports
//! `Disconnected` and falls back to polling for the rest of the connection.
//! Either way it starts with a full status + message fetch, and poll
//! responses are turned into the same `FeedEvent`s the push channel emits.

use futures::StreamExt;
use std::ops::ControlFlow;
use std::sync::Arc;
use strum_macros::Display;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use vintel_core::VintelError;
use vintel_core::config::TransportSettings;
use vintel_core::conversation::{ConversationApi, FeedEvent, PushChannel};

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectivityState {
    Push,
    Polling,
    Disconnected,
}

/// What a failed fetch was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FeedResource {
    Status,
    Messages,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Feed(FeedEvent),
    Connectivity(ConnectivityState),
    /// A fetch failed for good (retries exhausted or a server error).
    Failure {
        resource: FeedResource,
        error: VintelError,
    },
}

#[derive(Clone)]
pub struct TransportAdapter {
    api: Arc<dyn ConversationApi>,
    push: Option<Arc<dyn PushChannel>>,
    settings: TransportSettings,
    retry: RetryPolicy,
}

impl TransportAdapter {
    pub fn new(
        api: Arc<dyn ConversationApi>,
        settings: TransportSettings,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            api,
            push: None,
            settings,
            retry,
        }
    }

    /// Adds a push channel. Ignored when `prefer_push` is off.
    pub fn with_push(mut self, push: Arc<dyn PushChannel>) -> Self {
        self.push = Some(push);
        self
    }

    /// Starts delivering events into `sink` until the returned handle is
    /// shut down or dropped, or the receiving side goes away.
    pub fn connect(&self, sink: mpsc::Sender<TransportEvent>) -> TransportHandle {
        let cancel = CancellationToken::new();
        let refresh = Arc::new(Notify::new());

        let worker = Worker {
            api: self.api.clone(),
            push: self.push.clone().filter(|_| self.settings.prefer_push),
            settings: self.settings.clone(),
            retry: self.retry,
            sink,
            cancel: cancel.clone(),
            refresh: refresh.clone(),
        };
        tracing::info!(
            "[Transport] Connecting ({})",
            if worker.push.is_some() { "push" } else { "poll only" }
        );
        let task = tokio::spawn(worker.run());

        TransportHandle {
            cancel,
            refresh,
            task: Some(task),
        }
    }
}

/// Owner of a running connection. Dropping it tears the connection down.
pub struct TransportHandle {
    cancel: CancellationToken,
    refresh: Arc<Notify>,
    task: Option<JoinHandle<()>>,
}

impl TransportHandle {
    /// Requests an immediate status + message fetch.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    /// Cancels the connection and waits for the worker to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    tracing::error!("[Transport] Worker panicked: {}", e);
                }
            }
        }
        tracing::debug!("[Transport] Shut down");
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

struct Worker {
    api: Arc<dyn ConversationApi>,
    push: Option<Arc<dyn PushChannel>>,
    settings: TransportSettings,
    retry: RetryPolicy,
    sink: mpsc::Sender<TransportEvent>,
    cancel: CancellationToken,
    refresh: Arc<Notify>,
}

impl Worker {
    async fn run(self) {
        if let Some(push) = self.push.clone() {
            if self.run_push(push.as_ref()).await.is_break() {
                tracing::debug!("[Transport] Worker stopped");
                return;
            }
        }
        let _ = self.run_polling().await;
        tracing::debug!("[Transport] Worker stopped");
    }

    /// Returns `Continue` when the caller should fall back to polling.
    async fn run_push(&self, push: &dyn PushChannel) -> ControlFlow<()> {
        let subscribed = tokio::select! {
            _ = self.cancel.cancelled() => return ControlFlow::Break(()),
            result = push.subscribe() => result,
        };
        let mut stream = match subscribed {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!("[Transport] Push unavailable, falling back to polling: {}", err);
                return self
                    .emit(TransportEvent::Connectivity(ConnectivityState::Disconnected))
                    .await;
            }
        };

        self.emit(TransportEvent::Connectivity(ConnectivityState::Push))
            .await?;
        self.fetch_all().await?;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return ControlFlow::Break(()),
                _ = self.refresh.notified() => self.fetch_all().await?,
                item = stream.next() => match item {
                    Some(Ok(event)) => {
                        tracing::trace!("[Transport] Push event: {}", event.kind());
                        self.emit(TransportEvent::Feed(event)).await?;
                    }
                    // A single undecodable event does not end the stream.
                    Some(Err(err)) if err.is_serialization() => {
                        tracing::warn!("[Transport] Skipping bad push event: {}", err);
                    }
                    Some(Err(err)) => {
                        tracing::warn!("[Transport] Push stream failed: {}", err);
                        break;
                    }
                    None => {
                        tracing::info!("[Transport] Push stream closed");
                        break;
                    }
                },
            }
        }

        drop(stream);
        self.emit(TransportEvent::Connectivity(ConnectivityState::Disconnected))
            .await
    }

    async fn run_polling(&self) -> ControlFlow<()> {
        self.emit(TransportEvent::Connectivity(ConnectivityState::Polling))
            .await?;
        self.fetch_all().await?;

        let status_every = self.settings.status_poll_interval();
        let messages_every = self.settings.messages_poll_interval();
        let mut status_tick = interval_at(Instant::now() + status_every, status_every);
        let mut messages_tick = interval_at(Instant::now() + messages_every, messages_every);
        status_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        messages_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return ControlFlow::Break(()),
                _ = self.refresh.notified() => self.fetch_all().await?,
                _ = status_tick.tick() => self.fetch_status().await?,
                _ = messages_tick.tick() => self.fetch_messages().await?,
            }
        }
    }

    async fn fetch_all(&self) -> ControlFlow<()> {
        self.fetch_status().await?;
        self.fetch_messages().await
    }

    async fn fetch_status(&self) -> ControlFlow<()> {
        let result = tokio::select! {
            _ = self.cancel.cancelled() => return ControlFlow::Break(()),
            result = self.retry.run("fetch status", || self.api.fetch_status()) => result,
        };
        match result {
            Ok(snapshot) => {
                self.emit(TransportEvent::Feed(FeedEvent::StateChange(snapshot)))
                    .await
            }
            Err(error) => self.fail(FeedResource::Status, error).await,
        }
    }

    async fn fetch_messages(&self) -> ControlFlow<()> {
        let result = tokio::select! {
            _ = self.cancel.cancelled() => return ControlFlow::Break(()),
            result = self.retry.run("fetch messages", || self.api.fetch_messages()) => result,
        };
        match result {
            Ok(messages) => {
                for message in messages {
                    self.emit(TransportEvent::Feed(FeedEvent::NewMessage(message)))
                        .await?;
                }
                ControlFlow::Continue(())
            }
            Err(error) => self.fail(FeedResource::Messages, error).await,
        }
    }

    async fn fail(&self, resource: FeedResource, error: VintelError) -> ControlFlow<()> {
        tracing::warn!("[Transport] Failed to fetch {}: {}", resource, error);
        self.emit(TransportEvent::Failure { resource, error }).await
    }

    async fn emit(&self, event: TransportEvent) -> ControlFlow<()> {
        match self.sink.send(event).await {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => {
                tracing::debug!("[Transport] Receiver dropped, stopping");
                ControlFlow::Break(())
            }
        }
    }
}
