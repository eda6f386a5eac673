//! User-triggered actions on the conversation feed.

use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use vintel_core::conversation::{ConversationApi, StartResponse};
use vintel_core::investigation::{InvestigationReport, InvestigationRequest};
use vintel_core::notification::NotificationLevel;
use vintel_core::sequence::{RequestTracker, Ticket};
use vintel_core::{Result, VintelError};

use crate::session::{FeedSnapshot, SessionCommand};

const INVESTIGATION: &str = "investigation";
const START: &str = "start";

/// Issues feed actions against the backend and reports their outcome to the
/// owning session as notifications.
#[derive(Clone)]
pub struct FeedActions {
    api: Arc<dyn ConversationApi>,
    snapshots: watch::Receiver<Arc<FeedSnapshot>>,
    commands: mpsc::Sender<SessionCommand>,
    tracker: Arc<Mutex<RequestTracker<&'static str>>>,
}

impl FeedActions {
    pub fn new(
        api: Arc<dyn ConversationApi>,
        snapshots: watch::Receiver<Arc<FeedSnapshot>>,
        commands: mpsc::Sender<SessionCommand>,
    ) -> Self {
        Self {
            api,
            snapshots,
            commands,
            tracker: Arc::new(Mutex::new(RequestTracker::new())),
        }
    }

    /// Requests a report about a message currently shown in the feed.
    ///
    /// A response that arrives after a newer investigation was requested is
    /// discarded and reported as [`VintelError::Cancelled`].
    pub async fn request_investigation(&self, message_id: &str) -> Result<InvestigationReport> {
        let request = {
            let snapshot = self.snapshots.borrow();
            let message = snapshot
                .find_message(message_id)
                .ok_or_else(|| VintelError::not_found("message", message_id))?;
            InvestigationRequest {
                message_id: message.id.clone(),
                message_content: message.text.clone(),
                provider_id: message.provider_id.clone(),
            }
        };

        let ticket = self.issue(INVESTIGATION);
        tracing::info!("[FeedActions] Investigating message {}", message_id);
        let result = self.api.request_investigation(&request).await;

        if !self.is_current(&ticket) {
            tracing::debug!(
                "[FeedActions] Dropping superseded investigation of {}",
                message_id
            );
            return Err(VintelError::Cancelled);
        }

        if let Err(err) = &result {
            self.notify_error("investigate message", err).await;
        }
        result
    }

    /// Asks the backend to start a conversation now.
    pub async fn start_conversation_manually(&self) -> Result<StartResponse> {
        let ticket = self.issue(START);
        let result = self.api.start_conversation().await;
        if !self.is_current(&ticket) {
            return Err(VintelError::Cancelled);
        }

        match &result {
            Ok(response) if response.success => {
                let message = if response.message.is_empty() {
                    "Conversation start requested".to_string()
                } else {
                    response.message.clone()
                };
                self.notify(NotificationLevel::Success, "start conversation", message)
                    .await;
            }
            Ok(response) => {
                self.notify(
                    NotificationLevel::Warning,
                    "start conversation",
                    format!("Failed to start conversation. {}", response.message),
                )
                .await;
            }
            Err(err) => self.notify_error("start conversation", err).await,
        }
        result
    }

    /// Fetches the mood palette of a conversation and hands it to the
    /// session. Failures are returned, not notified; the feed simply keeps
    /// its default theme.
    pub async fn load_palette(&self, conversation_id: &str) -> Result<()> {
        let palette = self.api.fetch_palette(conversation_id).await?;
        tracing::debug!(
            "[FeedActions] Palette for {}: {} ({}%)",
            conversation_id,
            palette.mood,
            palette.intensity
        );
        self.send(SessionCommand::ApplyPalette {
            conversation_id: conversation_id.to_string(),
            palette,
        })
        .await;
        Ok(())
    }

    /// Removes a notification from the feed.
    pub async fn dismiss(&self, notification_id: impl Into<String>) {
        self.send(SessionCommand::Dismiss(notification_id.into()))
            .await;
    }

    fn issue(&self, key: &'static str) -> Ticket<&'static str> {
        self.tracker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .issue(key)
    }

    fn is_current(&self, ticket: &Ticket<&'static str>) -> bool {
        self.tracker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_current(ticket)
    }

    async fn notify(&self, level: NotificationLevel, action: &str, message: String) {
        self.send(SessionCommand::Notify {
            level,
            action: action.to_string(),
            message,
        })
        .await;
    }

    async fn notify_error(&self, action: &str, error: &VintelError) {
        self.send(SessionCommand::NotifyError {
            action: action.to_string(),
            error: error.clone(),
        })
        .await;
    }

    async fn send(&self, command: SessionCommand) {
        if self.commands.send(command).await.is_err() {
            tracing::debug!("[FeedActions] Session closed, notification dropped");
        }
    }
}
