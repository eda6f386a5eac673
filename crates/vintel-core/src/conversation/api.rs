//! Backend seams for the conversation feed.
//!
//! The concrete HTTP and server-sent-events implementations live in
//! `vintel-interaction`; tests plug in in-memory fakes.

use async_trait::async_trait;
use futures::stream::BoxStream;

use super::event::FeedEvent;
use super::model::{Message, StartResponse, StatusSnapshot};
use crate::error::{Result, VintelError};
use crate::investigation::{InvestigationReport, InvestigationRequest};
use crate::mood::MoodPalette;

/// Request/response calls against the conversation backend.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    /// `GET /conversation/status`
    async fn fetch_status(&self) -> Result<StatusSnapshot>;

    /// `GET /conversation/messages`
    async fn fetch_messages(&self) -> Result<Vec<Message>>;

    /// `POST /conversation/start`
    async fn start_conversation(&self) -> Result<StartResponse>;

    /// `POST /investigation`
    async fn request_investigation(
        &self,
        request: &InvestigationRequest,
    ) -> Result<InvestigationReport>;

    /// `GET /conversation/{id}/colors`
    ///
    /// Backends without mood analysis report [`VintelError::NotFound`].
    async fn fetch_palette(&self, conversation_id: &str) -> Result<MoodPalette> {
        Err(VintelError::not_found("palette", conversation_id))
    }
}

/// Stream of decoded push events. Ends when the server closes the channel.
pub type PushStream = BoxStream<'static, Result<FeedEvent>>;

/// A persistent server-push connection.
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Opens the channel. Fails if the server is unreachable or refuses the
    /// subscription.
    async fn subscribe(&self) -> Result<PushStream>;
}
