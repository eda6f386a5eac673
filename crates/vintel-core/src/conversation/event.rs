use serde::{Deserialize, Serialize};

use super::model::{LifecyclePayload, Message, StatusSnapshot};

/// Uniform feed event, whether it came from the push channel or a poll.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum FeedEvent {
    NewMessage(Message),
    StateChange(StatusSnapshot),
    ConversationStarted(LifecyclePayload),
    ConversationCompleted(LifecyclePayload),
}

impl FeedEvent {
    /// Wire name of the event, as used in the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewMessage(_) => "new_message",
            Self::StateChange(_) => "state_change",
            Self::ConversationStarted(_) => "conversation_started",
            Self::ConversationCompleted(_) => "conversation_completed",
        }
    }
}
