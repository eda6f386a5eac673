//! Conversation feed domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of messages in one conversation round.
pub const DEFAULT_ROUND_CAPACITY: u32 = 16;

/// Number of messages the feed keeps around.
pub const DEFAULT_MAX_MESSAGES: usize = 20;

/// A single message posted by a provider's agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub provider_id: String,
    pub display_name: String,
    pub text: String,
    pub created_at_utc: DateTime<Utc>,
    pub round_number: u32,
}

/// Full state update as delivered by `GET /conversation/status` or a
/// `state_change` push event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub active: bool,
    pub round_number: u32,
    pub message_count: u32,
    #[serde(default)]
    pub next_event_time_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub provider_availability: BTreeMap<String, bool>,
    /// When the server produced this snapshot. Filled with the receipt time
    /// when the backend does not send one.
    #[serde(default)]
    pub server_time_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Payload of `conversation_started` / `conversation_completed` events.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LifecyclePayload {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub round_number: Option<u32>,
    #[serde(default)]
    pub next_event_time_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub server_time_utc: Option<DateTime<Utc>>,
}

/// Last-known server state of the conversation.
///
/// `message_count + messages_remaining` always equals `round_capacity`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    pub active: bool,
    pub round_number: u32,
    pub message_count: u32,
    pub messages_remaining: u32,
    pub round_capacity: u32,
    pub next_event_time_utc: Option<DateTime<Utc>>,
    pub provider_availability: BTreeMap<String, bool>,
    pub conversation_id: Option<String>,
    /// Server timestamp of the last applied snapshot or lifecycle event
    /// that carried one.
    pub last_server_time_utc: Option<DateTime<Utc>>,
    /// Local receive time of the last applied snapshot or lifecycle event.
    pub last_updated_utc: Option<DateTime<Utc>>,
}

impl ConversationState {
    pub fn new(round_capacity: u32) -> Self {
        Self {
            active: false,
            round_number: 1,
            message_count: 0,
            messages_remaining: round_capacity,
            round_capacity,
            next_event_time_utc: None,
            provider_availability: BTreeMap::new(),
            conversation_id: None,
            last_server_time_utc: None,
            last_updated_utc: None,
        }
    }

    /// Sets the counter and keeps `messages_remaining` consistent with it.
    pub fn set_message_count(&mut self, count: u32) {
        self.message_count = count.min(self.round_capacity);
        self.messages_remaining = self.round_capacity - self.message_count;
    }

    /// Progress through the current round, 0..=100.
    pub fn progress_percent(&self) -> u8 {
        if self.round_capacity == 0 {
            return 0;
        }
        ((self.message_count as u64 * 100) / self.round_capacity as u64).min(100) as u8
    }

    pub fn available_provider_count(&self) -> usize {
        self.provider_availability.values().filter(|up| **up).count()
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new(DEFAULT_ROUND_CAPACITY)
    }
}

/// Backend answer to a manual conversation start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StartResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}
