//! State Store: last-known server state plus the bounded message list.
//!
//! Mutated from a single task only (the feed session loop), so it is a plain
//! struct without interior locking. Conflicting updates are ordered by their
//! server timestamp: anything older than what was already applied is dropped
//! with [`VintelError::StaleUpdate`]. Updates without a server timestamp are
//! ordered by local receive time, separately, since the two clocks need not
//! agree.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

use super::event::FeedEvent;
use super::model::{
    ConversationState, DEFAULT_MAX_MESSAGES, DEFAULT_ROUND_CAPACITY, LifecyclePayload, Message,
    StatusSnapshot,
};
use crate::error::{Result, VintelError};

/// What an applied update changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    /// Counters / availability / schedule were replaced.
    State,
    /// The message list changed.
    Messages,
    /// Nothing to do (e.g. a duplicate message).
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct StateStore {
    state: ConversationState,
    messages: VecDeque<Message>,
    max_messages: usize,
    /// Receive time of the last applied update that had no server stamp.
    last_local_stamp: Option<DateTime<Utc>>,
}

impl StateStore {
    pub fn new(round_capacity: u32, max_messages: usize) -> Self {
        Self {
            state: ConversationState::new(round_capacity),
            messages: VecDeque::with_capacity(max_messages),
            max_messages: max_messages.max(1),
            last_local_stamp: None,
        }
    }

    /// Current conversation state.
    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Messages in chronological order, oldest first.
    pub fn messages(&self) -> impl DoubleEndedIterator<Item = &Message> + ExactSizeIterator {
        self.messages.iter()
    }

    pub fn message_len(&self) -> usize {
        self.messages.len()
    }

    pub fn find_message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Applies a full status snapshot.
    ///
    /// Counters and provider availability are replaced wholesale. A snapshot
    /// older than the last applied server timestamp is rejected as stale.
    /// A snapshot without one is only ordered against other unstamped
    /// updates, by `received_at`.
    pub fn apply_server_snapshot(
        &mut self,
        snapshot: StatusSnapshot,
        received_at: DateTime<Utc>,
    ) -> Result<StoreChange> {
        self.check_fresh(snapshot.server_time_utc, received_at, "status snapshot")?;

        self.state.active = snapshot.active;
        self.state.round_number = snapshot.round_number;
        self.state.set_message_count(snapshot.message_count);
        self.state.next_event_time_utc = snapshot.next_event_time_utc;
        self.state.provider_availability = snapshot.provider_availability;
        if snapshot.conversation_id.is_some() {
            self.state.conversation_id = snapshot.conversation_id;
        }
        self.record_stamp(snapshot.server_time_utc, received_at);

        tracing::debug!(
            "[StateStore] Snapshot applied: active={}, round={}, count={}",
            self.state.active,
            self.state.round_number,
            self.state.message_count
        );
        Ok(StoreChange::State)
    }

    /// Applies a conversation start/finish event.
    pub fn apply_lifecycle(
        &mut self,
        started: bool,
        payload: LifecyclePayload,
        received_at: DateTime<Utc>,
    ) -> Result<StoreChange> {
        self.check_fresh(payload.server_time_utc, received_at, "lifecycle event")?;

        self.state.active = started;
        if started {
            self.state.set_message_count(0);
            if let Some(round) = payload.round_number {
                self.state.round_number = round;
            }
        }
        if payload.conversation_id.is_some() {
            self.state.conversation_id = payload.conversation_id;
        }
        if payload.next_event_time_utc.is_some() {
            self.state.next_event_time_utc = payload.next_event_time_utc;
        }
        self.record_stamp(payload.server_time_utc, received_at);

        tracing::info!(
            "[StateStore] Conversation {}",
            if started { "started" } else { "completed" }
        );
        Ok(StoreChange::State)
    }

    /// Inserts a message at its chronological position and trims the list
    /// to the configured size, evicting the oldest first.
    pub fn apply_new_message(&mut self, message: Message) -> Result<StoreChange> {
        if self.find_message(&message.id).is_some() {
            return Ok(StoreChange::Unchanged);
        }

        let full = self.messages.len() >= self.max_messages;
        if full
            && self
                .messages
                .front()
                .is_some_and(|oldest| message.created_at_utc < oldest.created_at_utc)
        {
            return Err(VintelError::stale("message"));
        }

        // Equal timestamps keep arrival order.
        let position = self
            .messages
            .iter()
            .rposition(|m| m.created_at_utc <= message.created_at_utc)
            .map_or(0, |i| i + 1);
        self.messages.insert(position, message);

        while self.messages.len() > self.max_messages {
            self.messages.pop_front();
        }
        Ok(StoreChange::Messages)
    }

    /// Routes a feed event to the matching apply method.
    pub fn apply_feed_event(
        &mut self,
        event: FeedEvent,
        received_at: DateTime<Utc>,
    ) -> Result<StoreChange> {
        match event {
            FeedEvent::NewMessage(message) => self.apply_new_message(message),
            FeedEvent::StateChange(snapshot) => self.apply_server_snapshot(snapshot, received_at),
            FeedEvent::ConversationStarted(payload) => {
                self.apply_lifecycle(true, payload, received_at)
            }
            FeedEvent::ConversationCompleted(payload) => {
                self.apply_lifecycle(false, payload, received_at)
            }
        }
    }

    fn check_fresh(
        &self,
        server_stamp: Option<DateTime<Utc>>,
        received_at: DateTime<Utc>,
        entity: &'static str,
    ) -> Result<()> {
        let (stamp, last) = match server_stamp {
            Some(stamp) => (stamp, self.state.last_server_time_utc),
            None => (received_at, self.last_local_stamp),
        };
        match last {
            Some(last) if stamp < last => {
                tracing::debug!(
                    "[StateStore] Dropping stale {}: {} < {}",
                    entity,
                    stamp,
                    last
                );
                Err(VintelError::stale(entity))
            }
            _ => Ok(()),
        }
    }

    fn record_stamp(&mut self, server_stamp: Option<DateTime<Utc>>, received_at: DateTime<Utc>) {
        match server_stamp {
            Some(stamp) => self.state.last_server_time_utc = Some(stamp),
            None => self.last_local_stamp = Some(received_at),
        }
        self.state.last_updated_utc = Some(received_at);
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(DEFAULT_ROUND_CAPACITY, DEFAULT_MAX_MESSAGES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn snapshot(count: u32, at: DateTime<Utc>) -> StatusSnapshot {
        StatusSnapshot {
            active: false,
            round_number: 1,
            message_count: count,
            next_event_time_utc: None,
            provider_availability: Default::default(),
            server_time_utc: Some(at),
            conversation_id: None,
        }
    }

    fn message(id: &str, at: DateTime<Utc>) -> Message {
        Message {
            id: id.to_string(),
            provider_id: "openai".to_string(),
            display_name: "Business AI Assistant".to_string(),
            text: format!("message {}", id),
            created_at_utc: at,
            round_number: 1,
        }
    }

    #[test]
    fn test_increasing_snapshots_keep_last_count() {
        let mut store = StateStore::default();
        for (i, count) in [1u32, 4, 2, 9, 7].iter().enumerate() {
            store
                .apply_server_snapshot(snapshot(*count, t0() + Duration::seconds(i as i64)), t0())
                .unwrap();
        }
        assert_eq!(store.state().message_count, 7);
        assert_eq!(store.state().messages_remaining, 9);
    }

    #[test]
    fn test_older_snapshot_is_stale() {
        let mut store = StateStore::default();
        store
            .apply_server_snapshot(snapshot(5, t0() + Duration::seconds(10)), t0())
            .unwrap();

        let err = store.apply_server_snapshot(snapshot(2, t0()), t0()).unwrap_err();
        assert!(err.is_stale());
        assert_eq!(store.state().message_count, 5);
    }

    #[test]
    fn test_equal_timestamp_applies() {
        let mut store = StateStore::default();
        store.apply_server_snapshot(snapshot(5, t0()), t0()).unwrap();
        store.apply_server_snapshot(snapshot(6, t0()), t0()).unwrap();
        assert_eq!(store.state().message_count, 6);
    }

    #[test]
    fn test_snapshot_replaces_provider_availability() {
        let mut store = StateStore::default();
        let mut first = snapshot(0, t0());
        first.provider_availability.insert("openai".into(), true);
        first.provider_availability.insert("gemini".into(), true);
        store.apply_server_snapshot(first, t0()).unwrap();

        let mut second = snapshot(0, t0() + Duration::seconds(1));
        second.provider_availability.insert("anthropic".into(), false);
        store.apply_server_snapshot(second, t0()).unwrap();

        let availability = &store.state().provider_availability;
        assert_eq!(availability.len(), 1);
        assert_eq!(availability.get("anthropic"), Some(&false));
    }

    #[test]
    fn test_message_list_is_bounded_and_evicts_oldest() {
        let mut store = StateStore::new(16, 20);
        for i in 0..45 {
            store
                .apply_new_message(message(&format!("m{}", i), t0() + Duration::seconds(i)))
                .unwrap();
            assert!(store.message_len() <= 20);
        }
        assert_eq!(store.message_len(), 20);
        assert_eq!(store.messages().next().unwrap().id, "m25");
        assert_eq!(store.messages().last().unwrap().id, "m44");
    }

    #[test]
    fn test_duplicate_message_is_ignored() {
        let mut store = StateStore::default();
        assert_eq!(
            store.apply_new_message(message("m1", t0())).unwrap(),
            StoreChange::Messages
        );
        assert_eq!(
            store.apply_new_message(message("m1", t0())).unwrap(),
            StoreChange::Unchanged
        );
        assert_eq!(store.message_len(), 1);
    }

    #[test]
    fn test_late_message_lands_in_chronological_position() {
        let mut store = StateStore::default();
        store.apply_new_message(message("a", t0())).unwrap();
        store
            .apply_new_message(message("c", t0() + Duration::seconds(20)))
            .unwrap();
        store
            .apply_new_message(message("b", t0() + Duration::seconds(10)))
            .unwrap();

        let ids: Vec<_> = store.messages().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_message_older_than_full_window_is_stale() {
        let mut store = StateStore::new(16, 2);
        store
            .apply_new_message(message("b", t0() + Duration::seconds(10)))
            .unwrap();
        store
            .apply_new_message(message("c", t0() + Duration::seconds(20)))
            .unwrap();

        let err = store.apply_new_message(message("a", t0())).unwrap_err();
        assert!(err.is_stale());
        assert_eq!(store.message_len(), 2);
    }

    #[test]
    fn test_lifecycle_start_resets_round_counters() {
        let mut store = StateStore::default();
        store.apply_server_snapshot(snapshot(16, t0()), t0()).unwrap();

        let payload = LifecyclePayload {
            conversation_id: Some("conv-7".into()),
            round_number: Some(2),
            next_event_time_utc: None,
            server_time_utc: Some(t0() + Duration::seconds(1)),
        };
        store.apply_lifecycle(true, payload, t0()).unwrap();

        let state = store.state();
        assert!(state.active);
        assert_eq!(state.round_number, 2);
        assert_eq!(state.message_count, 0);
        assert_eq!(state.messages_remaining, 16);
        assert_eq!(state.conversation_id.as_deref(), Some("conv-7"));
    }

    #[test]
    fn test_snapshot_without_conversation_id_keeps_the_known_one() {
        let mut store = StateStore::default();
        let mut first = snapshot(3, t0());
        first.conversation_id = Some("conv-7".into());
        store.apply_server_snapshot(first, t0()).unwrap();

        store
            .apply_server_snapshot(snapshot(4, t0() + Duration::seconds(1)), t0())
            .unwrap();
        assert_eq!(store.state().conversation_id.as_deref(), Some("conv-7"));
    }

    #[test]
    fn test_unstamped_snapshot_is_not_ordered_against_server_clock() {
        let mut store = StateStore::default();
        // Server clock runs five minutes ahead of ours.
        let payload = LifecyclePayload {
            server_time_utc: Some(t0() + Duration::minutes(5)),
            ..Default::default()
        };
        store.apply_lifecycle(true, payload, t0()).unwrap();

        let mut polled = snapshot(4, t0());
        polled.server_time_utc = None;
        store
            .apply_server_snapshot(polled, t0() + Duration::seconds(30))
            .unwrap();

        assert_eq!(store.state().message_count, 4);
        assert_eq!(store.state().last_server_time_utc, Some(t0() + Duration::minutes(5)));
        assert_eq!(store.state().last_updated_utc, Some(t0() + Duration::seconds(30)));
    }

    #[test]
    fn test_unstamped_snapshots_follow_receive_order() {
        let mut store = StateStore::default();
        let mut later = snapshot(6, t0());
        later.server_time_utc = None;
        store
            .apply_server_snapshot(later, t0() + Duration::seconds(10))
            .unwrap();

        let mut earlier = snapshot(2, t0());
        earlier.server_time_utc = None;
        let err = store.apply_server_snapshot(earlier, t0()).unwrap_err();
        assert!(err.is_stale());
        assert_eq!(store.state().message_count, 6);
    }

    #[test]
    fn test_lifecycle_completion_adopts_next_event_time() {
        let mut store = StateStore::default();
        let next = t0() + Duration::minutes(5);
        let payload = LifecyclePayload {
            next_event_time_utc: Some(next),
            ..Default::default()
        };
        store.apply_lifecycle(false, payload, t0()).unwrap();
        assert!(!store.state().active);
        assert_eq!(store.state().next_event_time_utc, Some(next));
    }
}
