//! Transient, dismissible user notifications.
//!
//! Every failure that reaches a user-facing boundary ends up here instead of
//! propagating further.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use strum_macros::{AsRefStr, Display};
use uuid::Uuid;

use crate::error::VintelError;

const MAX_NOTIFICATIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub level: NotificationLevel,
    /// The action this is about, as a verb phrase ("generate FAQ Pages").
    pub action: String,
    pub message: String,
    pub created_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NotificationCenter {
    items: VecDeque<Notification>,
    ttl: Duration,
}

impl NotificationCenter {
    pub fn new(ttl: Duration) -> Self {
        Self {
            items: VecDeque::new(),
            ttl,
        }
    }

    pub fn push(
        &mut self,
        level: NotificationLevel,
        action: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> &Notification {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            level,
            action: action.into(),
            message: message.into(),
            created_at_utc: now,
        };
        tracing::debug!(
            "[Notifications] {} {}: {}",
            notification.level,
            notification.action,
            notification.message
        );
        if self.items.len() >= MAX_NOTIFICATIONS {
            self.items.pop_front();
        }
        self.items.push_back(notification);
        &self.items[self.items.len() - 1]
    }

    /// Records a failed action.
    pub fn push_error(
        &mut self,
        action: impl Into<String>,
        error: &VintelError,
        now: DateTime<Utc>,
    ) -> &Notification {
        let action = action.into();
        let message = format!("Failed to {}. {}", action, error.user_message());
        self.push(NotificationLevel::Error, action, message, now)
    }

    /// Removes a notification. Returns whether it existed.
    pub fn dismiss(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Notifications that have not expired yet, oldest first.
    pub fn active(&self, now: DateTime<Utc>) -> Vec<Notification> {
        self.items
            .iter()
            .filter(|n| now - n.created_at_utc < self.ttl)
            .cloned()
            .collect()
    }

    /// Drops expired notifications.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.items.retain(|n| now - n.created_at_utc < ttl);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(Duration::seconds(5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_notifications_expire() {
        let mut center = NotificationCenter::new(Duration::seconds(5));
        center.push(NotificationLevel::Info, "Refresh", "Up to date", t0());

        assert_eq!(center.active(t0() + Duration::seconds(4)).len(), 1);
        assert!(center.active(t0() + Duration::seconds(5)).is_empty());

        center.prune(t0() + Duration::seconds(6));
        assert!(center.is_empty());
    }

    #[test]
    fn test_dismiss() {
        let mut center = NotificationCenter::default();
        let id = center
            .push(NotificationLevel::Success, "generate FAQ Pages", "Done", t0())
            .id
            .clone();
        assert!(center.dismiss(&id));
        assert!(!center.dismiss(&id));
    }

    #[test]
    fn test_error_names_the_action() {
        let mut center = NotificationCenter::default();
        let err = VintelError::server(500, "Generation failed");
        let n = center.push_error("generate FAQ Pages", &err, t0());
        assert_eq!(n.level, NotificationLevel::Error);
        assert_eq!(n.message, "Failed to generate FAQ Pages. Generation failed");
    }

    #[test]
    fn test_queue_is_bounded() {
        let mut center = NotificationCenter::default();
        for i in 0..25 {
            center.push(NotificationLevel::Info, "Tick", i.to_string(), t0());
        }
        let active = center.active(t0());
        assert_eq!(active.len(), MAX_NOTIFICATIONS);
        assert_eq!(active[0].message, "15");
    }
}
