pub mod config;
pub mod content;
pub mod investigate;
pub mod start;
pub mod watch;

use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;
use vintel_core::config::VintelConfig;
use vintel_core::notification::{Notification, NotificationLevel};
use vintel_interaction::HttpBackend;

pub(crate) fn backend(config: &VintelConfig) -> Result<Arc<HttpBackend>> {
    Ok(Arc::new(HttpBackend::new(config)?))
}

pub(crate) fn print_notifications(notifications: &[Notification]) {
    for n in notifications {
        let line = format!("{}: {}", n.level, n.message);
        let line = match n.level {
            NotificationLevel::Success => line.green(),
            NotificationLevel::Info => line.normal(),
            NotificationLevel::Warning => line.yellow(),
            NotificationLevel::Error => line.red(),
        };
        eprintln!("{}", line);
    }
}
