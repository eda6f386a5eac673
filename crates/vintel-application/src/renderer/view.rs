//! View models: everything a template needs, already formatted.
//!
//! Building a view never reads the clock or the network; the same inputs
//! always give the same view.

use chrono::{DateTime, Utc};
use serde::Serialize;
use vintel_core::content::{ContentAction, ContentStatus};
use vintel_core::conversation::Message;
use vintel_core::countdown::CountdownMode;
use vintel_core::investigation::InvestigationReport;
use vintel_core::mood::MoodPalette;
use vintel_core::notification::{Notification, NotificationLevel};
use vintel_core::provider;

use crate::dashboard::ModuleEntry;
use crate::session::FeedSnapshot;

pub const LIVE_TEXT: &str = "AI Agents Are Having Live Discussion";
pub const WAITING_TEXT: &str = "Waiting for Next AI Discussion";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub newest_first: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { newest_first: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedView {
    pub live: bool,
    /// "LIVE" or "WAITING".
    pub status_label: &'static str,
    pub status_text: &'static str,
    pub next_event_line: Option<String>,
    pub countdown: String,
    pub countdown_mode: CountdownMode,
    pub countdown_caption: &'static str,
    pub round_number: u32,
    pub message_count: u32,
    pub messages_remaining: u32,
    pub round_capacity: u32,
    pub progress_percent: u8,
    pub providers: Vec<ProviderView>,
    pub messages: Vec<MessageView>,
    pub notifications: Vec<NotificationView>,
    pub connectivity: Option<String>,
    pub mood: Option<MoodView>,
}

/// Conversation theme, ready for a `style` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoodView {
    pub label: String,
    pub intensity_percent: u8,
    pub style: String,
}

impl From<&MoodPalette> for MoodView {
    fn from(palette: &MoodPalette) -> Self {
        Self {
            label: palette.mood_label(),
            intensity_percent: palette.intensity.round().clamp(0.0, 100.0) as u8,
            style: palette.css_variables(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderView {
    pub id: String,
    pub label: String,
    pub available: bool,
    pub color_class: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageView {
    pub id: String,
    pub provider_id: String,
    pub display_name: String,
    pub text: String,
    pub time: String,
    pub round_number: u32,
    pub color_class: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    pub id: String,
    pub level: NotificationLevel,
    pub message: String,
}

impl From<&Notification> for NotificationView {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id.clone(),
            level: n.level,
            message: n.message.clone(),
        }
    }
}

impl FeedView {
    pub fn build(snapshot: &FeedSnapshot, options: RenderOptions) -> Self {
        let state = &snapshot.state;
        let tick = &snapshot.countdown;

        let mut messages: Vec<MessageView> = snapshot
            .messages
            .iter()
            .map(|m| MessageView {
                id: m.id.clone(),
                provider_id: m.provider_id.clone(),
                display_name: m.display_name.clone(),
                text: m.text.clone(),
                time: m.created_at_utc.format("%H:%M:%S").to_string(),
                round_number: m.round_number,
                color_class: provider::color_class(&m.provider_id),
            })
            .collect();
        if options.newest_first {
            messages.reverse();
        }

        let providers = state
            .provider_availability
            .iter()
            .map(|(id, available)| ProviderView {
                id: id.clone(),
                label: provider::label(id),
                available: *available,
                color_class: provider::color_class(id),
            })
            .collect();

        Self {
            live: state.active,
            status_label: if state.active { "LIVE" } else { "WAITING" },
            status_text: if state.active { LIVE_TEXT } else { WAITING_TEXT },
            next_event_line: state.next_event_time_utc.map(next_event_line),
            countdown: tick.display(),
            countdown_mode: tick.mode,
            countdown_caption: countdown_caption(tick.mode),
            round_number: state.round_number,
            message_count: state.message_count,
            messages_remaining: state.messages_remaining,
            round_capacity: state.round_capacity,
            progress_percent: state.progress_percent(),
            providers,
            messages,
            notifications: snapshot.notifications.iter().map(Into::into).collect(),
            connectivity: snapshot.connectivity.map(|c| c.to_string()),
            mood: snapshot.palette.as_ref().map(MoodView::from),
        }
    }
}

/// "Next conversation at 3:05 PM UTC"
pub fn next_event_line(at: DateTime<Utc>) -> String {
    format!("Next conversation at {} UTC", at.format("%-I:%M %p"))
}

fn countdown_caption(mode: CountdownMode) -> &'static str {
    match mode {
        CountdownMode::Counting => "Next discussion in",
        CountdownMode::Starting => "Starting soon...",
        CountdownMode::Live => "Live now",
        CountdownMode::Unscheduled => "No discussion scheduled",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub modules: Vec<ModuleCard>,
    pub notifications: Vec<NotificationView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleCard {
    pub module_type: String,
    pub name: &'static str,
    pub description: &'static str,
    pub status: String,
    pub status_label: &'static str,
    pub generated_at: Option<String>,
    pub busy: bool,
    /// Buttons offered in the current status.
    pub actions: Vec<String>,
}

impl DashboardView {
    pub fn build(modules: &[ModuleEntry], notifications: &[Notification]) -> Self {
        Self {
            modules: modules.iter().map(ModuleCard::from).collect(),
            notifications: notifications.iter().map(Into::into).collect(),
        }
    }
}

impl From<&ModuleEntry> for ModuleCard {
    fn from(entry: &ModuleEntry) -> Self {
        let actions: &[ContentAction] = match (entry.status, entry.in_flight) {
            (_, Some(_)) => &[],
            (ContentStatus::NotGenerated, None) => &[ContentAction::Generate],
            (ContentStatus::Generating, None) => &[],
            (ContentStatus::Generated, None) => &[
                ContentAction::View,
                ContentAction::Download,
                ContentAction::Delete,
            ],
        };
        Self {
            module_type: entry.module_type.to_string(),
            name: entry.module_type.display_name(),
            description: entry.module_type.description(),
            status: entry.status.to_string(),
            status_label: match entry.status {
                ContentStatus::NotGenerated => "Not generated",
                ContentStatus::Generating => "Generating...",
                ContentStatus::Generated => "Generated",
            },
            generated_at: entry
                .generated_at_utc
                .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string()),
            busy: entry.in_flight.is_some() || entry.status == ContentStatus::Generating,
            actions: actions.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvestigationView {
    pub title: String,
    pub subject_message_id: String,
    pub confidence_percent: u8,
    pub sections: Vec<SectionView>,
    pub recommendations: Vec<String>,
    pub generated_at: String,
    /// Provider label of the investigated message, when known.
    pub analyzed_by: Option<String>,
    pub original_message: Option<String>,
}

impl InvestigationView {
    /// Attaches the investigated message so exports can quote it.
    pub fn with_subject(mut self, message: &Message) -> Self {
        self.analyzed_by = Some(provider::label(&message.provider_id));
        self.original_message = Some(message.text.clone());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionView {
    pub title: String,
    pub content: String,
}

impl From<&InvestigationReport> for InvestigationView {
    fn from(report: &InvestigationReport) -> Self {
        Self {
            title: report.title.clone(),
            subject_message_id: report.subject_message_id.clone(),
            confidence_percent: report.confidence_percent,
            sections: report
                .sections
                .iter()
                .map(|s| SectionView {
                    title: s.title.clone(),
                    content: s.content.clone(),
                })
                .collect(),
            recommendations: report.recommendations.clone(),
            generated_at: report
                .generated_at_utc
                .format("%Y-%m-%d %H:%M UTC")
                .to_string(),
            analyzed_by: None,
            original_message: None,
        }
    }
}
