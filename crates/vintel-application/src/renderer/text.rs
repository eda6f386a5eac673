//! Plain terminal rendering of the same view models.

use std::fmt::Write;

use super::view::{DashboardView, FeedView, InvestigationView, NotificationView};

pub fn render_feed(view: &FeedView) -> String {
    let mut out = String::new();
    render_notifications(&mut out, &view.notifications);

    let _ = writeln!(out, "[{}] {}", view.status_label, view.status_text);
    if let Some(line) = &view.next_event_line {
        let _ = writeln!(out, "{}", line);
    }
    let _ = writeln!(out, "{} {}", view.countdown_caption, view.countdown);
    let _ = writeln!(
        out,
        "Round {}: {}/{} messages ({}%)",
        view.round_number, view.message_count, view.round_capacity, view.progress_percent
    );

    if !view.providers.is_empty() {
        let providers: Vec<String> = view
            .providers
            .iter()
            .map(|p| format!("{} {}", p.label, if p.available { "up" } else { "down" }))
            .collect();
        let _ = writeln!(out, "Providers: {}", providers.join(", "));
    }
    if let Some(mood) = &view.mood {
        let _ = writeln!(out, "Mood: {} ({}%)", mood.label, mood.intensity_percent);
    }
    if let Some(connectivity) = &view.connectivity {
        let _ = writeln!(out, "Updates: {}", connectivity);
    }

    let _ = writeln!(out);
    if view.messages.is_empty() {
        let _ = writeln!(out, "No messages yet");
    }
    for m in &view.messages {
        let _ = writeln!(out, "{} {} [{}]", m.time, m.display_name, m.id);
        let _ = writeln!(out, "  {}", m.text);
    }
    out
}

pub fn render_dashboard(view: &DashboardView) -> String {
    let mut out = String::new();
    render_notifications(&mut out, &view.notifications);
    for card in &view.modules {
        let _ = write!(out, "{:<16} {:<14}", card.name, card.status_label);
        if let Some(at) = &card.generated_at {
            let _ = write!(out, " {}", at);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "  {} ({})", card.description, card.module_type);
    }
    out
}

pub fn render_investigation(view: &InvestigationView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.title);
    let _ = writeln!(
        out,
        "Confidence: {}% | Message {} | {}",
        view.confidence_percent, view.subject_message_id, view.generated_at
    );
    for section in &view.sections {
        let _ = writeln!(out);
        let _ = writeln!(out, "## {}", section.title);
        let _ = writeln!(out, "{}", section.content);
    }
    if !view.recommendations.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## Recommendations");
        for r in &view.recommendations {
            let _ = writeln!(out, "- {}", r);
        }
    }
    out
}

/// Standalone plain-text document for saving a report to disk.
pub fn export_investigation(view: &InvestigationView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Investigation Summary");
    let _ = writeln!(out, "=====================");
    let _ = writeln!(out);
    let _ = writeln!(out, "Title: {}", view.title);
    let _ = writeln!(out, "Generated: {}", view.generated_at);
    if let Some(by) = &view.analyzed_by {
        let _ = writeln!(out, "Analyzed by: {}", by);
    }
    let _ = writeln!(out, "Confidence: {}%", view.confidence_percent);

    for section in &view.sections {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", section.title);
        let _ = writeln!(out, "{}", "=".repeat(section.title.chars().count()));
        let _ = writeln!(out, "{}", section.content);
    }
    if !view.recommendations.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Recommendations");
        let _ = writeln!(out, "===============");
        for r in &view.recommendations {
            let _ = writeln!(out, "- {}", r);
        }
    }
    if let Some(original) = &view.original_message {
        let _ = writeln!(out);
        let _ = writeln!(out, "Original Message:");
        let _ = writeln!(out, "\"{}\"", original);
    }
    out
}

fn render_notifications(out: &mut String, notifications: &[NotificationView]) {
    for n in notifications {
        let _ = writeln!(out, "({}) {}", n.level, n.message);
    }
    if !notifications.is_empty() {
        let _ = writeln!(out);
    }
}
