use anyhow::Result;
use colored::Colorize;
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use vintel_application::renderer::{FeedView, HtmlRenderer, RenderOptions, text};
use vintel_application::{FeedPage, FeedSnapshot};
use vintel_core::clock::SystemClock;
use vintel_core::config::VintelConfig;
use vintel_core::conversation::PushChannel;
use vintel_core::notification::NotificationLevel;
use vintel_interaction::SsePushChannel;

pub struct WatchOptions {
    pub html: bool,
    pub poll_only: bool,
    pub once: bool,
}

pub async fn run(config: &VintelConfig, options: WatchOptions) -> Result<()> {
    let page = open_page(config, options.poll_only)?;
    let mut snapshots = page.subscribe();
    let output = Output::new(options.html, config.feed.newest_first)?;

    if options.once {
        let snapshot = wait_for_first_load(&mut snapshots, config).await;
        output.print(&snapshot)?;
        page.close().await;
        return Ok(());
    }

    output.print(&page.current())?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("[Watch] Interrupted");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                output.print(&snapshot)?;
            }
        }
    }

    page.close().await;
    Ok(())
}

/// Opens a feed page, with push unless disabled here or in the config.
pub(crate) fn open_page(config: &VintelConfig, poll_only: bool) -> Result<FeedPage> {
    let backend = super::backend(config)?;
    let push: Option<Arc<dyn PushChannel>> = if poll_only || !config.transport.prefer_push {
        None
    } else {
        let url = config.endpoint(&config.transport.push_path);
        Some(Arc::new(SsePushChannel::new(
            url,
            config.transport.request_timeout(),
        )?))
    };
    Ok(FeedPage::open(config, backend, push, Arc::new(SystemClock)))
}

/// Upper bound for the initial status and message fetches including retries.
pub(crate) fn first_load_timeout(config: &VintelConfig) -> Duration {
    let attempts = config.retry.max_attempts;
    let backoff = config
        .retry
        .base_delay()
        .saturating_mul(1u32 << attempts.min(16));
    config
        .transport
        .request_timeout()
        .saturating_mul(attempts.saturating_mul(2))
        .saturating_add(backoff)
}

/// Waits until status and the current round's messages have arrived, a load
/// failure was reported, or the timeout passes. Returns the latest snapshot.
pub(crate) async fn wait_for_first_load(
    snapshots: &mut watch::Receiver<Arc<FeedSnapshot>>,
    config: &VintelConfig,
) -> Arc<FeedSnapshot> {
    let max_messages = config.feed.max_messages;
    let loaded = |s: &Arc<FeedSnapshot>| {
        let failed = s
            .notifications
            .iter()
            .any(|n| n.level == NotificationLevel::Error);
        let expected = (s.state.message_count as usize).min(max_messages);
        failed || (s.state.last_updated_utc.is_some() && s.messages.len() >= expected)
    };

    match tokio::time::timeout(first_load_timeout(config), snapshots.wait_for(loaded)).await {
        Ok(Ok(snapshot)) => return snapshot.clone(),
        Ok(Err(_)) => tracing::debug!("[Watch] Session ended before the initial load"),
        Err(_) => tracing::warn!("[Watch] Initial load did not complete in time"),
    }
    snapshots.borrow().clone()
}

struct Output {
    html: Option<HtmlRenderer>,
    options: RenderOptions,
    clear: bool,
}

impl Output {
    fn new(html: bool, newest_first: bool) -> Result<Self> {
        let html = if html { Some(HtmlRenderer::new()?) } else { None };
        let clear = html.is_none() && std::io::stdout().is_terminal();
        Ok(Self {
            html,
            options: RenderOptions { newest_first },
            clear,
        })
    }

    fn print(&self, snapshot: &FeedSnapshot) -> Result<()> {
        let view = FeedView::build(snapshot, self.options);
        match &self.html {
            Some(renderer) => println!("{}", renderer.render_feed(&view)?),
            None => {
                if self.clear {
                    print!("\x1b[2J\x1b[H");
                    println!("{}", "Visitor Intel".bright_magenta().bold());
                }
                let badge = if snapshot.state.active {
                    view.status_label.green().bold()
                } else {
                    view.status_label.yellow().bold()
                };
                let body = text::render_feed(&view);
                // Swap the plain badge for a coloured one.
                let plain_badge = format!("[{}]", view.status_label);
                print!("{}", body.replacen(&plain_badge, &format!("[{}]", badge), 1));
            }
        }
        Ok(())
    }
}
