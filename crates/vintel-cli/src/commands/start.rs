use anyhow::{Result, anyhow, bail};
use colored::Colorize;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use vintel_application::{FeedActions, FeedSession, SessionCommand};
use vintel_core::clock::SystemClock;
use vintel_core::config::{FeedSettings, VintelConfig};
use vintel_core::conversation::{ConversationApi, StartResponse};

pub async fn run(config: &VintelConfig) -> Result<()> {
    let backend = super::backend(config)?;
    let response = start_with(backend, &config.feed).await?;
    println!("{}", response.message.green());
    Ok(())
}

/// Runs the manual start through the feed actions without a live page.
/// A reply with `success: false` is an error.
async fn start_with(api: Arc<dyn ConversationApi>, feed: &FeedSettings) -> Result<StartResponse> {
    let session = FeedSession::new(feed, Arc::new(SystemClock));
    let (_publish, snapshots) = watch::channel(Arc::new(session.snapshot()));
    let (commands, mut outcomes) = mpsc::channel(4);
    let actions = FeedActions::new(api, snapshots, commands);

    let result = actions.start_conversation_manually().await;
    drop(actions);
    while let Some(command) = outcomes.recv().await {
        if let SessionCommand::Notify { level, message, .. } = command {
            tracing::debug!("[Start] {}: {}", level, message);
        }
    }

    let response =
        result.map_err(|e| anyhow!("Failed to start conversation. {}", e.user_message()))?;
    if !response.success {
        bail!("Failed to start conversation. {}", response.message);
    }
    Ok(response)
}
