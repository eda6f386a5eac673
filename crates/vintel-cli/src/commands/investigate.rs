use anyhow::{Context, Result, bail};
use colored::Colorize;
use std::path::{Path, PathBuf};
use vintel_application::renderer::{HtmlRenderer, InvestigationView, text};
use vintel_core::config::VintelConfig;

pub struct InvestigateOptions {
    pub html: bool,
    /// Save the report here instead of printing it.
    pub output: Option<PathBuf>,
}

pub async fn run(
    config: &VintelConfig,
    message_id: &str,
    options: InvestigateOptions,
) -> Result<()> {
    // The investigation needs the message body, so load the feed first.
    let page = super::watch::open_page(config, true)?;
    let mut snapshots = page.subscribe();
    let found = tokio::time::timeout(
        super::watch::first_load_timeout(config),
        snapshots.wait_for(|s| s.find_message(message_id).is_some()),
    )
    .await
    .is_ok_and(|r| r.is_ok());
    if !found {
        tracing::warn!("[Investigate] Message {} not seen in the feed", message_id);
    }

    let subject = page.current().find_message(message_id).cloned();
    let result = page.request_investigation(message_id).await;
    page.close().await;

    let report = match result {
        Ok(report) => report,
        Err(e) if e.is_not_found() => bail!("Message {} is not in the current feed", message_id),
        Err(e) => bail!("Failed to investigate message. {}", e.user_message()),
    };

    let mut view = InvestigationView::from(&report);
    if let Some(subject) = &subject {
        view = view.with_subject(subject);
    }

    if let Some(path) = &options.output {
        let size = export(&view, options.html, path).await?;
        println!("{} {} ({} bytes)", "Saved".green(), path.display(), size);
    } else if options.html {
        println!("{}", HtmlRenderer::new()?.render_investigation(&view)?);
    } else {
        println!("{}", view.title.bright_magenta().bold());
        let body = text::render_investigation(&view);
        print!("{}", body.split_once('\n').map(|(_, rest)| rest).unwrap_or(""));
    }
    Ok(())
}

/// Writes the report as a text summary or an HTML fragment. Returns the
/// number of bytes written.
async fn export(view: &InvestigationView, html: bool, path: &Path) -> Result<usize> {
    let document = if html {
        HtmlRenderer::new()?.render_investigation(view)?
    } else {
        text::export_investigation(view)
    };
    tokio::fs::write(path, &document)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(document.len())
}
