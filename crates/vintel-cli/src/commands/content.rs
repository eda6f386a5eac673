use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use strum::IntoEnumIterator;
use vintel_application::renderer::{DashboardView, text};
use vintel_application::{AssumeYes, Confirmer, Dashboard};
use vintel_core::clock::SystemClock;
use vintel_core::config::VintelConfig;
use vintel_core::content::{
    ContentDocument, ContentDownload, ContentModuleStatus, ContentModuleType,
};
use vintel_core::notification::NotificationCenter;

/// Accepts the wire name (`localSeo`) as well as `local-seo` or `local_seo`.
pub fn parse_module(s: &str) -> std::result::Result<ContentModuleType, String> {
    if let Ok(module) = ContentModuleType::from_str(s) {
        return Ok(module);
    }
    let wanted = normalize(s);
    ContentModuleType::iter()
        .find(|m| normalize(m.as_ref()) == wanted)
        .ok_or_else(|| {
            let known: Vec<String> = ContentModuleType::iter().map(|m| m.to_string()).collect();
            format!("unknown content module '{}' (expected one of: {})", s, known.join(", "))
        })
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Asks on the terminal; anything other than y/yes declines.
struct StdinConfirmer;

#[async_trait]
impl Confirmer for StdinConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || {
            eprint!("{} [y/N] ", prompt.yellow());
            let _ = std::io::stderr().flush();
            let mut answer = String::new();
            if std::io::stdin().read_line(&mut answer).is_err() {
                return false;
            }
            matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
        })
        .await
        .unwrap_or(false)
    }
}

fn dashboard(config: &VintelConfig) -> Result<Dashboard> {
    let backend = super::backend(config)?;
    Ok(Dashboard::new(
        backend,
        Arc::new(SystemClock),
        NotificationCenter::new(config.feed.notification_ttl()),
    ))
}

/// A new dashboard starts with every module unknown; actions are checked
/// against the server's status, so load it first.
async fn load(dashboard: &Dashboard, module: ContentModuleType) -> Result<()> {
    if let Err(e) = dashboard.refresh_status(module).await {
        bail!(
            "Failed to load {} status. {}",
            module.display_name(),
            e.user_message()
        );
    }
    Ok(())
}

async fn generate_with(
    dashboard: &Dashboard,
    module: ContentModuleType,
) -> Result<ContentModuleStatus> {
    load(dashboard, module).await?;
    let result = dashboard.generate(module).await;
    super::print_notifications(&dashboard.notifications().await);
    result.with_context(|| format!("generate {}", module))
}

async fn view_with(dashboard: &Dashboard, module: ContentModuleType) -> Result<ContentDocument> {
    load(dashboard, module).await?;
    let result = dashboard.view(module).await;
    super::print_notifications(&dashboard.notifications().await);
    result.with_context(|| format!("view {}", module))
}

async fn download_with(
    dashboard: &Dashboard,
    module: ContentModuleType,
) -> Result<ContentDownload> {
    load(dashboard, module).await?;
    let result = dashboard.download(module).await;
    super::print_notifications(&dashboard.notifications().await);
    result.with_context(|| format!("download {}", module))
}

async fn delete_with(
    dashboard: &Dashboard,
    module: ContentModuleType,
    confirmer: &dyn Confirmer,
) -> Result<bool> {
    load(dashboard, module).await?;
    let result = dashboard.delete(module, confirmer).await;
    super::print_notifications(&dashboard.notifications().await);
    result.with_context(|| format!("delete {}", module))
}

pub async fn status(config: &VintelConfig) -> Result<()> {
    let dashboard = dashboard(config)?;
    dashboard.load_all().await;
    let view = DashboardView::build(&dashboard.modules().await, &dashboard.notifications().await);
    print!("{}", text::render_dashboard(&view));
    Ok(())
}

pub async fn generate(config: &VintelConfig, module: ContentModuleType) -> Result<()> {
    let status = generate_with(&dashboard(config)?, module).await?;
    println!("{}: {}", module.display_name().bold(), status.status);
    Ok(())
}

pub async fn view(config: &VintelConfig, module: ContentModuleType) -> Result<()> {
    let document = view_with(&dashboard(config)?, module).await?;
    println!("{}", document.title.bright_magenta().bold());
    if let Some(at) = document.generated_at_utc {
        println!("{}", format!("Generated {}", at.format("%Y-%m-%d %H:%M UTC")).dimmed());
    }
    println!();
    println!("{}", document.content);
    Ok(())
}

pub async fn download(
    config: &VintelConfig,
    module: ContentModuleType,
    output: Option<PathBuf>,
) -> Result<()> {
    let download = download_with(&dashboard(config)?, module).await?;
    let path = output.unwrap_or_else(|| PathBuf::from(&download.file_name));
    tokio::fs::write(&path, &download.bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "{} {} ({} bytes)",
        "Saved".green(),
        path.display(),
        download.bytes.len()
    );
    Ok(())
}

pub async fn delete(config: &VintelConfig, module: ContentModuleType, yes: bool) -> Result<()> {
    let confirmer: &dyn Confirmer = if yes { &AssumeYes } else { &StdinConfirmer };
    if !delete_with(&dashboard(config)?, module, confirmer).await? {
        println!("Nothing deleted");
    }
    Ok(())
}
