use anyhow::{Context, Result};
use colored::Colorize;
use vintel_core::config::VintelConfig;
use vintel_infrastructure::ConfigService;

pub fn init(service: &ConfigService, force: bool) -> Result<()> {
    let path = service.init(force)?;
    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}

/// Prints the effective config, after env overrides.
pub fn show(service: &ConfigService, config: &VintelConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("failed to serialize config")?;
    let source = if service.path().exists() {
        service.path().display().to_string()
    } else {
        format!("{} (not found, using defaults)", service.path().display())
    };
    println!("{}", format!("# {}", source).dimmed());
    print!("{}", rendered);
    Ok(())
}
