//! Loads, caches and initialises the client configuration file.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use vintel_core::config::VintelConfig;
use vintel_core::{Result, VintelError};

use crate::paths::VintelPaths;
use crate::storage::AtomicTomlFile;

pub const ENV_BASE_URL: &str = "VINTEL_BASE_URL";
pub const ENV_BUSINESS_ID: &str = "VINTEL_BUSINESS_ID";
pub const ENV_PREFER_PUSH: &str = "VINTEL_PREFER_PUSH";

/// Configuration service that loads `config.toml` once and caches the result.
///
/// A missing file is not an error: defaults are used. Environment overrides
/// are applied on top of the file and the merged result is validated.
#[derive(Clone)]
pub struct ConfigService {
    path: PathBuf,
    config: Arc<RwLock<Option<VintelConfig>>>,
}

impl ConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Service for `~/.config/vintel/config.toml`.
    pub fn at_default_location() -> Result<Self> {
        Ok(Self::new(VintelPaths::config_file()?))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Returns the effective configuration, reading the file on first use.
    pub fn get_config(&self) -> Result<VintelConfig> {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let loaded = self.load_config()?;

        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = Some(loaded.clone());
        Ok(loaded)
    }

    /// Forces the next `get_config` to re-read the file.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }

    /// Writes a default config file. Refuses to overwrite an existing one
    /// unless `force` is set.
    pub fn init(&self, force: bool) -> Result<PathBuf> {
        let file = AtomicTomlFile::<VintelConfig>::new(self.path.clone());
        if file.exists() && !force {
            return Err(VintelError::config(format!(
                "{} already exists (use --force to overwrite)",
                self.path.display()
            )));
        }
        file.save(&VintelConfig::default())?;
        self.invalidate_cache();
        tracing::info!("[ConfigService] Wrote default config to {}", self.path.display());
        Ok(self.path.clone())
    }

    fn load_config(&self) -> Result<VintelConfig> {
        let file = AtomicTomlFile::<VintelConfig>::new(self.path.clone());
        let mut config = match file.load()? {
            Some(config) => {
                tracing::debug!("[ConfigService] Loaded {}", self.path.display());
                config
            }
            None => {
                tracing::debug!(
                    "[ConfigService] {} not found, using defaults",
                    self.path.display()
                );
                VintelConfig::default()
            }
        };

        apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }
}

/// Applies `VINTEL_*` overrides read through `lookup`.
pub fn apply_env_overrides<F>(config: &mut VintelConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
        config.base_url = base_url;
    }
    if let Some(business_id) = lookup(ENV_BUSINESS_ID) {
        config.business_id = Some(business_id).filter(|v| !v.trim().is_empty());
    }
    if let Some(raw) = lookup(ENV_PREFER_PUSH) {
        config.transport.prefer_push = match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            other => {
                return Err(VintelError::config(format!(
                    "{} must be a boolean, got '{}'",
                    ENV_PREFER_PUSH, other
                )));
            }
        };
    }
    Ok(())
}
