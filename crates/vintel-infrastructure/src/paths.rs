//! Where the client keeps its files.
//!
//! ```text
//! ~/.config/vintel/
//! ├── config.toml        # Client configuration
//! └── logs/              # Daily rolling log files
//!     └── vintel.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;
use vintel_core::{Result, VintelError};

const APP_DIR: &str = "vintel";

pub struct VintelPaths;

impl VintelPaths {
    /// Platform config directory with `vintel` appended.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| VintelError::config("Cannot find home directory"))
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_live_under_config_dir() {
        // CI containers may have no home directory at all.
        let Ok(config_dir) = VintelPaths::config_dir() else {
            return;
        };
        assert!(config_dir.ends_with("vintel"));

        let config_file = VintelPaths::config_file().unwrap();
        assert!(config_file.ends_with("config.toml"));
        assert!(config_file.starts_with(&config_dir));

        let logs_dir = VintelPaths::logs_dir().unwrap();
        assert!(logs_dir.ends_with("logs"));
        assert!(logs_dir.starts_with(&config_dir));
    }
}
