//! Application path management for portable and installed modes.
//!
//! - **Portable mode**: if a `.portable` marker file exists next to the
//!   executable, the binding config and logs live in that directory.
//! - **Installed mode** (default): data is stored in the platform data
//!   directory (`%APPDATA%\KezBoard`, `~/.local/share/KezBoard`, ...).

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application name used for directories in installed mode
const APP_NAME: &str = "KezBoard";

/// Binding config location relative to the base directory
const CONFIG_DIR: &str = "Config";
const CONFIG_FILE: &str = "MidiBindingConfig.json";

/// Application paths for the binding config and logs.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Path to the binding config file
    pub config: PathBuf,
    /// Path to the logs directory
    pub logs_dir: PathBuf,
    /// Whether running in portable mode (files next to exe)
    pub is_portable: bool,
}

impl AppPaths {
    /// Detect the appropriate paths based on environment.
    ///
    /// Called before logging is initialized, so diagnostics go to stderr.
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        #[cfg(debug_assertions)]
        eprintln!("[paths] Executable directory: {}", exe_dir.display());

        if exe_dir.join(".portable").exists() {
            #[cfg(debug_assertions)]
            eprintln!("[paths] Running in PORTABLE mode (.portable marker found)");
            return Self::rooted_at(&exe_dir, true);
        }

        let app_data = dirs::data_dir()
            .unwrap_or_else(|| {
                eprintln!("[paths] WARNING: no data directory, falling back to exe dir");
                exe_dir.clone()
            })
            .join(APP_NAME);

        #[cfg(debug_assertions)]
        eprintln!(
            "[paths] Running in INSTALLED mode (data dir: {})",
            app_data.display()
        );

        Self::rooted_at(&app_data, false)
    }

    /// Paths laid out under `base`
    pub fn rooted_at(base: &Path, is_portable: bool) -> Self {
        Self {
            config: base.join(CONFIG_DIR).join(CONFIG_FILE),
            logs_dir: base.join("logs"),
            is_portable,
        }
    }

    /// Use an explicit config file instead of the detected one
    pub fn with_config(mut self, config: impl Into<PathBuf>) -> Self {
        self.config = config.into();
        self
    }

    /// Ensure the config and logs directories exist.
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        if !self.logs_dir.exists() {
            debug!("Creating logs directory: {}", self.logs_dir.display());
            std::fs::create_dir_all(&self.logs_dir).with_context(|| {
                format!("Failed to create logs directory {}", self.logs_dir.display())
            })?;
        }

        if let Some(config_parent) = self.config.parent() {
            if !config_parent.as_os_str().is_empty() && !config_parent.exists() {
                debug!("Creating config directory: {}", config_parent.display());
                std::fs::create_dir_all(config_parent).with_context(|| {
                    format!("Failed to create config directory {}", config_parent.display())
                })?;
            }
        }

        Ok(())
    }
}
