//! Application paths and persisted settings.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::occupancy::FillMode;
use crate::core::player::{SPEED_MAX, SPEED_MIN};
use crate::report::GridLabel;

/// Settings file name inside the config directory
pub const SETTINGS_FILE: &str = "actiongrid.json";
/// Default log file name inside the data directory
pub const LOG_FILE: &str = "actiongrid.log";

const APP_DIR: &str = "actiongrid";
const CONFIG_DIR_ENV: &str = "ACTIONGRID_CONFIG_DIR";

/// Configuration for overriding default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI arg → ENV var (ACTIONGRID_CONFIG_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));
        Self { config_dir }
    }

    /// Path to a configuration file
    ///
    /// Priority:
    /// 1. CLI --config-dir argument
    /// 2. ACTIONGRID_CONFIG_DIR environment variable
    /// 3. Current directory IF it already holds actiongrid.json or actiongrid.log
    /// 4. Platform config directory from dirs-next (~/.config/actiongrid on Linux)
    pub fn config_file(&self, name: &str) -> PathBuf {
        self.config_dir().join(name)
    }

    /// Path to a data file (logs); same priority as [`Self::config_file`]
    /// with the platform data directory as fallback.
    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir().join(name)
    }

    /// Create config and data directories if missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        let config_dir = self.config_dir();
        let data_dir = self.data_dir();

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
        }
        if data_dir != config_dir && !data_dir.exists() {
            std::fs::create_dir_all(&data_dir)
                .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        }
        Ok(())
    }

    fn config_dir(&self) -> PathBuf {
        self.resolve(dirs_next::config_dir())
    }

    fn data_dir(&self) -> PathBuf {
        self.resolve(dirs_next::data_dir())
    }

    fn resolve(&self, platform_dir: Option<PathBuf>) -> PathBuf {
        if let Some(dir) = &self.config_dir {
            return dir.clone();
        }
        if let Ok(current_dir) = std::env::current_dir()
            && has_local_config_files(&current_dir)
        {
            return current_dir;
        }
        match platform_dir {
            Some(dir) => dir.join(APP_DIR),
            None => PathBuf::from("."),
        }
    }
}

fn has_local_config_files(dir: &Path) -> bool {
    [SETTINGS_FILE, LOG_FILE].iter().any(|f| dir.join(f).exists())
}

/// Persisted user preferences. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fill_mode: FillMode,
    pub speed: f64,
    pub loop_enabled: bool,
    /// Start playing as soon as a project is opened
    pub autoplay: bool,
    /// Row label in occupancy grids
    pub grid_label: GridLabel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fill_mode: FillMode::Gradual,
            speed: 1.0,
            loop_enabled: false,
            autoplay: false,
            grid_label: GridLabel::Action,
        }
    }
}

impl Settings {
    /// Load from `path`, falling back to defaults when the file is missing
    /// or unreadable.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::try_load(path) {
            Ok(settings) => {
                info!("Settings loaded from {}", path.display());
                settings.sanitized()
            }
            Err(e) => {
                warn!("Ignoring settings file: {:#}", e);
                Self::default()
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Copy with speed clamped into the player's range.
    pub fn sanitized(&self) -> Self {
        let speed = if self.speed.is_finite() { self.speed.clamp(SPEED_MIN, SPEED_MAX) } else { 1.0 };
        Self { speed, ..self.clone() }
    }
}
