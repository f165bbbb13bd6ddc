use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{model::Units, provider::wttr_in::DEFAULT_SERVICE_URL};

/// Server-wide defaults, read once at startup.
///
/// Example TOML:
/// ```toml
/// default_location = "Chicago"
/// default_units = "m"
/// show_link = true
/// weather_provider = "wttr.in"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Empty means "let the weather service geolocate".
    pub default_location: String,
    pub default_units: Option<Units>,
    pub default_language: Option<String>,
    pub show_link: bool,
    pub show_image: bool,
    pub show_plus_sign: bool,
    pub weather_provider: String,

    pub service_url: String,
    /// Where user preferences are kept; defaults to the platform data dir.
    pub preferences_path: Option<PathBuf>,
    pub command_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            default_location: String::new(),
            default_units: None,
            default_language: None,
            show_link: false,
            show_image: false,
            show_plus_sign: false,
            weather_provider: "wttr.in".to_string(),
            service_url: DEFAULT_SERVICE_URL.to_string(),
            preferences_path: None,
            command_prefix: "!".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load config from the platform config dir, or defaults if there is none yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: ServerConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Configured preferences file, or `preferences.toml` in the platform data dir.
    pub fn preferences_file_path(&self) -> Result<PathBuf> {
        match &self.preferences_path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("preferences.toml")),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weatherbot", "weatherbot")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
