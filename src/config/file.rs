//! TOML configuration file loading
//!
//! Supports `~/.config/support-widget/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct WidgetConfigFile {
    /// Transport connection settings
    #[serde(default)]
    pub connection: ConnectionFileConfig,

    /// Session behaviour
    #[serde(default)]
    pub session: SessionFileConfig,
}

/// Transport connection settings
#[derive(Debug, Default, Deserialize)]
pub struct ConnectionFileConfig {
    pub org_url: Option<String>,
    pub org_id: Option<String>,
    pub widget_id: Option<String>,
}

/// Session behaviour
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    /// Where downloaded transcripts are written
    pub transcript_path: Option<String>,

    /// Drop inbound records whose `id` was already seen this session
    pub dedup_by_id: Option<bool>,
}

/// Load the TOML config file from the standard path
///
/// Returns `WidgetConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> WidgetConfigFile {
    config_file_path().map_or_else(WidgetConfigFile::default, |path| load_from(&path))
}

/// Load a TOML config file from an explicit path, falling back to defaults
#[must_use]
pub fn load_from(path: &Path) -> WidgetConfigFile {
    if !path.exists() {
        return WidgetConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                WidgetConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            WidgetConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/support-widget/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("support-widget").join("config.toml"))
}
