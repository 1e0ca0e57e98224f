//! Configuration management for the support widget

pub mod file;

use std::path::PathBuf;

use crate::{Error, Result};

/// Default transcript download target
const DEFAULT_TRANSCRIPT_PATH: &str = "chat-transcript.txt";

/// Support widget configuration
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Transport connection settings
    pub connection: ConnectionConfig,

    /// Where downloaded transcripts are written
    pub transcript_path: PathBuf,

    /// Drop inbound records whose `id` was already seen this session
    pub dedup_by_id: bool,
}

/// Connection settings handed to the transport client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Engagement hub URL for the organization
    pub org_url: Option<String>,

    /// Organization identifier
    pub org_id: Option<String>,

    /// Chat widget identifier
    pub widget_id: Option<String>,
}

impl ConnectionConfig {
    /// Check that every field a transport needs is present
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first missing field
    pub fn validate(&self) -> Result<()> {
        let missing = [
            ("org_url", &self.org_url),
            ("org_id", &self.org_id),
            ("widget_id", &self.widget_id),
        ]
        .into_iter()
        .find(|(_, value)| value.as_deref().is_none_or(str::is_empty));

        match missing {
            Some((field, _)) => Err(Error::Config(format!("connection.{field} is not set"))),
            None => Ok(()),
        }
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            transcript_path: PathBuf::from(DEFAULT_TRANSCRIPT_PATH),
            dedup_by_id: false,
        }
    }
}

impl WidgetConfig {
    /// Load configuration from the environment and the standard config file
    #[must_use]
    pub fn load() -> Self {
        let fc = file::load_config_file();
        Self::resolve(fc, |key| std::env::var(key).ok())
    }

    /// Merge a parsed config file with an environment lookup (env > toml > default)
    #[must_use]
    pub fn resolve(fc: file::WidgetConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let connection = ConnectionConfig {
            org_url: env("SUPPORT_WIDGET_ORG_URL").or(fc.connection.org_url),
            org_id: env("SUPPORT_WIDGET_ORG_ID").or(fc.connection.org_id),
            widget_id: env("SUPPORT_WIDGET_WIDGET_ID").or(fc.connection.widget_id),
        };

        let transcript_path = env("SUPPORT_WIDGET_TRANSCRIPT_PATH")
            .or(fc.session.transcript_path)
            .map_or(defaults.transcript_path, PathBuf::from);

        let dedup_by_id = env("SUPPORT_WIDGET_DEDUP")
            .and_then(|v| parse_bool(&v))
            .or(fc.session.dedup_by_id)
            .unwrap_or(defaults.dedup_by_id);

        Self {
            connection,
            transcript_path,
            dedup_by_id,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
