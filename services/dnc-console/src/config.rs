//! Configuration types for the DNC console

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::devices::DeviceConfig;
use crate::editor::Suggestions;
use crate::entity::EntityProfile;
use crate::session::SessionContext;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub options: OptionsConfig,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub activity: ActivityConfig,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

/// Backend endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_dnc_url")]
    pub dnc_url: String,
    #[serde(default = "default_plugin_url")]
    pub plugin_url: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            dnc_url: default_dnc_url(),
            plugin_url: default_plugin_url(),
            timeout: default_timeout(),
        }
    }
}

/// Where the bearer token and identity come from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default)]
    pub token_file: Option<PathBuf>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub org: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token: None,
            token_env: default_token_env(),
            token_file: None,
            user: None,
            org: None,
        }
    }
}

/// Suggestion lists for free-text fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    #[serde(default)]
    pub ssu_types: Vec<String>,
    #[serde(default)]
    pub statuses: Vec<String>,
    #[serde(default)]
    pub remarks: Vec<String>,
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            ssu_types: Vec::new(),
            statuses: Vec::new(),
            remarks: Vec::new(),
            locations: default_locations(),
        }
    }
}

impl OptionsConfig {
    pub fn suggestions(&self) -> Suggestions {
        Suggestions {
            statuses: self.statuses.clone(),
            remarks: self.remarks.clone(),
            types: self.ssu_types.clone(),
        }
    }
}

/// CSV export destination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_dir")]
    pub directory: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: default_export_dir(),
        }
    }
}

/// Notification history kept in memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
        }
    }
}

impl Config {
    /// Display name for a profile: its configured alias, else its own name
    pub fn display_name(&self, profile: &EntityProfile) -> String {
        profile
            .alias_key
            .as_deref()
            .and_then(|key| self.aliases.get(key))
            .unwrap_or(&profile.name)
            .clone()
    }

    /// Fill the session token from `token_file`, then from `token_env`, when
    /// it is not set inline. A token that cannot be found is left unset.
    pub fn resolve_secrets(&mut self) -> crate::Result<()> {
        if self.session.token.is_some() {
            return Ok(());
        }

        if let Some(path) = &self.session.token_file {
            let token = std::fs::read_to_string(path).map_err(|e| {
                crate::DncError::Config(format!("Failed to read token file {:?}: {}", path, e))
            })?;
            tracing::debug!("Loaded session token from {:?}", path);
            self.session.token = Some(token.trim().to_string());
            return Ok(());
        }

        if let Ok(token) = std::env::var(&self.session.token_env) {
            tracing::debug!("Loaded session token from ${}", self.session.token_env);
            self.session.token = Some(token.trim().to_string());
        } else {
            tracing::debug!("No session token configured");
        }
        Ok(())
    }

    pub fn session_context(&self) -> SessionContext {
        SessionContext::new(
            self.session.token.clone(),
            self.session.user.clone(),
            self.session.org.clone(),
        )
    }
}

fn default_dnc_url() -> String {
    "http://localhost:8891/dncserver".to_string()
}

fn default_plugin_url() -> String {
    "http://localhost:8892/dncplugin".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_token_env() -> String {
    "DNC_TOKEN".to_string()
}

fn default_locations() -> Vec<String> {
    vec!["Arnot".to_string(), "Uihlein".to_string(), "UVM".to_string()]
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_history_size() -> usize {
    100
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::DncError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
