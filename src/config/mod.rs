//! Configuration management for orghook

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Default GitHub REST API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Path appended to the webhook URL prefix to form the callback URL
pub const HOOKS_PATH: &str = "/github/hooks";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Public base URL that GitHub delivers hook events to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url_prefix: Option<String>,

    /// GitHub API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// SQLite database location (defaults to ~/.orghook/orghook.db)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Events the organization hook subscribes to
    #[serde(default = "default_webhook_events")]
    pub webhook_events: Vec<String>,

    /// Per-request timeout for GitHub calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Organizations reconciled at once by `hook ensure-all`
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_webhook_events() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_url_prefix: None,
            api_base_url: default_api_base_url(),
            database_path: None,
            webhook_events: default_webhook_events(),
            request_timeout_secs: default_request_timeout_secs(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

impl Config {
    /// Directory holding the config file and default database
    pub fn home_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".orghook"))
    }

    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("config.yaml"))
    }

    /// Resolve an optional override into a concrete config path
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from an optional path, falling back to defaults
    /// when the file does not exist yet.
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        Self::load_from(Self::resolve_path(path)?)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(&path, contents)?;

        // Hook secrets live in the database next to this file
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// Apply CLI/env overrides on top of the file values
    pub fn apply_overrides(&mut self, webhook_url_prefix: Option<&str>, api_base_url: Option<&str>) {
        if let Some(prefix) = webhook_url_prefix {
            self.webhook_url_prefix = Some(prefix.to_string());
        }
        if let Some(base) = api_base_url {
            self.api_base_url = base.to_string();
        }
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::Invalid("max_concurrent must be at least 1".to_string()).into());
        }
        if self.request_timeout_secs == 0 {
            return Err(
                ConfigError::Invalid("request_timeout_secs must be at least 1".to_string()).into(),
            );
        }
        if self.webhook_events.is_empty() {
            return Err(ConfigError::Invalid("webhook_events must not be empty".to_string()).into());
        }
        Ok(())
    }

    /// Resolve the database path
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(p) => Ok(p.clone()),
            None => Ok(Self::home_dir()?.join("orghook.db")),
        }
    }

    /// Build the callback URL GitHub should deliver to.
    ///
    /// Fails with [`ConfigError::MissingWebhookUrlPrefix`] when the prefix is
    /// unset or blank.
    pub fn webhook_url(&self) -> Result<String> {
        webhook_url_from_prefix(self.webhook_url_prefix.as_deref())
    }
}

/// Join a prefix with [`HOOKS_PATH`], rejecting a missing or blank prefix.
pub fn webhook_url_from_prefix(prefix: Option<&str>) -> Result<String> {
    let prefix = prefix
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or(ConfigError::MissingWebhookUrlPrefix)?;

    Ok(format!("{}{}", prefix.trim_end_matches('/'), HOOKS_PATH))
}
