//! Command execution context
//!
//! Loads configuration, applies CLI/env overrides and opens the record
//! store, so handlers only deal with their own logic.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::{Cli, OutputFormat};
use crate::client::GitHubClient;
use crate::config::Config;
use crate::error::Result;
use crate::reconcile::{HookSettings, WebhookReconciler};
use crate::store::SqliteStore;

/// Global CLI options passed to all command handlers.
///
/// Precedence is: CLI flag > environment variable > config file > default.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub format: OutputFormat,
    pub config: Option<String>,
    pub webhook_url_prefix: Option<String>,
    pub api_base_url: Option<String>,
}

impl GlobalOptions {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            webhook_url_prefix: cli.webhook_url_prefix.clone(),
            api_base_url: cli.api_base_url.clone(),
        }
    }

    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    /// Load the config file and apply overrides
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_at(self.config_ref())?;
        config.apply_overrides(
            self.webhook_url_prefix.as_deref(),
            self.api_base_url.as_deref(),
        );
        Ok(config)
    }
}

/// Reconciler wired to the real GitHub client and SQLite store
pub type Reconciler = WebhookReconciler<GitHubClient, SqliteStore>;

/// Context for command execution: resolved config, open store, output format.
pub struct CommandContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub database_path: PathBuf,
    pub store: Arc<SqliteStore>,
    pub format: OutputFormat,
}

impl CommandContext {
    /// Load config and open the database it points at.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = opts.load_config()?;
        let config_path = Config::resolve_path(opts.config_ref())?;
        let database_path = config.database_path()?;

        log::debug!("Opening database {}", database_path.display());
        let store = Arc::new(SqliteStore::open(&database_path)?);

        Ok(Self {
            config,
            config_path,
            database_path,
            store,
            format: opts.format,
        })
    }

    /// Build a reconciler against the configured GitHub API.
    pub fn reconciler(&self) -> Result<Reconciler> {
        let client = GitHubClient::with_base_url(
            &self.config.api_base_url,
            Duration::from_secs(self.config.request_timeout_secs),
        )?;

        Ok(WebhookReconciler::new(
            Arc::new(client),
            self.store.clone(),
            HookSettings::from_config(&self.config),
        ))
    }
}
