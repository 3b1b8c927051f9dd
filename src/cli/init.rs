//! Init command implementation

use colored::Colorize;

use crate::cli::GlobalOptions;
use crate::config::{Config, webhook_url_from_prefix};
use crate::error::{ConfigError, Result};

/// Write a config file with the given prefix and database path
pub fn run(
    opts: &GlobalOptions,
    prefix: Option<String>,
    database: Option<String>,
    force: bool,
) -> Result<()> {
    let path = Config::resolve_path(opts.config_ref())?;
    if path.exists() && !force {
        return Err(ConfigError::Invalid(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ))
        .into());
    }

    let prefix = prefix.or_else(|| opts.webhook_url_prefix.clone());
    if let Some(p) = prefix.as_deref() {
        // Reject a blank prefix now rather than at hook creation
        webhook_url_from_prefix(Some(p))?;
    }

    let mut config = Config {
        webhook_url_prefix: prefix,
        database_path: database.map(Into::into),
        ..Config::default()
    };
    if let Some(base) = opts.api_base_url.as_deref() {
        config.api_base_url = base.to_string();
    }

    config.save_to(path.clone())?;
    println!("{} Wrote {}", "✓".green(), path.display().to_string().cyan());

    match config.webhook_url() {
        Ok(url) => println!("  Hooks will deliver to {}", url),
        Err(_) => println!(
            "  {} No webhook URL prefix set; hooks cannot be created yet",
            "⚠".yellow()
        ),
    }

    Ok(())
}
