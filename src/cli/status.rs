//! Status command implementation

use colored::Colorize;

use crate::cli::{CommandContext, GlobalOptions};
use crate::error::Result;

/// Show config, callback URL and database state
pub fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}\n", "orghook status".bold());

    let ctx = CommandContext::new(opts)?;

    let config_path = ctx.config_path.display().to_string();
    if ctx.config_path.exists() {
        println!("Config file: {}", config_path.cyan());
    } else {
        println!(
            "Config file: {} {}",
            config_path.cyan(),
            "(not found, using defaults)".dimmed()
        );
    }
    println!("GitHub API: {}", ctx.config.api_base_url);
    println!();

    match ctx.config.webhook_url() {
        Ok(url) => println!("{} Webhook URL: {}", "✓".green(), url),
        Err(e) => {
            println!("{} {}", "✗".red(), e);
            println!("  → Run 'orghook init --prefix <URL>' to configure");
        }
    }

    let orgs = ctx.store.organization_logins()?;
    println!(
        "{} Database: {} ({} linked organizations)",
        "✓".green(),
        ctx.database_path.display(),
        orgs.len()
    );

    Ok(())
}
