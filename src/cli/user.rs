//! User command implementations

use colored::Colorize;

use crate::cli::{CommandContext, GlobalOptions};
use crate::error::Result;

/// Add a user or replace its token and scopes
pub fn add(opts: &GlobalOptions, login: &str, token: Option<&str>, scopes: &[String]) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let user = ctx.store.upsert_user(login, token, scopes)?;

    println!("{} Saved user {}", "✓".green(), user.login.cyan());
    if !user.has_admin_org_hook_token() {
        println!(
            "  {} No token with the {} scope; this user cannot manage hooks",
            "⚠".yellow(),
            crate::models::ADMIN_ORG_HOOK_SCOPE
        );
    }
    Ok(())
}

/// Link a user to an organization
pub fn link(opts: &GlobalOptions, org: &str, login: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    if ctx.store.link_user(org, login)? {
        println!("{} Linked {} to {}", "✓".green(), login.cyan(), org.cyan());
    } else {
        println!("{} is already linked to {}", login, org);
    }
    Ok(())
}
