//! Organization command implementations

use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{CommandContext, GlobalOptions};
use crate::error::{Result, StoreError};
use crate::output;
use crate::store::WebhookRecordStore;

/// A linked organization as listed by `org list`
#[derive(Debug, Serialize, Tabled)]
pub struct OrgRow {
    #[tabled(rename = "ORGANIZATION")]
    pub org: String,
    #[tabled(rename = "HOOK ID")]
    pub hook_id: String,
    #[tabled(rename = "USERS")]
    pub users: String,
}

/// Link an organization
pub fn add(opts: &GlobalOptions, org: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let (org, _) = ctx.store.add_organization(org)?;

    println!("{} Linked {}", "✓".green(), org.platform_org_id.cyan());
    println!(
        "  → Link a user with an {} token: orghook user link {} <LOGIN>",
        crate::models::ADMIN_ORG_HOOK_SCOPE,
        org.platform_org_id
    );
    Ok(())
}

/// Unlink an organization
pub fn remove(opts: &GlobalOptions, org: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    if !ctx.store.remove_organization(org)? {
        return Err(StoreError::OrgNotFound(org.to_string()).into());
    }

    println!("{} Unlinked {}", "✓".green(), org.cyan());
    Ok(())
}

/// List linked organizations
pub fn list(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let rows = collect_rows(&ctx)?;
    output::print(ctx.format, &rows, &rows)
}

fn collect_rows(ctx: &CommandContext) -> Result<Vec<OrgRow>> {
    let mut rows = Vec::new();
    for login in ctx.store.organization_logins()? {
        let org = ctx.store.load_organization(&login)?;
        let hook_id = ctx
            .store
            .find_record(&login)?
            .and_then(|r| r.remote_hook_id)
            .unwrap_or_else(|| "-".to_string());
        let users = org
            .users
            .iter()
            .map(|u| u.login.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        rows.push(OrgRow {
            org: login,
            hook_id,
            users,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn opts(dir: &TempDir) -> GlobalOptions {
        let config_path = dir.path().join("config.yaml");
        std::fs::write(
            &config_path,
            format!("database_path: {}\n", dir.path().join("db.sqlite").display()),
        )
        .unwrap();
        GlobalOptions {
            config: Some(config_path.to_string_lossy().to_string()),
            ..GlobalOptions::default()
        }
    }

    #[test]
    fn test_add_list_remove() {
        let dir = TempDir::new().unwrap();
        let opts = opts(&dir);

        add(&opts, "octo-org").unwrap();
        add(&opts, "acme").unwrap();

        let ctx = CommandContext::new(&opts).unwrap();
        ctx.store.upsert_user("mona", Some("t"), &[]).unwrap();
        ctx.store.link_user("acme", "mona").unwrap();

        let rows = collect_rows(&ctx).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].org, "octo-org");
        assert_eq!(rows[0].hook_id, "-");
        assert_eq!(rows[1].users, "mona");

        remove(&opts, "octo-org").unwrap();
        assert_eq!(collect_rows(&ctx).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_unknown_org_fails() {
        let dir = TempDir::new().unwrap();
        assert!(remove(&opts(&dir), "nope").is_err());
    }
}
