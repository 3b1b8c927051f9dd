//! Hook command implementations

use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{CommandContext, GlobalOptions, OutputFormat};
use crate::error::{Error, Result, StoreError};
use crate::models::{Credential, Organization, WebhookRecord};
use crate::output;
use crate::reconcile::{Outcome, reconcile_all};
use crate::store::WebhookRecordStore;

/// Webhook record as shown by `hook show`
#[derive(Debug, Serialize, Tabled)]
pub struct RecordRow {
    #[tabled(rename = "ORGANIZATION")]
    pub org: String,
    #[tabled(rename = "HOOK ID")]
    pub hook_id: String,
    #[tabled(rename = "CALLBACK URL")]
    pub callback_url: String,
}

/// Result of reconciling one organization
#[derive(Debug, Serialize, Tabled)]
pub struct EnsureRow {
    #[tabled(rename = "ORGANIZATION")]
    pub org: String,
    #[tabled(rename = "RESULT")]
    pub result: String,
    #[tabled(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[tabled(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EnsureRow {
    fn new(org: String, result: &Result<Outcome>) -> Self {
        match result {
            Ok(outcome) => Self {
                org,
                result: outcome.to_string(),
                outcome: Some(outcome.clone()),
                error: None,
            },
            Err(e) => Self {
                org,
                result: format!("error: {}", e),
                outcome: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Show the stored webhook record of an organization
pub fn show(opts: &GlobalOptions, org: &str) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let record = find_record(&ctx, org)?;

    let rows = vec![RecordRow {
        org: record.platform_org_id.clone(),
        hook_id: record
            .remote_hook_id
            .clone()
            .unwrap_or_else(|| "-".to_string()),
        callback_url: ctx
            .config
            .webhook_url()
            .unwrap_or_else(|_| "(not configured)".to_string()),
    }];
    output::print(ctx.format, &rows, &record)
}

/// Make sure one organization has an active hook
pub async fn ensure(opts: &GlobalOptions, org: &str, token: Option<&str>) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let organization = ctx.store.load_organization(org)?;
    let record = find_record(&ctx, org)?;
    let credential = token.map(Credential::explicit);

    let reconciler = ctx.reconciler()?;
    let outcome = reconciler.reconcile(&organization, &record, credential).await?;

    match ctx.format {
        OutputFormat::Table => println!("{} {}: {}", "✓".green(), org.cyan(), outcome),
        OutputFormat::Json => println!("{}", output::format_json(&outcome)?),
    }
    Ok(())
}

/// Make sure every linked organization has an active hook
pub async fn ensure_all(opts: &GlobalOptions, token: Option<&str>) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    let mut targets: Vec<(Organization, WebhookRecord)> = Vec::new();
    for login in ctx.store.organization_logins()? {
        let organization = ctx.store.load_organization(&login)?;
        let record = find_record(&ctx, &login)?;
        targets.push((organization, record));
    }

    let credential = token.map(Credential::explicit);
    let reconciler = ctx.reconciler()?;
    let results = reconcile_all(
        &reconciler,
        &targets,
        credential.as_ref(),
        ctx.config.max_concurrent,
    )
    .await;

    let total = results.len();
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();

    let mut rows: Vec<EnsureRow> = results
        .into_iter()
        .map(|(org, result)| EnsureRow::new(org, &result))
        .collect();
    rows.sort_by(|a, b| a.org.cmp(&b.org));
    output::print(ctx.format, &rows, &rows)?;

    if failed > 0 {
        return Err(Error::PartialFailure { failed, total });
    }
    Ok(())
}

fn find_record(ctx: &CommandContext, org: &str) -> Result<WebhookRecord> {
    ctx.store
        .find_record(org)?
        .ok_or_else(|| StoreError::RecordNotFound(org.to_string()).into())
}
