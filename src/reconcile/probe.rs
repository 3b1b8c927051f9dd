//! Remote hook liveness probe

use log::{debug, warn};

use crate::client::GitHubApi;
use crate::error::{ApiError, Error, Result};
use crate::models::{Credential, WebhookRecord};

/// Ask GitHub whether the record's hook exists and is active.
///
/// A record without a hook id is inactive and costs no remote call. A hook
/// that GitHub no longer knows (404) is also inactive, so it gets recreated.
pub async fn is_active<C>(client: &C, record: &WebhookRecord, credential: &Credential) -> Result<bool>
where
    C: GitHubApi + ?Sized,
{
    let Some(hook_id) = record.remote_hook_id.as_deref() else {
        debug!("{} has no hook id yet", record.platform_org_id);
        return Ok(false);
    };

    match client
        .get_org_hook(credential, &record.platform_org_id, hook_id)
        .await
    {
        Ok(hook) => {
            debug!(
                "Hook {} of {} is {}",
                hook_id,
                record.platform_org_id,
                if hook.active { "active" } else { "inactive" }
            );
            Ok(hook.active)
        }
        Err(ApiError::NotFound(_)) => {
            warn!(
                "Hook {} of {} no longer exists on GitHub",
                hook_id, record.platform_org_id
            );
            Ok(false)
        }
        Err(e) => Err(Error::remote("read hook", &record.platform_org_id, e)),
    }
}
