//! Credential selection from an organization's linked users

use log::debug;

use crate::error::{Error, Result};
use crate::models::{Credential, Organization};

/// Pick the token of the first linked user that can manage organization hooks.
///
/// Users are considered in link order, so the choice is deterministic.
pub fn select_credential(org: &Organization) -> Result<Credential> {
    let user = org
        .users
        .iter()
        .find(|u| u.has_admin_org_hook_token())
        .ok_or_else(|| Error::NoValidCredential {
            org: org.platform_org_id.clone(),
        })?;

    // has_admin_org_hook_token guarantees a token
    let token = user.token.clone().unwrap_or_default();
    debug!(
        "Selected token of {} for {} ({} linked users)",
        user.login,
        org.platform_org_id,
        org.users.len()
    );

    Ok(Credential::from_user(&user.login, token))
}
