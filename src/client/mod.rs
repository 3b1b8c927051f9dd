//! GitHub API client

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::Credential;

pub mod github;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod rate_limit;

pub use github::GitHubClient;
#[cfg(test)]
pub use mock::MockGitHubClient;
pub use models::{CreateHookRequest, OrgHook, UpdateHookRequest};

/// Result of a single GitHub API call
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Organization hook operations on the GitHub API.
///
/// Every call is authenticated with the credential passed in, so one client
/// can serve many organizations with different tokens.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Read one hook by id
    async fn get_org_hook(
        &self,
        credential: &Credential,
        org: &str,
        hook_id: &str,
    ) -> ApiResult<OrgHook>;

    /// List all hooks of an organization
    async fn list_org_hooks(&self, credential: &Credential, org: &str) -> ApiResult<Vec<OrgHook>>;

    /// Create a hook and return it with its new id
    async fn create_org_hook(
        &self,
        credential: &Credential,
        org: &str,
        request: &CreateHookRequest,
    ) -> ApiResult<OrgHook>;

    /// Update an existing hook
    async fn update_org_hook(
        &self,
        credential: &Credential,
        org: &str,
        hook_id: &str,
        request: &UpdateHookRequest,
    ) -> ApiResult<OrgHook>;
}
