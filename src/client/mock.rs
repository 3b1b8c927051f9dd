//! Mock GitHub API client for testing
//!
//! Keeps organization hooks in memory and records every call, so
//! reconciliation tests can assert exactly which remote calls were made.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::models::HookConfig;
use super::{ApiResult, CreateHookRequest, GitHubApi, OrgHook, UpdateHookRequest};
use crate::error::ApiError;
use crate::models::Credential;

/// Mock API client for testing.
///
/// # Example
/// ```ignore
/// let mock = MockGitHubClient::new()
///     .with_hook("octo-org", 42, true, "https://x.test/github/hooks")
///     .await;
///
/// let hook = mock.get_org_hook(&credential, "octo-org", "42").await?;
/// assert!(hook.active);
/// ```
pub struct MockGitHubClient {
    /// Hooks per organization
    hooks: Arc<Mutex<HashMap<String, Vec<OrgHook>>>>,
    /// Next id handed out by create_org_hook
    next_id: Arc<Mutex<u64>>,
    /// Errors to return, per method name, consumed on first use
    errors: Arc<Mutex<HashMap<&'static str, ApiError>>>,
    /// Track number of calls for verification
    call_count: Arc<Mutex<CallCounts>>,
    /// Captured requests for test assertions
    captured_requests: Arc<Mutex<Vec<CapturedRequest>>>,
    /// Bodies of update_org_hook calls, with the hook id they targeted
    updates: Arc<Mutex<Vec<(String, UpdateHookRequest)>>>,
}

impl Default for MockGitHubClient {
    fn default() -> Self {
        Self {
            hooks: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1000)),
            errors: Arc::new(Mutex::new(HashMap::new())),
            call_count: Arc::new(Mutex::new(CallCounts::default())),
            captured_requests: Arc::new(Mutex::new(Vec::new())),
            updates: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Tracks API call counts for test verification
#[derive(Default, Debug, Clone)]
pub struct CallCounts {
    pub get_org_hook: usize,
    pub list_org_hooks: usize,
    pub create_org_hook: usize,
    pub update_org_hook: usize,
}

impl CallCounts {
    /// Get total number of API calls made.
    pub fn total(&self) -> usize {
        self.get_org_hook + self.list_org_hooks + self.create_org_hook + self.update_org_hook
    }
}

/// A captured API request for test assertions.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// The API method called (e.g., "get_org_hook")
    pub method: &'static str,
    /// Organization the call targeted
    pub org: String,
    /// Bearer token the call was made with
    pub token: String,
}

impl MockGitHubClient {
    /// Create a new mock client with no hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing hook.
    pub async fn with_hook(self, org: &str, id: u64, active: bool, url: &str) -> Self {
        self.hooks
            .lock()
            .await
            .entry(org.to_string())
            .or_default()
            .push(OrgHook {
                id,
                active,
                name: Some("web".to_string()),
                events: vec!["*".to_string()],
                config: HookConfig {
                    url: Some(url.to_string()),
                    content_type: Some("json".to_string()),
                },
            });
        self
    }

    /// Configure an error for the next call of `method`.
    pub async fn with_error(self, method: &'static str, error: ApiError) -> Self {
        self.errors.lock().await.insert(method, error);
        self
    }

    /// Flip the active flag of a seeded or created hook.
    pub async fn set_active(&self, org: &str, id: u64, active: bool) {
        if let Some(hook) = self
            .hooks
            .lock()
            .await
            .get_mut(org)
            .and_then(|hooks| hooks.iter_mut().find(|h| h.id == id))
        {
            hook.active = active;
        }
    }

    /// Drop a hook as if it had been deleted on GitHub.
    pub async fn remove_hook(&self, org: &str, id: u64) {
        if let Some(hooks) = self.hooks.lock().await.get_mut(org) {
            hooks.retain(|h| h.id != id);
        }
    }

    /// Current hooks of an organization.
    pub async fn hooks(&self, org: &str) -> Vec<OrgHook> {
        self.hooks
            .lock()
            .await
            .get(org)
            .cloned()
            .unwrap_or_default()
    }

    /// Get the call counts for verification in tests.
    pub async fn call_counts(&self) -> CallCounts {
        self.call_count.lock().await.clone()
    }

    /// Get all captured requests for test assertions.
    pub async fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.captured_requests.lock().await.clone()
    }

    /// Get every update body sent, in call order.
    pub async fn update_requests(&self) -> Vec<(String, UpdateHookRequest)> {
        self.updates.lock().await.clone()
    }

    /// Record the call and return a pending error for `method`, if any.
    async fn record(&self, method: &'static str, org: &str, credential: &Credential) -> ApiResult<()> {
        self.captured_requests.lock().await.push(CapturedRequest {
            method,
            org: org.to_string(),
            token: credential.token().to_string(),
        });

        {
            let mut counts = self.call_count.lock().await;
            match method {
                "get_org_hook" => counts.get_org_hook += 1,
                "list_org_hooks" => counts.list_org_hooks += 1,
                "create_org_hook" => counts.create_org_hook += 1,
                "update_org_hook" => counts.update_org_hook += 1,
                _ => {}
            }
        }

        match self.errors.lock().await.remove(method) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl GitHubApi for MockGitHubClient {
    async fn get_org_hook(
        &self,
        credential: &Credential,
        org: &str,
        hook_id: &str,
    ) -> ApiResult<OrgHook> {
        self.record("get_org_hook", org, credential).await?;

        self.hooks(org)
            .await
            .into_iter()
            .find(|h| h.hook_id() == hook_id)
            .ok_or_else(|| ApiError::NotFound("Not Found".to_string()))
    }

    async fn list_org_hooks(&self, credential: &Credential, org: &str) -> ApiResult<Vec<OrgHook>> {
        self.record("list_org_hooks", org, credential).await?;
        Ok(self.hooks(org).await)
    }

    async fn create_org_hook(
        &self,
        credential: &Credential,
        org: &str,
        request: &CreateHookRequest,
    ) -> ApiResult<OrgHook> {
        self.record("create_org_hook", org, credential).await?;

        let mut hooks = self.hooks.lock().await;
        let org_hooks = hooks.entry(org.to_string()).or_default();
        if org_hooks.iter().any(|h| h.delivers_to(&request.config.url)) {
            return Err(ApiError::Validation(
                "Validation Failed: Hook already exists on this organization".to_string(),
            ));
        }

        let mut next_id = self.next_id.lock().await;
        *next_id += 1;
        let hook = OrgHook {
            id: *next_id,
            active: request.active,
            name: Some(request.name.clone()),
            events: request.events.clone(),
            config: HookConfig {
                url: Some(request.config.url.clone()),
                content_type: Some(request.config.content_type.clone()),
            },
        };
        org_hooks.push(hook.clone());
        Ok(hook)
    }

    async fn update_org_hook(
        &self,
        credential: &Credential,
        org: &str,
        hook_id: &str,
        request: &UpdateHookRequest,
    ) -> ApiResult<OrgHook> {
        self.record("update_org_hook", org, credential).await?;
        self.updates
            .lock()
            .await
            .push((hook_id.to_string(), request.clone()));

        let mut hooks = self.hooks.lock().await;
        let hook = hooks
            .get_mut(org)
            .and_then(|hooks| hooks.iter_mut().find(|h| h.hook_id() == hook_id))
            .ok_or_else(|| ApiError::NotFound("Not Found".to_string()))?;

        if let Some(active) = request.active {
            hook.active = active;
        }
        if let Some(config) = &request.config {
            hook.config.url = Some(config.url.clone());
            hook.config.content_type = Some(config.content_type.clone());
        }
        Ok(hook.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Credential {
        Credential::explicit("mock-token")
    }

    #[tokio::test]
    async fn test_mock_client_default_empty() {
        let mock = MockGitHubClient::new();

        let hooks = mock.list_org_hooks(&credential(), "octo-org").await.unwrap();
        assert!(hooks.is_empty());

        let err = mock
            .get_org_hook(&credential(), "octo-org", "1")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_mock_client_create_assigns_ids() {
        let mock = MockGitHubClient::new();
        let a = mock
            .create_org_hook(
                &credential(),
                "org-a",
                &CreateHookRequest::web("https://x.test/a", "s", vec!["*".into()]),
            )
            .await
            .unwrap();
        let b = mock
            .create_org_hook(
                &credential(),
                "org-b",
                &CreateHookRequest::web("https://x.test/b", "s", vec!["*".into()]),
            )
            .await
            .unwrap();

        assert_ne!(a.id, b.id);
        assert!(a.active);
        assert_eq!(mock.hooks("org-a").await.len(), 1);
    }

    #[tokio::test]
    async fn test_mock_client_rejects_duplicate_url() {
        let mock = MockGitHubClient::new()
            .with_hook("octo-org", 5, false, "https://x.test/github/hooks")
            .await;

        let err = mock
            .create_org_hook(
                &credential(),
                "octo-org",
                &CreateHookRequest::web("https://x.test/github/hooks", "s", vec!["*".into()]),
            )
            .await
            .unwrap_err();
        assert!(err.is_hook_already_exists());
    }

    #[tokio::test]
    async fn test_mock_client_error_is_one_shot() {
        let mock = MockGitHubClient::new()
            .with_error("list_org_hooks", ApiError::Unauthorized)
            .await;

        assert!(mock.list_org_hooks(&credential(), "o").await.is_err());
        assert!(mock.list_org_hooks(&credential(), "o").await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_client_tracks_calls_and_tokens() {
        let mock = MockGitHubClient::new();
        let _ = mock.list_org_hooks(&credential(), "o").await;
        let _ = mock.get_org_hook(&credential(), "o", "1").await;

        let counts = mock.call_counts().await;
        assert_eq!(counts.list_org_hooks, 1);
        assert_eq!(counts.get_org_hook, 1);
        assert_eq!(counts.total(), 2);

        let requests = mock.captured_requests().await;
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.token == "mock-token"));
    }
}
