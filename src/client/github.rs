//! GitHub API client implementation

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::HeaderMap;
use reqwest::{Client as HttpClient, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::rate_limit::{EndpointCategory, RateLimiterSet};
use super::{ApiResult, CreateHookRequest, GitHubApi, OrgHook, UpdateHookRequest};
use crate::config::DEFAULT_API_BASE_URL;
use crate::error::{ApiError, Result};
use crate::models::Credential;

/// Media type GitHub recommends for REST calls
const ACCEPT: &str = "application/vnd.github+json";

/// Pinned REST API version
const API_VERSION: &str = "2022-11-28";

/// Hooks requested per page when listing
const HOOKS_PER_PAGE: usize = 100;

/// Upper bound on pages read when listing hooks
const MAX_HOOK_PAGES: usize = 10;

/// Fallback wait when GitHub gives no hint
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// GitHub REST client for organization hooks
pub struct GitHubClient {
    http: HttpClient,
    base_url: String,
    rate_limiters: RateLimiterSet,
}

impl GitHubClient {
    /// Create a client against `https://api.github.com`
    #[allow(dead_code)]
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_API_BASE_URL, Duration::from_secs(30))
    }

    /// Create a client against a custom API host (GitHub Enterprise, tests)
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(concat!("orghook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                crate::error::Error::remote("client setup", base_url, ApiError::from(e))
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiters: RateLimiterSet::new(),
        })
    }

    /// Make an authenticated API request with an optional JSON body
    async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        credential: &Credential,
        body: Option<&B>,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let category = EndpointCategory::from_method(&method);
        self.rate_limiters.wait_for(category).await;

        let url = format!("{}{}", self.base_url, path);
        log::debug!(
            "{} {} (token {})",
            method,
            url,
            credential.fingerprint()
        );

        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(credential.token())
            .header("Accept", ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(ApiError::from)?;

        let status = response.status();
        match status {
            StatusCode::OK | StatusCode::CREATED => {
                let data = response.json::<T>().await.map_err(|e| {
                    ApiError::InvalidResponse(format!("Failed to parse response: {}", e))
                })?;
                Ok(data)
            }
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            status
                if status == StatusCode::TOO_MANY_REQUESTS
                    || (status == StatusCode::FORBIDDEN && is_rate_limited(response.headers())) =>
            {
                self.rate_limiters.activate(category);
                Err(ApiError::RateLimit(retry_after(response.headers())))
            }
            StatusCode::FORBIDDEN => Err(ApiError::Forbidden),
            StatusCode::NOT_FOUND => {
                let error_msg = error_message(response, "Resource not found").await;
                Err(ApiError::NotFound(error_msg))
            }
            StatusCode::BAD_REQUEST => {
                let error_msg = error_message(response, "Bad request").await;
                Err(ApiError::BadRequest(error_msg))
            }
            StatusCode::UNPROCESSABLE_ENTITY => {
                let error_msg = error_message(response, "Validation failed").await;
                Err(ApiError::Validation(error_msg))
            }
            status if status.is_server_error() => {
                let fallback = format!("Server error: {}", status);
                let error_msg = error_message(response, &fallback).await;
                Err(ApiError::ServerError(error_msg))
            }
            _ => Err(ApiError::InvalidResponse(format!(
                "Unexpected status code: {}",
                status
            ))),
        }
    }
}

/// GitHub signals an exhausted primary limit with 403 and a zero remaining count
fn is_rate_limited(headers: &HeaderMap) -> bool {
    headers.contains_key("retry-after")
        || headers
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "0")
}

/// Wait hinted by `retry-after`, else by `x-ratelimit-reset`
fn retry_after(headers: &HeaderMap) -> Duration {
    let header_u64 = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
    };

    if let Some(secs) = header_u64("retry-after") {
        return Duration::from_secs(secs);
    }

    if let Some(reset) = header_u64("x-ratelimit-reset") {
        let now = Utc::now().timestamp().max(0) as u64;
        return Duration::from_secs(reset.saturating_sub(now));
    }

    Duration::from_secs(DEFAULT_RETRY_AFTER_SECS)
}

/// Pull the `message` (and validation `errors`) out of a GitHub error body
async fn error_message(response: reqwest::Response, fallback: &str) -> String {
    let text = match response.text().await {
        Ok(text) if !text.trim().is_empty() => text,
        _ => return fallback.to_string(),
    };

    let Ok(body) = serde_json::from_str::<serde_json::Value>(&text) else {
        return text;
    };

    let mut message = body
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or(fallback)
        .to_string();

    let details: Vec<&str> = body
        .get("errors")
        .and_then(|e| e.as_array())
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if !details.is_empty() {
        message = format!("{}: {}", message, details.join("; "));
    }
    message
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn get_org_hook(
        &self,
        credential: &Credential,
        org: &str,
        hook_id: &str,
    ) -> ApiResult<OrgHook> {
        let path = format!("/orgs/{}/hooks/{}", org, hook_id);
        self.request::<_, ()>(Method::GET, &path, credential, None)
            .await
    }

    async fn list_org_hooks(&self, credential: &Credential, org: &str) -> ApiResult<Vec<OrgHook>> {
        let mut hooks = Vec::new();

        for page in 1..=MAX_HOOK_PAGES {
            let path = format!(
                "/orgs/{}/hooks?per_page={}&page={}",
                org, HOOKS_PER_PAGE, page
            );
            let batch: Vec<OrgHook> = self
                .request::<_, ()>(Method::GET, &path, credential, None)
                .await?;
            let done = batch.len() < HOOKS_PER_PAGE;
            hooks.extend(batch);
            if done {
                return Ok(hooks);
            }
        }

        Err(ApiError::InvalidResponse(format!(
            "Hook listing for {} did not end after {} pages",
            org, MAX_HOOK_PAGES
        )))
    }

    async fn create_org_hook(
        &self,
        credential: &Credential,
        org: &str,
        request: &CreateHookRequest,
    ) -> ApiResult<OrgHook> {
        let path = format!("/orgs/{}/hooks", org);
        self.request(Method::POST, &path, credential, Some(request))
            .await
    }

    async fn update_org_hook(
        &self,
        credential: &Credential,
        org: &str,
        hook_id: &str,
        request: &UpdateHookRequest,
    ) -> ApiResult<OrgHook> {
        let path = format!("/orgs/{}/hooks/{}", org, hook_id);
        self.request(Method::PATCH, &path, credential, Some(request))
            .await
    }
}
