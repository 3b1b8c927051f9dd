//! GitHub organization hook wire models

use serde::{Deserialize, Serialize};

/// Organization hook as returned by `GET /orgs/{org}/hooks/{id}`.
///
/// Only the fields reconciliation reads are modelled; the rest are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgHook {
    /// Numeric hook id
    pub id: u64,

    /// Whether GitHub delivers events to this hook
    #[serde(default)]
    pub active: bool,

    /// Hook name (always "web" for organization hooks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Subscribed events
    #[serde(default)]
    pub events: Vec<String>,

    /// Delivery configuration
    #[serde(default)]
    pub config: HookConfig,
}

impl OrgHook {
    /// Hook id in the string form stored locally
    pub fn hook_id(&self) -> String {
        self.id.to_string()
    }

    /// True when this hook delivers to `url`
    pub fn delivers_to(&self, url: &str) -> bool {
        self.config.url.as_deref() == Some(url)
    }
}

/// Delivery configuration of an existing hook
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Body of `POST /orgs/{org}/hooks`
#[derive(Debug, Clone, Serialize)]
pub struct CreateHookRequest {
    pub name: String,
    pub active: bool,
    pub events: Vec<String>,
    pub config: DeliveryConfig,
}

/// Delivery configuration we send, on creation and when adopting a hook
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryConfig {
    pub url: String,
    pub content_type: String,
    pub secret: String,
    pub insecure_ssl: String,
}

impl DeliveryConfig {
    /// JSON deliveries to `url`, signed with `secret`
    pub fn json(url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content_type: "json".to_string(),
            secret: secret.into(),
            insecure_ssl: "0".to_string(),
        }
    }
}

impl CreateHookRequest {
    /// JSON web hook delivering `events` to `url`, signed with `secret`
    pub fn web(url: impl Into<String>, secret: impl Into<String>, events: Vec<String>) -> Self {
        Self {
            name: "web".to_string(),
            active: true,
            events,
            config: DeliveryConfig::json(url, secret),
        }
    }
}

/// Body of `PATCH /orgs/{org}/hooks/{id}`
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateHookRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<DeliveryConfig>,
}

impl UpdateHookRequest {
    /// Activate a hook and point it at `url` with our `secret`.
    ///
    /// GitHub never returns a hook's secret, so an adopted hook is always
    /// rewritten with the one we store.
    pub fn adopt(url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            active: Some(true),
            config: Some(DeliveryConfig::json(url, secret)),
        }
    }
}
