//! Local domain models: organizations, their linked users, and webhook records

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Scope a token needs to manage organization hooks
pub const ADMIN_ORG_HOOK_SCOPE: &str = "admin:org_hook";

/// Longest login GitHub allows
const MAX_LOGIN_LEN: usize = 39;

/// True when `login` has GitHub's login shape: ASCII letters, digits and
/// inner hyphens, at most 39 characters.
pub fn is_valid_login(login: &str) -> bool {
    !login.is_empty()
        && login.len() <= MAX_LOGIN_LEN
        && !login.starts_with('-')
        && !login.ends_with('-')
        && login.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// A GitHub organization linked to orghook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    /// Local row id
    pub id: i64,

    /// Organization login on GitHub
    pub platform_org_id: String,

    /// Linked users, in the order they were linked
    #[serde(default)]
    pub users: Vec<User>,
}

/// A GitHub user whose token may be used on behalf of an organization
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    /// Local row id
    pub id: i64,

    /// GitHub login
    pub login: String,

    /// OAuth or personal access token
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// Scopes granted to the token
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl User {
    /// True when this user's token can manage organization hooks.
    pub fn has_admin_org_hook_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
            && self.scopes.iter().any(|s| s == ADMIN_ORG_HOOK_SCOPE)
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("login", &self.login)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Reconciled webhook state for one organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookRecord {
    /// Local row id
    pub id: i64,

    /// Organization login on GitHub
    pub platform_org_id: String,

    /// Hook id on GitHub, absent until the first successful creation
    pub remote_hook_id: Option<String>,

    /// Shared secret GitHub signs deliveries with
    #[serde(skip_serializing)]
    pub webhook_secret: String,
}

/// Where a credential came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Passed in by the caller
    Explicit,
    /// Taken from the linked user with this login
    User(String),
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Explicit => write!(f, "explicit token"),
            CredentialSource::User(login) => write!(f, "user {}", login),
        }
    }
}

/// A bearer token selected for a reconciliation run
#[derive(Clone)]
pub struct Credential {
    token: String,
    source: CredentialSource,
}

impl Credential {
    /// Credential supplied by the caller, bypassing user selection
    pub fn explicit(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            source: CredentialSource::Explicit,
        }
    }

    /// Credential taken from a linked user
    pub fn from_user(login: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            source: CredentialSource::User(login.into()),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn source(&self) -> &CredentialSource {
        &self.source
    }

    /// Short SHA-256 fingerprint, safe to log
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.token.as_bytes());
        digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("source", &self.source)
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}
