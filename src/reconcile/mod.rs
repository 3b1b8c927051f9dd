//! Webhook reconciliation
//!
//! Makes sure an organization has an active hook pointing at our callback
//! URL:
//! - [`credential`] picks an admin-scoped token from the linked users
//! - [`probe`] checks the known hook on GitHub
//! - [`WebhookReconciler`] creates or adopts a hook when needed and records its id
//!
//! Every failure is a distinct [`Error`] variant; nothing is turned into a
//! `false` result.

pub mod batch;
pub mod credential;
pub mod probe;

use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;

use crate::client::{CreateHookRequest, GitHubApi, UpdateHookRequest};
use crate::config::{Config, webhook_url_from_prefix};
use crate::error::{ApiError, Error, Result};
use crate::models::{Credential, Organization, WebhookRecord};
use crate::store::WebhookRecordStore;

pub use batch::reconcile_all;
pub use credential::select_credential;

/// Hook settings the reconciler needs when it has to create a hook
#[derive(Debug, Clone)]
pub struct HookSettings {
    /// Base URL GitHub delivers to; unset means hooks cannot be created
    pub webhook_url_prefix: Option<String>,
    /// Events to subscribe new hooks to
    pub events: Vec<String>,
}

impl HookSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            webhook_url_prefix: config.webhook_url_prefix.clone(),
            events: config.webhook_events.clone(),
        }
    }

    fn webhook_url(&self) -> Result<String> {
        webhook_url_from_prefix(self.webhook_url_prefix.as_deref())
    }
}

/// What a reconciliation run did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The recorded hook was already active; nothing changed
    AlreadyActive { hook_id: String },
    /// A new hook was created
    Created { hook_id: String },
    /// An active hook with our URL already existed and was recorded
    Adopted { hook_id: String },
    /// An inactive hook with our URL was re-activated and recorded
    Reactivated { hook_id: String },
}

impl Outcome {
    pub fn hook_id(&self) -> &str {
        match self {
            Outcome::AlreadyActive { hook_id }
            | Outcome::Created { hook_id }
            | Outcome::Adopted { hook_id }
            | Outcome::Reactivated { hook_id } => hook_id,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::AlreadyActive { hook_id } => write!(f, "hook {} already active", hook_id),
            Outcome::Created { hook_id } => write!(f, "created hook {}", hook_id),
            Outcome::Adopted { hook_id } => write!(f, "adopted existing hook {}", hook_id),
            Outcome::Reactivated { hook_id } => write!(f, "re-activated hook {}", hook_id),
        }
    }
}

/// Keeps organization hooks active.
///
/// Holds no per-organization state, so one reconciler can serve many
/// organizations concurrently.
pub struct WebhookReconciler<C: ?Sized, S: ?Sized> {
    client: Arc<C>,
    store: Arc<S>,
    settings: HookSettings,
}

impl<C, S> WebhookReconciler<C, S>
where
    C: GitHubApi + ?Sized,
    S: WebhookRecordStore + ?Sized,
{
    pub fn new(client: Arc<C>, store: Arc<S>, settings: HookSettings) -> Self {
        Self {
            client,
            store,
            settings,
        }
    }

    /// Ensure `org` has an active hook. Returns `Ok(true)` on success.
    ///
    /// With `explicit_credential` the linked users are not consulted at all.
    #[allow(dead_code)]
    pub async fn ensure_active(
        &self,
        org: &Organization,
        record: &WebhookRecord,
        explicit_credential: Option<Credential>,
    ) -> Result<bool> {
        self.reconcile(org, record, explicit_credential)
            .await
            .map(|_| true)
    }

    /// Like [`ensure_active`](Self::ensure_active), reporting what was done.
    pub async fn reconcile(
        &self,
        org: &Organization,
        record: &WebhookRecord,
        explicit_credential: Option<Credential>,
    ) -> Result<Outcome> {
        let credential = match explicit_credential {
            Some(credential) => credential,
            None => select_credential(org)?,
        };
        debug!(
            "Reconciling {} with {} ({})",
            org.platform_org_id,
            credential.source(),
            credential.fingerprint()
        );

        if probe::is_active(self.client.as_ref(), record, &credential).await? {
            let hook_id = record.remote_hook_id.clone().unwrap_or_default();
            debug!("{}: hook {} is active", org.platform_org_id, hook_id);
            return Ok(Outcome::AlreadyActive { hook_id });
        }

        self.create_or_replace(org, record, &credential).await
    }

    /// Create a hook (or adopt the one GitHub says already exists) and
    /// record its id over whatever id the record held.
    async fn create_or_replace(
        &self,
        org: &Organization,
        record: &WebhookRecord,
        credential: &Credential,
    ) -> Result<Outcome> {
        let org_login = org.platform_org_id.as_str();

        // No create call without a callback URL
        let url = self.settings.webhook_url()?;
        let request = CreateHookRequest::web(
            url.as_str(),
            record.webhook_secret.as_str(),
            self.settings.events.clone(),
        );

        let outcome = match self
            .client
            .create_org_hook(credential, org_login, &request)
            .await
        {
            Ok(hook) => {
                info!("{}: created hook {}", org_login, hook.id);
                Outcome::Created {
                    hook_id: hook.hook_id(),
                }
            }
            Err(e) if e.is_hook_already_exists() => {
                self.adopt_existing(org_login, record, &url, credential, e)
                    .await?
            }
            Err(e) => return Err(Error::remote("create hook", org_login, e)),
        };

        self.store.set_remote_hook_id(
            record.id,
            record.remote_hook_id.as_deref(),
            outcome.hook_id(),
        )?;

        Ok(outcome)
    }

    /// Take over the hook that already delivers to `url`.
    ///
    /// The hook is always patched active with the record's secret, since the
    /// secret it was created with is unknown.
    async fn adopt_existing(
        &self,
        org_login: &str,
        record: &WebhookRecord,
        url: &str,
        credential: &Credential,
        create_error: ApiError,
    ) -> Result<Outcome> {
        debug!("{}: hook for {} already exists, looking it up", org_login, url);

        let hooks = self
            .client
            .list_org_hooks(credential, org_login)
            .await
            .map_err(|e| Error::remote("list hooks", org_login, e))?;

        let Some(existing) = hooks.into_iter().find(|h| h.delivers_to(url)) else {
            return Err(Error::remote("create hook", org_login, create_error));
        };
        let hook_id = existing.hook_id();

        let request = UpdateHookRequest::adopt(url, record.webhook_secret.as_str());
        self.client
            .update_org_hook(credential, org_login, &hook_id, &request)
            .await
            .map_err(|e| Error::remote("adopt hook", org_login, e))?;

        if existing.active {
            info!("{}: adopted existing hook {}", org_login, hook_id);
            Ok(Outcome::Adopted { hook_id })
        } else {
            info!("{}: re-activated hook {}", org_login, hook_id);
            Ok(Outcome::Reactivated { hook_id })
        }
    }
}
