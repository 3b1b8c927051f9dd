//! Reconciling many organizations with bounded concurrency.

use std::future::Future;
use std::pin::Pin;

use futures::stream::{FuturesUnordered, StreamExt};
use log::debug;

use super::{Outcome, WebhookReconciler};
use crate::client::GitHubApi;
use crate::error::Result;
use crate::models::{Credential, Organization, WebhookRecord};
use crate::store::WebhookRecordStore;

/// Type alias for boxed per-organization futures
type OrgFuture<'a> = Pin<Box<dyn Future<Output = (String, Result<Outcome>)> + 'a>>;

/// Reconcile every organization, at most `max_concurrent` at a time.
///
/// One organization failing does not stop the others; each result is
/// returned next to its organization login, in completion order.
pub async fn reconcile_all<'a, C, S>(
    reconciler: &'a WebhookReconciler<C, S>,
    targets: &'a [(Organization, WebhookRecord)],
    explicit_credential: Option<&'a Credential>,
    max_concurrent: usize,
) -> Vec<(String, Result<Outcome>)>
where
    C: GitHubApi + ?Sized,
    S: WebhookRecordStore + ?Sized,
{
    debug!(
        "Reconciling {} organizations with max {} concurrent",
        targets.len(),
        max_concurrent
    );

    let make_future = move |org: &'a Organization, record: &'a WebhookRecord| -> OrgFuture<'a> {
        Box::pin(async move {
            let result = reconciler
                .reconcile(org, record, explicit_credential.cloned())
                .await;
            (org.platform_org_id.clone(), result)
        })
    };

    let mut results = Vec::with_capacity(targets.len());
    let mut futures: FuturesUnordered<OrgFuture<'a>> = FuturesUnordered::new();
    let mut pending = targets.iter();

    // Seed initial batch up to max_concurrent
    for (org, record) in pending.by_ref().take(max_concurrent.max(1)) {
        futures.push(make_future(org, record));
    }

    // Keep the window full until every organization is done
    while let Some((org, result)) = futures.next().await {
        debug!("{} finished ({})", org, if result.is_ok() { "ok" } else { "error" });
        results.push((org, result));

        if let Some((org, record)) = pending.next() {
            futures.push(make_future(org, record));
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::MockGitHubClient;
    use crate::error::Error;
    use crate::models::ADMIN_ORG_HOOK_SCOPE;
    use crate::reconcile::HookSettings;
    use crate::store::SqliteStore;

    fn setup(orgs: &[(&str, bool)]) -> (Arc<MockGitHubClient>, Arc<SqliteStore>, Vec<(Organization, WebhookRecord)>) {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store
            .upsert_user("admin", Some("t"), &[ADMIN_ORG_HOOK_SCOPE.to_string()])
            .unwrap();

        let mut targets = Vec::new();
        for (login, with_admin) in orgs {
            store.add_organization(login).unwrap();
            if *with_admin {
                store.link_user(login, "admin").unwrap();
            }
            targets.push((
                store.load_organization(login).unwrap(),
                store.find_record(login).unwrap().unwrap(),
            ));
        }

        (Arc::new(MockGitHubClient::new()), store, targets)
    }

    fn reconciler(
        mock: &Arc<MockGitHubClient>,
        store: &Arc<SqliteStore>,
    ) -> WebhookReconciler<MockGitHubClient, SqliteStore> {
        WebhookReconciler::new(
            mock.clone(),
            store.clone(),
            HookSettings {
                webhook_url_prefix: Some("https://hooks.example.com".to_string()),
                events: vec!["*".to_string()],
            },
        )
    }

    #[tokio::test]
    async fn test_reconcile_all_empty() {
        let (mock, store, targets) = setup(&[]);
        let results = reconcile_all(&reconciler(&mock, &store), &targets, None, 4).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_other_orgs() {
        let (mock, store, targets) = setup(&[("org-a", true), ("org-b", false), ("org-c", true)]);
        let reconciler = reconciler(&mock, &store);

        let mut results = reconcile_all(&reconciler, &targets, None, 2).await;
        results.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(results.len(), 3);
        assert!(matches!(results[0].1, Ok(Outcome::Created { .. })));
        assert!(matches!(results[1].1, Err(Error::NoValidCredential { .. })));
        assert!(matches!(results[2].1, Ok(Outcome::Created { .. })));
        assert_eq!(mock.call_counts().await.create_org_hook, 2);
    }

    #[tokio::test]
    async fn test_explicit_credential_applies_to_every_org() {
        let (mock, store, targets) = setup(&[("org-a", false), ("org-b", false)]);
        let credential = Credential::explicit("t-explicit");

        let results = reconcile_all(&reconciler(&mock, &store), &targets, Some(&credential), 1).await;

        assert!(results.iter().all(|(_, r)| r.is_ok()));
        let requests = mock.captured_requests().await;
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.token == "t-explicit"));
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_makes_progress() {
        let (mock, store, targets) = setup(&[("org-a", true)]);
        let results = reconcile_all(&reconciler(&mock, &store), &targets, None, 0).await;
        assert_eq!(results.len(), 1);
    }
}
