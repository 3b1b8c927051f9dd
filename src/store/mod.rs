//! Local persistence for linked organizations and their webhook records
//!
//! Reconciliation only needs [`WebhookRecordStore`]; the SQLite store also
//! carries the organization/user bookkeeping the CLI uses.

pub mod sqlite;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::Result;
use crate::models::WebhookRecord;

pub use sqlite::SqliteStore;

/// Bytes of entropy in a webhook secret
const SECRET_BYTES: usize = 32;

/// Persistence contract consumed by the reconciler.
pub trait WebhookRecordStore: Send + Sync {
    /// Find the webhook record of an organization.
    fn find_record(&self, platform_org_id: &str) -> Result<Option<WebhookRecord>>;

    /// Replace the stored remote hook id, but only if it still equals
    /// `expected`.
    ///
    /// Fails with `Error::PersistenceConflict` when another writer changed the
    /// id first, or when `new_hook_id` is already stored on another record.
    fn set_remote_hook_id(
        &self,
        record_id: i64,
        expected: Option<&str>,
        new_hook_id: &str,
    ) -> Result<WebhookRecord>;
}

/// Generate a random webhook secret.
pub fn generate_webhook_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
