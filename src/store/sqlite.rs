//! SQLite-backed record store

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{WebhookRecordStore, generate_webhook_secret};
use crate::error::{Error, Result, StoreError};
use crate::models::{Organization, User, WebhookRecord, is_valid_login};

/// Schema version stored in `PRAGMA user_version`
const SCHEMA_VERSION: i32 = 1;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS organizations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        platform_org_id TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        login TEXT NOT NULL UNIQUE,
        token TEXT,
        scopes TEXT NOT NULL DEFAULT ''
    );

    CREATE TABLE IF NOT EXISTS organization_users (
        organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        PRIMARY KEY (organization_id, user_id)
    );

    CREATE TABLE IF NOT EXISTS organization_webhooks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        platform_org_id TEXT NOT NULL UNIQUE,
        remote_hook_id TEXT UNIQUE,
        webhook_secret TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_org_users_position
        ON organization_users(organization_id, position);
"#;

/// SQLite record store.
///
/// The connection is wrapped in a Mutex so the store can be shared across
/// concurrent reconciliations.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Io(format!("Failed to create database dir: {}", e)))?;
        }
        Self::init(Connection::open(path)?)
    }

    /// In-memory database (for testing)
    #[allow(dead_code)]
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        let version: i32 = conn.pragma_query_value(None, "user_version", |r| r.get(0))?;
        if version != 0 && version != SCHEMA_VERSION {
            return Err(StoreError::Database(format!(
                "Unsupported schema version {} (expected {})",
                version, SCHEMA_VERSION
            ))
            .into());
        }

        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("Store lock poisoned".to_string()).into())
    }

    /// Link an organization and create its webhook record with a fresh secret.
    pub fn add_organization(&self, platform_org_id: &str) -> Result<(Organization, WebhookRecord)> {
        if !is_valid_login(platform_org_id) {
            return Err(StoreError::InvalidLogin(platform_org_id.to_string()).into());
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO organizations (platform_org_id) VALUES (?1)",
            [platform_org_id],
        )?;
        let org_id = tx.last_insert_rowid();

        let secret = generate_webhook_secret();
        tx.execute(
            "INSERT INTO organization_webhooks (platform_org_id, remote_hook_id, webhook_secret)
             VALUES (?1, NULL, ?2)",
            params![platform_org_id, secret],
        )?;
        let record_id = tx.last_insert_rowid();

        tx.commit()?;
        log::info!("Linked organization {}", platform_org_id);

        Ok((
            Organization {
                id: org_id,
                platform_org_id: platform_org_id.to_string(),
                users: Vec::new(),
            },
            WebhookRecord {
                id: record_id,
                platform_org_id: platform_org_id.to_string(),
                remote_hook_id: None,
                webhook_secret: secret,
            },
        ))
    }

    /// Remove an organization, its user links and its webhook record.
    ///
    /// Returns false if the organization was not linked.
    pub fn remove_organization(&self, platform_org_id: &str) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM organization_webhooks WHERE platform_org_id = ?1",
            [platform_org_id],
        )?;
        let removed = tx.execute(
            "DELETE FROM organizations WHERE platform_org_id = ?1",
            [platform_org_id],
        )?;

        tx.commit()?;
        Ok(removed > 0)
    }

    /// Logins of all linked organizations, in link order
    pub fn organization_logins(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT platform_org_id FROM organizations ORDER BY id")?;
        let logins = stmt
            .query_map([], |r| r.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(logins)
    }

    /// Load an organization with its users in link order
    pub fn load_organization(&self, platform_org_id: &str) -> Result<Organization> {
        let conn = self.conn()?;

        let org_id: i64 = conn
            .query_row(
                "SELECT id FROM organizations WHERE platform_org_id = ?1",
                [platform_org_id],
                |r| r.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::OrgNotFound(platform_org_id.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT u.id, u.login, u.token, u.scopes
             FROM organization_users ou
             JOIN users u ON u.id = ou.user_id
             WHERE ou.organization_id = ?1
             ORDER BY ou.position",
        )?;
        let users = stmt
            .query_map([org_id], user_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Organization {
            id: org_id,
            platform_org_id: platform_org_id.to_string(),
            users,
        })
    }

    /// Create a user or replace its token and scopes
    pub fn upsert_user(&self, login: &str, token: Option<&str>, scopes: &[String]) -> Result<User> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (login, token, scopes) VALUES (?1, ?2, ?3)
             ON CONFLICT(login) DO UPDATE SET token = excluded.token, scopes = excluded.scopes",
            params![login, token, scopes.join(",")],
        )?;

        let user = conn.query_row(
            "SELECT id, login, token, scopes FROM users WHERE login = ?1",
            [login],
            user_from_row,
        )?;
        Ok(user)
    }

    /// Link a user to an organization.
    ///
    /// Returns false if the user was already linked; the original position is kept.
    pub fn link_user(&self, platform_org_id: &str, login: &str) -> Result<bool> {
        let conn = self.conn()?;

        let org_id: i64 = conn
            .query_row(
                "SELECT id FROM organizations WHERE platform_org_id = ?1",
                [platform_org_id],
                |r| r.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::OrgNotFound(platform_org_id.to_string()))?;

        let user_id: i64 = conn
            .query_row("SELECT id FROM users WHERE login = ?1", [login], |r| r.get(0))
            .optional()?
            .ok_or_else(|| StoreError::UserNotFound(login.to_string()))?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO organization_users (organization_id, user_id, position)
             SELECT ?1, ?2, COALESCE(MAX(position), -1) + 1
             FROM organization_users WHERE organization_id = ?1",
            params![org_id, user_id],
        )?;
        Ok(inserted > 0)
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let scopes: String = row.get(3)?;
    Ok(User {
        id: row.get(0)?,
        login: row.get(1)?,
        token: row.get(2)?,
        scopes: scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<WebhookRecord> {
    Ok(WebhookRecord {
        id: row.get(0)?,
        platform_org_id: row.get(1)?,
        remote_hook_id: row.get(2)?,
        webhook_secret: row.get(3)?,
    })
}

impl WebhookRecordStore for SqliteStore {
    fn find_record(&self, platform_org_id: &str) -> Result<Option<WebhookRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                "SELECT id, platform_org_id, remote_hook_id, webhook_secret
                 FROM organization_webhooks WHERE platform_org_id = ?1",
                [platform_org_id],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn set_remote_hook_id(
        &self,
        record_id: i64,
        expected: Option<&str>,
        new_hook_id: &str,
    ) -> Result<WebhookRecord> {
        let conn = self.conn()?;

        // `IS` compares NULL to NULL as equal, which `=` does not
        let updated = conn.execute(
            "UPDATE organization_webhooks SET remote_hook_id = ?1
             WHERE id = ?2 AND remote_hook_id IS ?3",
            params![new_hook_id, record_id, expected],
        )?;

        let record = conn
            .query_row(
                "SELECT id, platform_org_id, remote_hook_id, webhook_secret
                 FROM organization_webhooks WHERE id = ?1",
                [record_id],
                record_from_row,
            )
            .optional()?
            .ok_or_else(|| StoreError::RecordNotFound(format!("record #{}", record_id)))?;

        if updated == 0 {
            return Err(Error::PersistenceConflict(format!(
                "remote hook id of '{}' changed concurrently (expected {:?}, found {:?})",
                record.platform_org_id, expected, record.remote_hook_id
            )));
        }

        Ok(record)
    }
}
