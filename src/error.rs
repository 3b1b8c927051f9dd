//! Error types for orghook

use std::time::Duration;
use thiserror::Error;

/// Result type alias for orghook operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    /// No linked user has a token carrying the `admin:org_hook` scope.
    #[error(
        "No linked user of organization '{org}' has a token with the admin:org_hook scope. Relink an admin with `orghook user add`."
    )]
    NoValidCredential { org: String },

    /// A GitHub API call failed. Carries the operation and organization.
    #[error("GitHub {operation} for organization '{org}' failed: {source}")]
    Remote {
        operation: &'static str,
        org: String,
        #[source]
        source: ApiError,
    },

    /// The store rejected a write because another writer got there first.
    #[error("Persistence conflict: {0}")]
    PersistenceConflict(String),

    /// Some organizations of a batch could not be reconciled.
    #[error("{failed} of {total} organizations could not be reconciled")]
    PartialFailure { failed: usize, total: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap an API error with the remote operation and organization it came from.
    pub fn remote(operation: &'static str, org: impl Into<String>, source: ApiError) -> Self {
        Error::Remote {
            operation,
            org: org.into(),
            source,
        }
    }
}

/// GitHub API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed. The token was rejected.")]
    Unauthorized,

    #[error("Access denied. The token lacks permission for this resource.")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded. Retry after {0:?}")]
    RateLimit(Duration),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// GitHub answers 422 with this message when a hook with the same URL exists.
    pub fn is_hook_already_exists(&self) -> bool {
        matches!(self, ApiError::Validation(msg) if msg.contains("already exists"))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to API".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error(
        "Webhook URL prefix is not set. Set `webhook_url_prefix` in the config file or ORGHOOK_WEBHOOK_URL_PREFIX."
    )]
    MissingWebhookUrlPrefix,
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Record store errors that are not uniqueness conflicts
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Organization '{0}' is not linked. Run `orghook org add {0}`.")]
    OrgNotFound(String),

    #[error("'{0}' is not a valid GitHub organization login")]
    InvalidLogin(String),

    #[error("User '{0}' not found. Run `orghook user add {0}`.")]
    UserNotFound(String),

    #[error("No webhook record for organization '{0}'")]
    RecordNotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Store I/O error: {0}")]
    Io(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, ref msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::PersistenceConflict(msg.clone().unwrap_or_else(|| e.to_string()))
            }
            other => Error::Store(StoreError::Database(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_valid_credential_names_org() {
        let err = Error::NoValidCredential {
            org: "octo-org".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("octo-org"));
        assert!(msg.contains("admin:org_hook"));
    }

    #[test]
    fn test_remote_error_carries_context() {
        let err = Error::remote(
            "create hook",
            "octo-org",
            ApiError::Network("Connection refused".to_string()),
        );
        let msg = err.to_string();
        assert!(msg.contains("create hook"));
        assert!(msg.contains("octo-org"));
        assert!(msg.contains("Connection refused"));
    }

    #[test]
    fn test_api_error_rate_limit() {
        let err = ApiError::RateLimit(Duration::from_secs(30));
        let msg = err.to_string();
        assert!(msg.contains("Rate limit"));
        assert!(msg.contains("30"));
    }

    #[test]
    fn test_hook_already_exists_detection() {
        let err = ApiError::Validation("Hook already exists on this organization".to_string());
        assert!(err.is_hook_already_exists());

        let err = ApiError::Validation("config.url is invalid".to_string());
        assert!(!err.is_hook_already_exists());

        let err = ApiError::BadRequest("already exists".to_string());
        assert!(!err.is_hook_already_exists());
    }

    #[test]
    fn test_config_error_missing_prefix() {
        let err = ConfigError::MissingWebhookUrlPrefix;
        assert!(err.to_string().contains("ORGHOOK_WEBHOOK_URL_PREFIX"));
    }

    #[test]
    fn test_store_error_messages() {
        assert!(
            StoreError::OrgNotFound("acme".to_string())
                .to_string()
                .contains("orghook org add acme")
        );
        assert!(
            StoreError::UserNotFound("mona".to_string())
                .to_string()
                .contains("orghook user add mona")
        );
    }

    #[test]
    fn test_error_from_config_error() {
        let err: Error = ConfigError::MissingWebhookUrlPrefix.into();

        match err {
            Error::Config(ConfigError::MissingWebhookUrlPrefix) => (),
            _ => panic!("Expected Error::Config(ConfigError::MissingWebhookUrlPrefix)"),
        }
    }

    #[test]
    fn test_constraint_violation_maps_to_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err: Error = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();

        match err {
            Error::PersistenceConflict(msg) => assert!(msg.contains("UNIQUE")),
            other => panic!("Expected PersistenceConflict, got {other:?}"),
        }
    }

    #[test]
    fn test_other_sqlite_errors_map_to_store() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err: Error = conn
            .execute("SELECT * FROM missing_table", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Store(StoreError::Database(_))));
    }

    #[test]
    fn test_config_error_from_yaml_error() {
        let yaml_str = "invalid: [yaml: content";
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let config_err: ConfigError = yaml_err.into();

        match config_err {
            ConfigError::ParseError(_) => (),
            _ => panic!("Expected ConfigError::ParseError"),
        }
    }
}
