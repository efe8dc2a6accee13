//! Gateway configuration.
//!
//! `GatewayConfig` is built by the embedding application and handed to the
//! per-request context read-only. The gateway itself never loads
//! configuration from disk or the environment.

use serde::{Deserialize, Serialize};

/// One year, the default lifetime of an issued session.
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 31_536_000;

/// Policy configuration for the account mutation surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Application name, used in log lines and email subjects.
    pub app_name: String,
    /// Lifetime of issued session credentials in seconds.
    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: u64,
    /// Whether the account mutations are registered into the schema at all.
    /// When false, `register_mutations` is a no-op and the surrounding
    /// schema exposes no account operations.
    #[serde(default = "default_expose_account_mutations")]
    pub expose_account_mutations: bool,
    /// Whether new accounts start unverified and receive a verification
    /// email on creation.
    #[serde(default)]
    pub verify_account_emails: bool,
    /// Whether sign-in is refused until the account's email is verified.
    /// Only meaningful together with `verify_account_emails`.
    #[serde(default)]
    pub prevent_login_with_unverified_email: bool,
}

fn default_session_ttl_seconds() -> u64 {
    DEFAULT_SESSION_TTL_SECONDS
}

fn default_expose_account_mutations() -> bool {
    true
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            app_name: "account-gateway".to_string(),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            expose_account_mutations: true,
            verify_account_emails: false,
            prevent_login_with_unverified_email: false,
        }
    }
}

impl GatewayConfig {
    /// Create a config for local development: no email verification.
    pub fn local() -> Self {
        Self::default()
    }

    /// Create a config that verifies account emails on creation.
    pub fn with_email_verification(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            verify_account_emails: true,
            ..Default::default()
        }
    }

    /// Create a config that additionally refuses sign-in until the email
    /// is verified.
    pub fn with_strict_email_verification(app_name: impl Into<String>) -> Self {
        Self {
            prevent_login_with_unverified_email: true,
            ..Self::with_email_verification(app_name)
        }
    }
}
