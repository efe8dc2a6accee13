//! In-memory backend for development and tests.
//!
//! Implements every collaborator trait over `tokio::sync::RwLock` tables.
//! Passwords are stored as SHA-256 digests, which is development-grade only;
//! production deployments put a real authentication service behind the
//! traits. Email dispatch is recorded in an in-process outbox instead of
//! being sent, so tests can assert on what would have gone out.

use super::{
    ACCOUNT_CLASS, AuthService, CreatedObject, ObjectCreator, ServiceError, ServiceFuture,
    ViewerResolver,
};
use crate::config::GatewayConfig;
use crate::context::{AuthContext, RequestInfo};
use crate::types::{AccountId, ClassName, Email, SessionToken, Username};
use crate::viewer::{AccountSummary, Viewer, ViewerSelection};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Kind of email a backend operation would have dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    /// Address-verification email sent on account creation or re-request.
    Verification,
    /// Password-reset email.
    PasswordReset,
}

/// One recorded would-be email dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailNotice {
    /// What kind of email this was.
    pub kind: EmailKind,
    /// Where it would have gone.
    pub email: Email,
}

#[derive(Debug, Clone)]
struct AccountRecord {
    id: AccountId,
    username: Username,
    email: Option<Email>,
    password_digest: String,
    email_verified: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct SessionRecord {
    account_id: AccountId,
    expires_at: DateTime<Utc>,
}

/// In-memory implementation of all three collaborator traits.
#[derive(Default)]
pub struct MemoryBackend {
    accounts: RwLock<HashMap<AccountId, AccountRecord>>,
    sessions: RwLock<HashMap<SessionToken, SessionRecord>>,
    outbox: RwLock<Vec<EmailNotice>>,
}

/// Digest a password for storage and comparison.
fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Generate an opaque session token: `r:` plus 128 bits of randomness.
fn generate_session_token() -> SessionToken {
    let secret = URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes());
    SessionToken::new(format!("r:{}", secret))
}

fn generate_account_id() -> AccountId {
    AccountId::new(Uuid::new_v4().to_string().replace("-", ""))
}

fn required_str(
    fields: &serde_json::Map<String, Value>,
    key: &str,
) -> Result<String, ServiceError> {
    match fields.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(ServiceError::MissingField(key.to_string())),
    }
}

fn optional_str(fields: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything the backend would have emailed so far, oldest first.
    pub async fn outbox(&self) -> Vec<EmailNotice> {
        self.outbox.read().await.clone()
    }

    /// Whether a session is currently live (present and unexpired).
    pub async fn session_exists(&self, token: &SessionToken) -> bool {
        match self.sessions.read().await.get(token) {
            Some(session) => session.expires_at > Utc::now(),
            None => false,
        }
    }

    /// Mark the account behind `email` as verified.
    ///
    /// Stands in for the verification-link click that happens outside this
    /// crate.
    pub async fn mark_email_verified(&self, email: &Email) -> Result<(), ServiceError> {
        let mut accounts = self.accounts.write().await;
        let record = accounts
            .values_mut()
            .find(|a| a.email.as_ref() == Some(email))
            .ok_or_else(|| ServiceError::AccountNotFound(email.to_string()))?;
        record.email_verified = true;
        Ok(())
    }

    async fn issue_session(&self, account_id: &AccountId, ttl_seconds: u64) -> SessionToken {
        let token = generate_session_token();
        let record = SessionRecord {
            account_id: account_id.clone(),
            expires_at: Utc::now() + Duration::seconds(ttl_seconds as i64),
        };
        self.sessions.write().await.insert(token.clone(), record);
        debug!(account = %account_id, ttl_seconds, "session issued");
        token
    }

    /// Look up a live session, removing it lazily if it has expired.
    async fn validate_session(&self, token: &SessionToken) -> Result<AccountId, ServiceError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let expired = match sessions.get(token) {
            Some(session) if session.expires_at > now => {
                return Ok(session.account_id.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            sessions.remove(token);
        }
        Err(ServiceError::InvalidSession)
    }

    async fn find_by_email(&self, email: &Email) -> Option<AccountRecord> {
        self.accounts
            .read()
            .await
            .values()
            .find(|a| a.email.as_ref() == Some(email))
            .cloned()
    }

    async fn record_email(&self, kind: EmailKind, email: &Email) {
        self.outbox.write().await.push(EmailNotice {
            kind,
            email: email.clone(),
        });
    }
}

impl ObjectCreator for MemoryBackend {
    fn create_object<'a>(
        &'a self,
        class: &'a ClassName,
        fields: serde_json::Map<String, Value>,
        ctx: &'a AuthContext,
    ) -> ServiceFuture<'a, CreatedObject> {
        Box::pin(async move {
            if class.as_str() != ACCOUNT_CLASS {
                return Err(ServiceError::Storage(format!(
                    "unsupported class: {}",
                    class
                )));
            }

            let username = Username::new(required_str(&fields, "username")?);
            let password = required_str(&fields, "password")?;
            let email = optional_str(&fields, "email").map(Email::new);

            let config = ctx.config();
            let record = {
                let mut accounts = self.accounts.write().await;

                if accounts.values().any(|a| a.username == username) {
                    return Err(ServiceError::DuplicateUsername(username.into_inner()));
                }
                if let Some(ref email) = email
                    && accounts.values().any(|a| a.email.as_ref() == Some(email))
                {
                    return Err(ServiceError::DuplicateEmail(email.to_string()));
                }

                let record = AccountRecord {
                    id: generate_account_id(),
                    username,
                    email: email.clone(),
                    password_digest: hash_password(&password),
                    email_verified: email.is_some() && !config.verify_account_emails,
                    created_at: Utc::now(),
                };
                accounts.insert(record.id.clone(), record.clone());
                record
            };

            if config.verify_account_emails
                && let Some(ref email) = record.email
            {
                self.record_email(EmailKind::Verification, email).await;
            }

            let session_token = self
                .issue_session(&record.id, config.session_ttl_seconds)
                .await;

            debug!(account = %record.id, "account created");
            Ok(CreatedObject {
                id: record.id,
                session_token,
            })
        })
    }
}

impl AuthService for MemoryBackend {
    fn sign_in<'a>(
        &'a self,
        username: &'a Username,
        password: &'a str,
        ctx: &'a AuthContext,
    ) -> ServiceFuture<'a, SessionToken> {
        Box::pin(async move {
            let record = {
                let accounts = self.accounts.read().await;
                accounts
                    .values()
                    .find(|a| &a.username == username)
                    .cloned()
                    // Unknown account reads the same as a bad password.
                    .ok_or(ServiceError::InvalidCredentials)?
            };

            if record.password_digest != hash_password(password) {
                return Err(ServiceError::InvalidCredentials);
            }

            let config = ctx.config();
            if config.prevent_login_with_unverified_email
                && record.email.is_some()
                && !record.email_verified
            {
                return Err(ServiceError::EmailNotVerified(username.to_string()));
            }

            Ok(self
                .issue_session(&record.id, config.session_ttl_seconds)
                .await)
        })
    }

    fn sign_out<'a>(&'a self, ctx: &'a AuthContext) -> ServiceFuture<'a, ()> {
        Box::pin(async move {
            let token = ctx
                .request_info()
                .session_token
                .clone()
                .ok_or(ServiceError::InvalidSession)?;

            let removed = self.sessions.write().await.remove(&token);
            match removed {
                Some(session) => {
                    debug!(account = %session.account_id, "session invalidated");
                    Ok(())
                }
                None => Err(ServiceError::InvalidSession),
            }
        })
    }

    fn request_password_reset<'a>(
        &'a self,
        email: &'a Email,
        _ctx: &'a AuthContext,
    ) -> ServiceFuture<'a, ()> {
        Box::pin(async move {
            if self.find_by_email(email).await.is_none() {
                return Err(ServiceError::AccountNotFound(email.to_string()));
            }
            self.record_email(EmailKind::PasswordReset, email).await;
            Ok(())
        })
    }

    fn request_verification_email<'a>(
        &'a self,
        email: &'a Email,
        _ctx: &'a AuthContext,
    ) -> ServiceFuture<'a, ()> {
        Box::pin(async move {
            let record = self
                .find_by_email(email)
                .await
                .ok_or_else(|| ServiceError::AccountNotFound(email.to_string()))?;

            // Re-requesting for an already-verified account acknowledges
            // without sending anything.
            if !record.email_verified {
                self.record_email(EmailKind::Verification, email).await;
            }
            Ok(())
        })
    }
}

impl ViewerResolver for MemoryBackend {
    fn resolve_viewer<'a>(
        &'a self,
        _config: &'a GatewayConfig,
        request_info: &'a RequestInfo,
        _selection: &'a ViewerSelection,
        path_prefix: &'a str,
        required: bool,
    ) -> ServiceFuture<'a, Option<Viewer>> {
        Box::pin(async move {
            let Some(token) = request_info.session_token.clone() else {
                if required {
                    return Err(ServiceError::InvalidSession);
                }
                return Ok(None);
            };

            let account_id = match self.validate_session(&token).await {
                Ok(id) => id,
                Err(e) if !required => {
                    debug!(path = path_prefix, "optional viewer not resolvable: {}", e);
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };

            let record = self
                .accounts
                .read()
                .await
                .get(&account_id)
                .cloned()
                .ok_or_else(|| ServiceError::AccountNotFound(account_id.to_string()))?;

            Ok(Some(Viewer {
                session_token: token,
                account: AccountSummary {
                    id: record.id,
                    username: record.username,
                    email: record.email,
                    email_verified: record.email_verified,
                    created_at: record.created_at,
                },
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn account_class() -> ClassName {
        ClassName::new(ACCOUNT_CLASS)
    }

    fn ctx_with(config: GatewayConfig) -> AuthContext {
        AuthContext::public(Arc::new(config))
    }

    fn fields(username: &str, password: &str, email: Option<&str>) -> serde_json::Map<String, Value> {
        let mut map = serde_json::Map::new();
        map.insert("username".to_string(), json!(username));
        map.insert("password".to_string(), json!(password));
        if let Some(email) = email {
            map.insert("email".to_string(), json!(email));
        }
        map
    }

    #[tokio::test]
    async fn test_create_account_issues_session() {
        let backend = MemoryBackend::new();
        let ctx = ctx_with(GatewayConfig::local());

        let created = backend
            .create_object(&account_class(), fields("alice", "hunter2", None), &ctx)
            .await
            .unwrap();

        assert!(created.session_token.as_str().starts_with("r:"));
        assert!(backend.session_exists(&created.session_token).await);
    }

    #[tokio::test]
    async fn test_create_account_rejects_duplicate_username() {
        let backend = MemoryBackend::new();
        let ctx = ctx_with(GatewayConfig::local());

        backend
            .create_object(&account_class(), fields("alice", "hunter2", None), &ctx)
            .await
            .unwrap();
        let err = backend
            .create_object(&account_class(), fields("alice", "other", None), &ctx)
            .await
            .unwrap_err();

        assert_eq!(err, ServiceError::DuplicateUsername("alice".to_string()));
    }

    #[tokio::test]
    async fn test_create_account_rejects_duplicate_email() {
        let backend = MemoryBackend::new();
        let ctx = ctx_with(GatewayConfig::local());

        backend
            .create_object(
                &account_class(),
                fields("alice", "hunter2", Some("a@example.com")),
                &ctx,
            )
            .await
            .unwrap();
        let err = backend
            .create_object(
                &account_class(),
                fields("bob", "other", Some("a@example.com")),
                &ctx,
            )
            .await
            .unwrap_err();

        assert_eq!(err, ServiceError::DuplicateEmail("a@example.com".to_string()));
    }

    #[tokio::test]
    async fn test_create_account_requires_password() {
        let backend = MemoryBackend::new();
        let ctx = ctx_with(GatewayConfig::local());

        let mut map = serde_json::Map::new();
        map.insert("username".to_string(), json!("alice"));

        let err = backend
            .create_object(&account_class(), map, &ctx)
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::MissingField("password".to_string()));
    }

    #[tokio::test]
    async fn test_create_account_rejects_unknown_class() {
        let backend = MemoryBackend::new();
        let ctx = ctx_with(GatewayConfig::local());

        let err = backend
            .create_object(
                &ClassName::new("_Installation"),
                fields("alice", "hunter2", None),
                &ctx,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)));
    }

    #[tokio::test]
    async fn test_verification_email_sent_on_creation_when_configured() {
        let backend = MemoryBackend::new();
        let ctx = ctx_with(GatewayConfig::with_email_verification("demo"));

        backend
            .create_object(
                &account_class(),
                fields("alice", "hunter2", Some("a@example.com")),
                &ctx,
            )
            .await
            .unwrap();

        let outbox = backend.outbox().await;
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].kind, EmailKind::Verification);
        assert_eq!(outbox[0].email, Email::new("a@example.com"));
    }

    #[tokio::test]
    async fn test_sign_in_success_and_failure() {
        let backend = MemoryBackend::new();
        let ctx = ctx_with(GatewayConfig::local());

        backend
            .create_object(&account_class(), fields("alice", "hunter2", None), &ctx)
            .await
            .unwrap();

        let token = backend
            .sign_in(&Username::new("alice"), "hunter2", &ctx)
            .await
            .unwrap();
        assert!(backend.session_exists(&token).await);

        let err = backend
            .sign_in(&Username::new("alice"), "wrong", &ctx)
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::InvalidCredentials);

        // Unknown accounts read the same as bad passwords.
        let err = backend
            .sign_in(&Username::new("nobody"), "hunter2", &ctx)
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_sign_in_refused_until_verified_under_strict_config() {
        let backend = MemoryBackend::new();
        let ctx = ctx_with(GatewayConfig::with_strict_email_verification("demo"));

        backend
            .create_object(
                &account_class(),
                fields("alice", "hunter2", Some("a@example.com")),
                &ctx,
            )
            .await
            .unwrap();

        let err = backend
            .sign_in(&Username::new("alice"), "hunter2", &ctx)
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::EmailNotVerified("alice".to_string()));

        backend
            .mark_email_verified(&Email::new("a@example.com"))
            .await
            .unwrap();
        backend
            .sign_in(&Username::new("alice"), "hunter2", &ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sign_out_invalidates_session() {
        let backend = MemoryBackend::new();
        let config = Arc::new(GatewayConfig::local());
        let ctx = AuthContext::public(config.clone());

        let created = backend
            .create_object(&account_class(), fields("alice", "hunter2", None), &ctx)
            .await
            .unwrap();

        let mut session_ctx = AuthContext::public(config);
        session_ctx
            .request_info_mut()
            .set_session_token(created.session_token.clone());

        backend.sign_out(&session_ctx).await.unwrap();
        assert!(!backend.session_exists(&created.session_token).await);

        // A second sign-out of the same session is an invalid-session error.
        let err = backend.sign_out(&session_ctx).await.unwrap_err();
        assert_eq!(err, ServiceError::InvalidSession);
    }

    #[tokio::test]
    async fn test_sign_out_without_session_fails() {
        let backend = MemoryBackend::new();
        let ctx = ctx_with(GatewayConfig::local());

        let err = backend.sign_out(&ctx).await.unwrap_err();
        assert_eq!(err, ServiceError::InvalidSession);
    }

    #[tokio::test]
    async fn test_password_reset_reports_unknown_email() {
        let backend = MemoryBackend::new();
        let ctx = ctx_with(GatewayConfig::local());

        let err = backend
            .request_password_reset(&Email::new("nobody@example.com"), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn test_password_reset_records_dispatch() {
        let backend = MemoryBackend::new();
        let ctx = ctx_with(GatewayConfig::local());

        backend
            .create_object(
                &account_class(),
                fields("alice", "hunter2", Some("a@example.com")),
                &ctx,
            )
            .await
            .unwrap();
        backend
            .request_password_reset(&Email::new("a@example.com"), &ctx)
            .await
            .unwrap();

        let outbox = backend.outbox().await;
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].kind, EmailKind::PasswordReset);
    }

    #[tokio::test]
    async fn test_verification_email_not_resent_once_verified() {
        let backend = MemoryBackend::new();
        let ctx = ctx_with(GatewayConfig::with_email_verification("demo"));
        let email = Email::new("a@example.com");

        backend
            .create_object(
                &account_class(),
                fields("alice", "hunter2", Some("a@example.com")),
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(backend.outbox().await.len(), 1);

        backend
            .request_verification_email(&email, &ctx)
            .await
            .unwrap();
        assert_eq!(backend.outbox().await.len(), 2);

        backend.mark_email_verified(&email).await.unwrap();
        backend
            .request_verification_email(&email, &ctx)
            .await
            .unwrap();
        // Acknowledged, but nothing new went out.
        assert_eq!(backend.outbox().await.len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_viewer_roundtrip() {
        let backend = MemoryBackend::new();
        let config = GatewayConfig::local();
        let ctx = ctx_with(config.clone());

        let created = backend
            .create_object(
                &account_class(),
                fields("alice", "hunter2", Some("a@example.com")),
                &ctx,
            )
            .await
            .unwrap();

        let info = RequestInfo::with_session_token(created.session_token.clone());
        let viewer = backend
            .resolve_viewer(&config, &info, &ViewerSelection::all(), "viewer.account.", true)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(viewer.session_token, created.session_token);
        assert_eq!(viewer.account.id, created.id);
        assert_eq!(viewer.account.username, Username::new("alice"));
    }

    #[tokio::test]
    async fn test_resolve_viewer_required_without_session_fails() {
        let backend = MemoryBackend::new();
        let config = GatewayConfig::local();
        let info = RequestInfo::new();

        let err = backend
            .resolve_viewer(&config, &info, &ViewerSelection::all(), "viewer.account.", true)
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::InvalidSession);

        let optional = backend
            .resolve_viewer(&config, &info, &ViewerSelection::all(), "viewer.account.", false)
            .await
            .unwrap();
        assert!(optional.is_none());
    }

    #[tokio::test]
    async fn test_resolve_viewer_expired_session() {
        let backend = MemoryBackend::new();
        let config = GatewayConfig {
            session_ttl_seconds: 0,
            ..GatewayConfig::local()
        };
        let ctx = ctx_with(config.clone());

        let created = backend
            .create_object(&account_class(), fields("alice", "hunter2", None), &ctx)
            .await
            .unwrap();

        let info = RequestInfo::with_session_token(created.session_token.clone());
        let err = backend
            .resolve_viewer(&config, &info, &ViewerSelection::all(), "viewer.account.", true)
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::InvalidSession);

        // Expired sessions are removed lazily on validation.
        assert!(!backend.session_exists(&created.session_token).await);
    }
}
