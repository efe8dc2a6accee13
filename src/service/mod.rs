//! Collaborator interfaces consumed by the mutation gateway.
//!
//! The gateway orchestrates three capabilities it does not implement:
//!
//! - **`ObjectCreator`**: persists a new account and issues its first
//!   session credential (the sign-up path).
//! - **`AuthService`**: verifies credentials, invalidates sessions, and
//!   dispatches password-reset / verification emails.
//! - **`ViewerResolver`**: resolves the current actor from the session
//!   credential in the request info.
//!
//! Production implementations wrap the real authentication service; the
//! crate ships [`MemoryBackend`] as an in-process implementation for
//! development and tests.
//!
//! The traits are dyn-compatible (boxed-future style) so the gateway can
//! hold them as `Arc<dyn _>` without caring which backend is behind them.

mod memory;

pub use memory::{EmailKind, EmailNotice, MemoryBackend};

use crate::config::GatewayConfig;
use crate::context::{AuthContext, RequestInfo};
use crate::types::{AccountId, ClassName, Email, SessionToken, Username};
use crate::viewer::{Viewer, ViewerSelection};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by collaborator trait methods.
pub type ServiceFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, ServiceError>> + Send + 'a>>;

/// The class name under which accounts are persisted.
pub const ACCOUNT_CLASS: &str = "_Account";

/// Failures reported by collaborators.
///
/// Collaborators report conditions truthfully; policy decisions such as
/// anti-enumeration suppression belong to the gateway, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Username/password pair did not verify.
    InvalidCredentials,
    /// No account matches the given identifier.
    AccountNotFound(String),
    /// The session credential is missing, unknown, or expired.
    InvalidSession,
    /// Sign-in refused because the account's email is not verified.
    EmailNotVerified(String),
    /// An account with this username already exists.
    DuplicateUsername(String),
    /// An account with this email already exists.
    DuplicateEmail(String),
    /// A required field was absent from the account fields.
    MissingField(String),
    /// The storage layer failed.
    Storage(String),
    /// Email dispatch failed.
    Email(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "Invalid username/password"),
            Self::AccountNotFound(who) => write!(f, "No account found for {}", who),
            Self::InvalidSession => write!(f, "Invalid session token"),
            Self::EmailNotVerified(who) => {
                write!(f, "Email for account {} is not verified", who)
            }
            Self::DuplicateUsername(name) => {
                write!(f, "Account already exists for username {}", name)
            }
            Self::DuplicateEmail(email) => {
                write!(f, "Account already exists for email {}", email)
            }
            Self::MissingField(field) => write!(f, "Missing required field: {}", field),
            Self::Storage(msg) => write!(f, "Storage error: {}", msg),
            Self::Email(msg) => write!(f, "Email dispatch error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Result of persisting a new object that signs its creator in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedObject {
    /// Identifier of the persisted record.
    pub id: AccountId,
    /// Session credential issued for the new account.
    pub session_token: SessionToken,
}

/// Persists new objects.
///
/// Class-generic by contract; the gateway only ever creates the account
/// class, and creating an account signs it in (the returned credential).
pub trait ObjectCreator: Send + Sync {
    /// Persist a new object of `class` and issue a session for it.
    ///
    /// Fails with `DuplicateUsername` / `DuplicateEmail` on uniqueness
    /// violations and `MissingField` when required fields are absent.
    fn create_object<'a>(
        &'a self,
        class: &'a ClassName,
        fields: serde_json::Map<String, Value>,
        ctx: &'a AuthContext,
    ) -> ServiceFuture<'a, CreatedObject>;
}

/// Stateful authentication operations.
pub trait AuthService: Send + Sync {
    /// Verify a username/password pair and issue a session credential.
    fn sign_in<'a>(
        &'a self,
        username: &'a Username,
        password: &'a str,
        ctx: &'a AuthContext,
    ) -> ServiceFuture<'a, SessionToken>;

    /// Invalidate the session credential carried by the request info.
    fn sign_out<'a>(&'a self, ctx: &'a AuthContext) -> ServiceFuture<'a, ()>;

    /// Dispatch a password-reset email to the account behind `email`.
    ///
    /// Reports `AccountNotFound` truthfully when no such account exists;
    /// the gateway decides whether that surfaces.
    fn request_password_reset<'a>(
        &'a self,
        email: &'a Email,
        ctx: &'a AuthContext,
    ) -> ServiceFuture<'a, ()>;

    /// Re-dispatch the verification email for the account behind `email`.
    fn request_verification_email<'a>(
        &'a self,
        email: &'a Email,
        ctx: &'a AuthContext,
    ) -> ServiceFuture<'a, ()>;
}

/// Resolves the current actor from the request's session credential.
pub trait ViewerResolver: Send + Sync {
    /// Resolve the viewer the caller's selection asks for.
    ///
    /// `path_prefix` labels the output position being resolved (for
    /// logging). Fails with `InvalidSession` when `required` is true and
    /// the request info carries no valid credential; resolves to `None`
    /// in the same situation when `required` is false.
    fn resolve_viewer<'a>(
        &'a self,
        config: &'a GatewayConfig,
        request_info: &'a RequestInfo,
        selection: &'a ViewerSelection,
        path_prefix: &'a str,
        required: bool,
    ) -> ServiceFuture<'a, Option<Viewer>>;
}
