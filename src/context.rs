//! Per-request context threaded through every mutation step.
//!
//! Exactly one `AuthContext` exists per inbound request. The surrounding
//! transport layer creates it, passes it `&mut` into the gateway, and
//! discards it at request end. The gateway mutates only the `RequestInfo`
//! half; config and principal are read-only for the whole request.
//!
//! Steps within one request are strictly sequential: every collaborator
//! call is awaited before the next step touches the context, and the `&mut`
//! borrow makes sharing one context across concurrent mutations a compile
//! error rather than a data race.

use crate::config::GatewayConfig;
use crate::types::SessionToken;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identity of the caller issuing the request.
///
/// Fixed at request start by the transport layer; a mutation may issue a
/// new session credential mid-request, but that lands in [`RequestInfo`],
/// never here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthPrincipal {
    /// Unauthenticated caller.
    Public,
    /// Caller authenticated by a session credential.
    Session {
        /// The credential the caller presented.
        token: SessionToken,
    },
    /// Trusted server-side caller bypassing per-account checks.
    Master,
}

impl AuthPrincipal {
    /// Check whether this is the trusted master principal.
    pub fn is_master(&self) -> bool {
        matches!(self, Self::Master)
    }

    /// The session credential the caller presented, if any.
    pub fn session_token(&self) -> Option<&SessionToken> {
        match self {
            Self::Session { token } => Some(token),
            _ => None,
        }
    }
}

/// Mutable per-request record.
///
/// Holds the session credential the request currently operates under plus
/// client metadata for audit logging. Mutations write or clear the
/// credential here so a subsequent viewer resolution in the same request
/// sees it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestInfo {
    /// The current session credential, if any.
    pub session_token: Option<SessionToken>,
    /// Installation identifier reported by the client.
    pub installation_id: Option<String>,
    /// Client version string (for audit logging).
    pub client_version: Option<String>,
}

impl RequestInfo {
    /// Create an empty request info with no session credential.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a request info carrying an existing session credential.
    pub fn with_session_token(token: SessionToken) -> Self {
        Self {
            session_token: Some(token),
            ..Default::default()
        }
    }

    /// Record a freshly issued session credential.
    pub fn set_session_token(&mut self, token: SessionToken) {
        self.session_token = Some(token);
    }

    /// Drop the session credential after invalidation.
    pub fn clear_session_token(&mut self) {
        self.session_token = None;
    }
}

/// Per-request bag of config, caller identity, and mutable request info.
#[derive(Debug, Clone)]
pub struct AuthContext {
    config: Arc<GatewayConfig>,
    principal: AuthPrincipal,
    request_info: RequestInfo,
}

impl AuthContext {
    /// Create a context for a request with no session credential.
    pub fn new(config: Arc<GatewayConfig>, principal: AuthPrincipal) -> Self {
        let request_info = match &principal {
            AuthPrincipal::Session { token } => {
                RequestInfo::with_session_token(token.clone())
            }
            _ => RequestInfo::new(),
        };
        Self {
            config,
            principal,
            request_info,
        }
    }

    /// Create an unauthenticated context, the common case for sign-up,
    /// sign-in, and the two request-style operations.
    pub fn public(config: Arc<GatewayConfig>) -> Self {
        Self::new(config, AuthPrincipal::Public)
    }

    /// Set client metadata for audit logging.
    pub fn with_client_info(
        mut self,
        installation_id: Option<String>,
        client_version: Option<String>,
    ) -> Self {
        self.request_info.installation_id = installation_id;
        self.request_info.client_version = client_version;
        self
    }

    /// Get the process-wide configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Get the identity of the caller issuing the request.
    pub fn principal(&self) -> &AuthPrincipal {
        &self.principal
    }

    /// Get the mutable request record (read access).
    pub fn request_info(&self) -> &RequestInfo {
        &self.request_info
    }

    /// Get the mutable request record (write access).
    ///
    /// Only the gateway writes here, and only between awaited steps.
    pub fn request_info_mut(&mut self) -> &mut RequestInfo {
        &mut self.request_info
    }
}
