//! Authentication mutation gateway.
//!
//! Exposes account lifecycle operations (sign-up, log-in, log-out,
//! password-reset request, verification-email re-request) through a uniform
//! mutation contract, delegating credential verification, password
//! handling, and email dispatch to an external authentication service
//! behind the collaborator traits in [`service`].
//!
//! The load-bearing piece is the session-context propagation protocol:
//! each mutation may issue or invalidate a session credential, writes it
//! into the per-request [`AuthContext`], and a subsequent viewer resolution
//! in the same request observes it — strictly sequentially, with no shared
//! mutable state beyond the one context the request owns.

// Core modules
mod config;
mod context;
mod types;
mod viewer;

pub mod mutations;
pub mod service;

// Re-export key types
pub use config::{DEFAULT_SESSION_TTL_SECONDS, GatewayConfig};
pub use context::{AuthContext, AuthPrincipal, RequestInfo};
pub use mutations::{
    ErrorKind, MutationError, MutationGateway, MutationKind, MutationPayload, MutationRequest,
    OperationInput, register_mutations,
};
pub use service::{MemoryBackend, ServiceError};
pub use types::{AccountId, ClassName, ClientMutationId, Email, SessionToken, Username};
pub use viewer::{AccountSummary, Viewer, ViewerSelection};

use std::sync::Arc;

/// Convenience constructor for a gateway backed by the in-memory backend.
///
/// Returns the backend alongside the gateway so callers (and tests) can
/// inspect the email outbox and session table.
pub fn memory_gateway() -> (MutationGateway, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let gateway = MutationGateway::new(backend.clone(), backend.clone(), backend.clone());
    (gateway, backend)
}
