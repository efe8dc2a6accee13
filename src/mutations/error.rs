//! The single mutation-level error channel.
//!
//! Every collaborator failure is normalized here, once per operation, into
//! a [`MutationError`] carrying one of four kinds and a human-readable
//! message. Callers never see collaborator internals or backtraces.

use crate::service::ServiceError;
use std::fmt;

/// Classification of a mutation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing input, rejected before the gateway body runs.
    Validation,
    /// Bad credentials, unknown account, or an invalid/expired session.
    Authentication,
    /// Account creation failed (e.g., duplicate username) or storage broke.
    Persistence,
    /// The viewer could not be resolved when the output required one.
    Resolution,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Authentication => write!(f, "authentication"),
            Self::Persistence => write!(f, "persistence"),
            Self::Resolution => write!(f, "resolution"),
        }
    }
}

/// Normalized failure surfaced as a mutation's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationError {
    kind: ErrorKind,
    message: String,
}

impl MutationError {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Wrap a collaborator failure from the viewer-resolution channel.
    ///
    /// Resolution failures get their own kind regardless of the underlying
    /// `ServiceError` variant: what failed is the resolution step.
    pub fn resolution(err: &ServiceError) -> Self {
        Self::new(ErrorKind::Resolution, err.to_string())
    }

    /// What went wrong, broadly.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}

impl std::error::Error for MutationError {}

/// The centralized mapping from collaborator failures to error kinds.
///
/// This is the normalization applied at each operation's boundary for the
/// auth-call channel; the resolution channel goes through
/// [`MutationError::resolution`] instead.
impl From<ServiceError> for MutationError {
    fn from(err: ServiceError) -> Self {
        let kind = match &err {
            ServiceError::MissingField(_) => ErrorKind::Validation,
            ServiceError::InvalidCredentials
            | ServiceError::AccountNotFound(_)
            | ServiceError::InvalidSession
            | ServiceError::EmailNotVerified(_) => ErrorKind::Authentication,
            ServiceError::DuplicateUsername(_)
            | ServiceError::DuplicateEmail(_)
            | ServiceError::Storage(_)
            | ServiceError::Email(_) => ErrorKind::Persistence,
        };
        Self::new(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_kind_mapping() {
        let cases = [
            (
                ServiceError::MissingField("password".to_string()),
                ErrorKind::Validation,
            ),
            (ServiceError::InvalidCredentials, ErrorKind::Authentication),
            (
                ServiceError::AccountNotFound("a@example.com".to_string()),
                ErrorKind::Authentication,
            ),
            (ServiceError::InvalidSession, ErrorKind::Authentication),
            (
                ServiceError::EmailNotVerified("alice".to_string()),
                ErrorKind::Authentication,
            ),
            (
                ServiceError::DuplicateUsername("alice".to_string()),
                ErrorKind::Persistence,
            ),
            (
                ServiceError::DuplicateEmail("a@example.com".to_string()),
                ErrorKind::Persistence,
            ),
            (
                ServiceError::Storage("down".to_string()),
                ErrorKind::Persistence,
            ),
        ];
        for (err, kind) in cases {
            assert_eq!(MutationError::from(err).kind(), kind);
        }
    }

    #[test]
    fn test_resolution_channel_overrides_kind() {
        // The same underlying failure maps differently depending on which
        // channel it arrived through.
        let err = ServiceError::InvalidSession;
        assert_eq!(
            MutationError::from(err.clone()).kind(),
            ErrorKind::Authentication
        );
        assert_eq!(MutationError::resolution(&err).kind(), ErrorKind::Resolution);
    }

    #[test]
    fn test_display_carries_kind_and_message() {
        let err = MutationError::validation("Missing required field: email");
        assert_eq!(
            err.to_string(),
            "validation error: Missing required field: email"
        );
    }
}
