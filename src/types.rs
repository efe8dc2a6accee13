//! NewType wrappers for strong typing throughout the gateway.
//!
//! These types prevent accidental mixing of semantically different strings
//! (e.g., passing a username where an email is expected, or an account ID
//! where a session token is expected).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate a NewType wrapper with standard trait implementations.
macro_rules! newtype_string {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner String.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_string!(
    /// Opaque credential identifying an authenticated actor.
    ///
    /// Issued by the auth service on sign-up and sign-in, cleared on
    /// sign-out. The gateway threads it through the per-request context so
    /// later steps of the same request can resolve the current actor; it
    /// never inspects the token's contents.
    SessionToken
);

newtype_string!(
    /// Stable identifier for an account record.
    ///
    /// Assigned by the persistence collaborator when the account is
    /// created. Distinct from `Username`, which is the credential the
    /// account holder signs in with.
    AccountId
);

newtype_string!(
    /// Sign-in name of an account.
    Username
);

newtype_string!(
    /// Email address associated with an account.
    ///
    /// Used by the two request-style operations (password reset,
    /// verification email) to address the account without a session.
    Email
);

newtype_string!(
    /// Name of a persisted object class (e.g., the account class).
    ///
    /// The object-creation collaborator is class-generic; the gateway only
    /// ever asks it for the account class.
    ClassName
);

newtype_string!(
    /// Opaque correlation token supplied by the caller of a mutation.
    ///
    /// Echoed back unchanged in the mutation payload. Unrelated to session
    /// state.
    ClientMutationId
);
