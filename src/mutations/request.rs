//! Tagged mutation inputs.
//!
//! The schema layer validates the caller's arguments against the
//! operation's descriptor and constructs an [`OperationInput`] exactly
//! once; the gateway dispatches on the tag. Malformed input never reaches
//! the gateway body.

use super::error::MutationError;
use super::schema::MutationKind;
use crate::types::{ClientMutationId, Email, Username};
use serde_json::Value;

/// Input to one mutation execution, tagged by operation kind.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationInput {
    /// Create a new account and sign it in.
    SignUp {
        /// Open field map for the new account (username, password, email, ...).
        account_fields: serde_json::Map<String, Value>,
    },
    /// Verify a username/password pair.
    LogIn {
        /// Sign-in name.
        username: Username,
        /// Plaintext password, forwarded to the auth service unmodified.
        password: String,
    },
    /// Invalidate the current session.
    LogOut,
    /// Request a password-reset email.
    ResetPassword {
        /// Address of the account to reset.
        email: Email,
    },
    /// Re-request the verification email.
    SendVerificationEmail {
        /// Address of the account to verify.
        email: Email,
    },
}

impl OperationInput {
    /// The operation kind this input is tagged with.
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::SignUp { .. } => MutationKind::SignUp,
            Self::LogIn { .. } => MutationKind::LogIn,
            Self::LogOut => MutationKind::LogOut,
            Self::ResetPassword { .. } => MutationKind::ResetPassword,
            Self::SendVerificationEmail { .. } => MutationKind::SendVerificationEmail,
        }
    }

    /// Validate `args` against the kind's descriptor and construct the
    /// tagged input.
    pub fn from_args(
        kind: MutationKind,
        args: &serde_json::Map<String, Value>,
    ) -> Result<Self, MutationError> {
        kind.descriptor().validate_args(args)?;

        let input = match kind {
            MutationKind::SignUp => Self::SignUp {
                account_fields: object_field(args, "accountFields")?,
            },
            MutationKind::LogIn => Self::LogIn {
                username: Username::new(str_field(args, "username")?),
                password: str_field(args, "password")?,
            },
            MutationKind::LogOut => Self::LogOut,
            MutationKind::ResetPassword => Self::ResetPassword {
                email: Email::new(str_field(args, "email")?),
            },
            MutationKind::SendVerificationEmail => Self::SendVerificationEmail {
                email: Email::new(str_field(args, "email")?),
            },
        };
        Ok(input)
    }
}

/// One mutation request: the tagged input plus the caller's correlation
/// token, echoed back unchanged in the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
    /// Caller-supplied correlation token, if any.
    pub client_mutation_id: Option<ClientMutationId>,
    /// The operation to execute.
    pub input: OperationInput,
}

impl MutationRequest {
    /// Create a request with no correlation token.
    pub fn new(input: OperationInput) -> Self {
        Self {
            client_mutation_id: None,
            input,
        }
    }

    /// Attach the caller's correlation token.
    pub fn with_client_mutation_id(mut self, id: impl Into<ClientMutationId>) -> Self {
        self.client_mutation_id = Some(id.into());
        self
    }

    /// Build a request from raw schema-layer arguments.
    pub fn from_args(
        kind: MutationKind,
        args: &serde_json::Map<String, Value>,
    ) -> Result<Self, MutationError> {
        let input = OperationInput::from_args(kind, args)?;
        let client_mutation_id = args
            .get("clientMutationId")
            .and_then(Value::as_str)
            .map(ClientMutationId::from);
        Ok(Self {
            client_mutation_id,
            input,
        })
    }
}

fn str_field(
    args: &serde_json::Map<String, Value>,
    name: &str,
) -> Result<String, MutationError> {
    args.get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| MutationError::validation(format!("Missing required field: {}", name)))
}

fn object_field(
    args: &serde_json::Map<String, Value>,
    name: &str,
) -> Result<serde_json::Map<String, Value>, MutationError> {
    match args.get(name) {
        Some(Value::Object(map)) => Ok(map.clone()),
        _ => Err(MutationError::validation(format!(
            "Missing required field: {}",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutations::error::ErrorKind;
    use serde_json::json;

    fn args(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_from_args_log_in() {
        let request = MutationRequest::from_args(
            MutationKind::LogIn,
            &args(json!({
                "username": "alice",
                "password": "hunter2",
                "clientMutationId": "corr-1",
            })),
        )
        .unwrap();

        assert_eq!(
            request.input,
            OperationInput::LogIn {
                username: Username::new("alice"),
                password: "hunter2".to_string(),
            }
        );
        assert_eq!(
            request.client_mutation_id,
            Some(ClientMutationId::new("corr-1"))
        );
    }

    #[test]
    fn test_from_args_log_out_takes_no_input() {
        let request = MutationRequest::from_args(MutationKind::LogOut, &args(json!({}))).unwrap();
        assert_eq!(request.input, OperationInput::LogOut);
        assert!(request.client_mutation_id.is_none());
    }

    #[test]
    fn test_from_args_sign_up_keeps_open_fields() {
        let request = MutationRequest::from_args(
            MutationKind::SignUp,
            &args(json!({
                "accountFields": {
                    "username": "alice",
                    "password": "hunter2",
                    "favoriteColor": "teal",
                },
            })),
        )
        .unwrap();

        let OperationInput::SignUp { account_fields } = request.input else {
            panic!("wrong variant");
        };
        assert_eq!(account_fields["favoriteColor"], "teal");
    }

    #[test]
    fn test_from_args_rejects_malformed_input() {
        let err = MutationRequest::from_args(
            MutationKind::LogIn,
            &args(json!({ "username": "alice" })),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_input_kind_roundtrip() {
        let input = OperationInput::ResetPassword {
            email: Email::new("a@example.com"),
        };
        assert_eq!(input.kind(), MutationKind::ResetPassword);
        assert_eq!(input.kind().name(), "resetPassword");
    }
}
