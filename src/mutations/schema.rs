//! Operation-to-type binding: the declarative schema surface.
//!
//! Each operation kind is bound to a [`MutationDescriptor`] naming its
//! input and output fields. The descriptors are pure configuration; the
//! only logic here is checking that required input fields are present with
//! the right primitive type before the gateway body runs, and handing the
//! descriptor set to the surrounding schema's [`SchemaRegistrar`].

use super::error::MutationError;
use crate::config::GatewayConfig;
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// The five operation kinds, enumerated so the compiler enforces that every
/// kind has input, output, and sequencing logic defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Create a new account and sign it in.
    SignUp,
    /// Sign in an existing account.
    LogIn,
    /// Invalidate the current session.
    LogOut,
    /// Request a password-reset email.
    ResetPassword,
    /// Re-request the verification email.
    SendVerificationEmail,
}

impl MutationKind {
    /// Every operation kind, in registration order.
    pub const ALL: [MutationKind; 5] = [
        MutationKind::SignUp,
        MutationKind::LogIn,
        MutationKind::LogOut,
        MutationKind::ResetPassword,
        MutationKind::SendVerificationEmail,
    ];

    /// The declarative type binding for this kind.
    pub fn descriptor(self) -> &'static MutationDescriptor {
        match self {
            Self::SignUp => &SIGN_UP,
            Self::LogIn => &LOG_IN,
            Self::LogOut => &LOG_OUT,
            Self::ResetPassword => &RESET_PASSWORD,
            Self::SendVerificationEmail => &SEND_VERIFICATION_EMAIL,
        }
    }

    /// The mutation's schema-level name.
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}

/// Primitive type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A JSON string.
    String,
    /// A JSON boolean.
    Boolean,
    /// An open JSON object (e.g., the sign-up account fields).
    Object,
    /// The viewer type owned by the surrounding schema.
    Viewer,
}

impl FieldKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Object | Self::Viewer => value.is_object(),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "String"),
            Self::Boolean => write!(f, "Boolean"),
            Self::Object => write!(f, "Object"),
            Self::Viewer => write!(f, "Viewer"),
        }
    }
}

/// One declared input or output field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Schema-level field name.
    pub name: &'static str,
    /// Primitive type of the field.
    pub kind: FieldKind,
    /// Whether the field must be present (non-null).
    pub required: bool,
    /// Human-readable description registered into the schema.
    pub description: &'static str,
}

/// Declarative binding of one operation to its input/output type pair.
#[derive(Debug, Clone)]
pub struct MutationDescriptor {
    /// Schema-level mutation name.
    pub name: &'static str,
    /// Human-readable description registered into the schema.
    pub description: &'static str,
    /// Accepted input fields, in declaration order.
    pub inputs: &'static [FieldSpec],
    /// Produced output fields, in declaration order.
    pub outputs: &'static [FieldSpec],
}

impl MutationDescriptor {
    /// Check that `args` satisfies this descriptor's input declaration.
    ///
    /// Required fields must be present and non-null; present fields must
    /// match their declared primitive type; fields the descriptor does not
    /// declare are rejected.
    pub fn validate_args(
        &self,
        args: &serde_json::Map<String, Value>,
    ) -> Result<(), MutationError> {
        for spec in self.inputs {
            match args.get(spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(MutationError::validation(format!(
                            "Missing required field: {}",
                            spec.name
                        )));
                    }
                }
                Some(value) => {
                    if !spec.kind.matches(value) {
                        return Err(MutationError::validation(format!(
                            "Field {} must be of type {}",
                            spec.name, spec.kind
                        )));
                    }
                }
            }
        }

        for key in args.keys() {
            if !self.inputs.iter().any(|spec| spec.name == key) {
                return Err(MutationError::validation(format!(
                    "Unknown field: {}",
                    key
                )));
            }
        }

        Ok(())
    }
}

/// Correlation token accepted and echoed by every mutation.
const CLIENT_MUTATION_ID: FieldSpec = FieldSpec {
    name: "clientMutationId",
    kind: FieldKind::String,
    required: false,
    description: "Opaque correlation token echoed back unchanged.",
};

const VIEWER_OUTPUT: FieldSpec = FieldSpec {
    name: "viewer",
    kind: FieldKind::Viewer,
    required: true,
    description: "The current actor, resolved from the request's session.",
};

const OK_OUTPUT: FieldSpec = FieldSpec {
    name: "ok",
    kind: FieldKind::Boolean,
    required: true,
    description: "It's always true.",
};

static SIGN_UP: MutationDescriptor = MutationDescriptor {
    name: "signUp",
    description: "The signUp mutation can be used to create and sign up a new account.",
    inputs: &[
        FieldSpec {
            name: "accountFields",
            kind: FieldKind::Object,
            required: true,
            description: "These are the fields of the new account to be created and signed up.",
        },
        CLIENT_MUTATION_ID,
    ],
    outputs: &[VIEWER_OUTPUT, CLIENT_MUTATION_ID],
};

static LOG_IN: MutationDescriptor = MutationDescriptor {
    name: "logIn",
    description: "The logIn mutation can be used to log in an existing account.",
    inputs: &[
        FieldSpec {
            name: "username",
            kind: FieldKind::String,
            required: true,
            description: "This is the username used to log in the account.",
        },
        FieldSpec {
            name: "password",
            kind: FieldKind::String,
            required: true,
            description: "This is the password used to log in the account.",
        },
        CLIENT_MUTATION_ID,
    ],
    outputs: &[VIEWER_OUTPUT, CLIENT_MUTATION_ID],
};

static LOG_OUT: MutationDescriptor = MutationDescriptor {
    name: "logOut",
    description: "The logOut mutation can be used to log out an existing account.",
    inputs: &[CLIENT_MUTATION_ID],
    outputs: &[VIEWER_OUTPUT, CLIENT_MUTATION_ID],
};

static RESET_PASSWORD: MutationDescriptor = MutationDescriptor {
    name: "resetPassword",
    description: "The resetPassword mutation can be used to reset the password of an existing account.",
    inputs: &[
        FieldSpec {
            name: "email",
            kind: FieldKind::String,
            required: true,
            description: "Email of the account that should receive the reset email.",
        },
        CLIENT_MUTATION_ID,
    ],
    outputs: &[OK_OUTPUT, CLIENT_MUTATION_ID],
};

static SEND_VERIFICATION_EMAIL: MutationDescriptor = MutationDescriptor {
    name: "sendVerificationEmail",
    description: "The sendVerificationEmail mutation can be used to send the verification email again.",
    inputs: &[
        FieldSpec {
            name: "email",
            kind: FieldKind::String,
            required: true,
            description: "Email of the account that should receive the verification email.",
        },
        CLIENT_MUTATION_ID,
    ],
    outputs: &[OK_OUTPUT, CLIENT_MUTATION_ID],
};

/// Consumes the declared operations before the first request is served.
///
/// Implemented by the surrounding schema layer; this crate only hands the
/// descriptors over.
pub trait SchemaRegistrar {
    /// Register one mutation's type binding.
    fn register_mutation(&mut self, descriptor: &'static MutationDescriptor);
}

/// Register every account mutation into the surrounding schema.
///
/// No-op when the config disables the account mutation surface.
pub fn register_mutations(registrar: &mut dyn SchemaRegistrar, config: &GatewayConfig) {
    if !config.expose_account_mutations {
        debug!("account mutations disabled, skipping schema registration");
        return;
    }

    for kind in MutationKind::ALL {
        registrar.register_mutation(kind.descriptor());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingRegistrar {
        names: Vec<&'static str>,
    }

    impl SchemaRegistrar for RecordingRegistrar {
        fn register_mutation(&mut self, descriptor: &'static MutationDescriptor) {
            self.names.push(descriptor.name);
        }
    }

    fn args(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_all_kinds_have_distinct_names() {
        let names: Vec<_> = MutationKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(
            names,
            [
                "signUp",
                "logIn",
                "logOut",
                "resetPassword",
                "sendVerificationEmail"
            ]
        );
    }

    #[test]
    fn test_every_descriptor_accepts_client_mutation_id() {
        for kind in MutationKind::ALL {
            let descriptor = kind.descriptor();
            assert!(
                descriptor
                    .inputs
                    .iter()
                    .any(|spec| spec.name == "clientMutationId"),
                "{} lacks clientMutationId",
                descriptor.name
            );
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_input() {
        let descriptor = MutationKind::LogIn.descriptor();
        descriptor
            .validate_args(&args(json!({
                "username": "alice",
                "password": "hunter2",
                "clientMutationId": "abc",
            })))
            .unwrap();
    }

    #[test]
    fn test_validate_rejects_missing_required_field() {
        let descriptor = MutationKind::LogIn.descriptor();
        let err = descriptor
            .validate_args(&args(json!({ "username": "alice" })))
            .unwrap_err();
        assert_eq!(err.message(), "Missing required field: password");
    }

    #[test]
    fn test_validate_rejects_null_required_field() {
        let descriptor = MutationKind::ResetPassword.descriptor();
        let err = descriptor
            .validate_args(&args(json!({ "email": null })))
            .unwrap_err();
        assert_eq!(err.message(), "Missing required field: email");
    }

    #[test]
    fn test_validate_rejects_wrong_primitive_type() {
        let descriptor = MutationKind::SignUp.descriptor();
        let err = descriptor
            .validate_args(&args(json!({ "accountFields": "not-an-object" })))
            .unwrap_err();
        assert_eq!(err.message(), "Field accountFields must be of type Object");
    }

    #[test]
    fn test_validate_rejects_unknown_field() {
        let descriptor = MutationKind::LogOut.descriptor();
        let err = descriptor
            .validate_args(&args(json!({ "username": "alice" })))
            .unwrap_err();
        assert_eq!(err.message(), "Unknown field: username");
    }

    #[test]
    fn test_register_mutations_in_order() {
        let mut registrar = RecordingRegistrar::default();
        register_mutations(&mut registrar, &GatewayConfig::local());
        assert_eq!(
            registrar.names,
            [
                "signUp",
                "logIn",
                "logOut",
                "resetPassword",
                "sendVerificationEmail"
            ]
        );
    }

    #[test]
    fn test_register_mutations_disabled() {
        let mut registrar = RecordingRegistrar::default();
        let config = GatewayConfig {
            expose_account_mutations: false,
            ..GatewayConfig::local()
        };
        register_mutations(&mut registrar, &config);
        assert!(registrar.names.is_empty());
    }
}
