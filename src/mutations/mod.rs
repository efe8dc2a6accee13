//! The account mutation surface.
//!
//! Five operations under one uniform contract: `signUp`, `logIn`, `logOut`
//! (returning the viewer), and `resetPassword` / `sendVerificationEmail`
//! (always acknowledging). The [`MutationGateway`] sequences each operation
//! against the collaborator traits in [`crate::service`], threads issued
//! session credentials through the per-request [`crate::context::AuthContext`],
//! and normalizes every failure into one [`MutationError`] channel.
//!
//! The schema surface (input/output type declarations per operation) lives
//! in [`schema`] as pure configuration, registered into the surrounding
//! schema through the [`schema::SchemaRegistrar`] collaborator.

mod error;
mod gateway;
mod payload;
mod request;
pub mod schema;

pub use error::{ErrorKind, MutationError};
pub use gateway::{MutationGateway, VIEWER_PATH_PREFIX};
pub use payload::{MutationPayload, OkPayload, PayloadBody, ViewerPayload};
pub use request::{MutationRequest, OperationInput};
pub use schema::{
    FieldKind, FieldSpec, MutationDescriptor, MutationKind, SchemaRegistrar, register_mutations,
};
