//! The mutation gateway: uniform sequencing for the five account
//! operations.
//!
//! Every operation follows the same protocol: invoke the auth collaborator,
//! thread the resulting credential into the request context, resolve the
//! viewer when the output shape requires one, and normalize any failure
//! once at the operation boundary. The one deliberate exception is
//! [`MutationGateway::log_out`], which resolves the viewer *before*
//! invalidation — the post-sign-out actor identity is no longer resolvable.

use super::error::{ErrorKind, MutationError};
use super::payload::{MutationPayload, OkPayload, PayloadBody, ViewerPayload};
use super::request::{MutationRequest, OperationInput};
use crate::context::AuthContext;
use crate::service::{
    ACCOUNT_CLASS, AuthService, ObjectCreator, ServiceError, ViewerResolver,
};
use crate::types::{ClassName, Email, Username};
use crate::viewer::{Viewer, ViewerSelection};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Output position the viewer is resolved into, used for logging.
pub const VIEWER_PATH_PREFIX: &str = "viewer.account.";

/// Executes account mutations against the three collaborators.
#[derive(Clone)]
pub struct MutationGateway {
    objects: Arc<dyn ObjectCreator>,
    auth: Arc<dyn AuthService>,
    viewers: Arc<dyn ViewerResolver>,
}

impl MutationGateway {
    /// Create a gateway over the given collaborators.
    pub fn new(
        objects: Arc<dyn ObjectCreator>,
        auth: Arc<dyn AuthService>,
        viewers: Arc<dyn ViewerResolver>,
    ) -> Self {
        Self {
            objects,
            auth,
            viewers,
        }
    }

    /// Execute one mutation request, dispatching on its input tag.
    ///
    /// The caller's correlation token is echoed back in the payload
    /// unchanged.
    pub async fn execute(
        &self,
        request: MutationRequest,
        ctx: &mut AuthContext,
        selection: &ViewerSelection,
    ) -> Result<MutationPayload, MutationError> {
        let MutationRequest {
            client_mutation_id,
            input,
        } = request;

        let body = match input {
            OperationInput::SignUp { account_fields } => {
                PayloadBody::Viewer(self.sign_up(account_fields, ctx, selection).await?)
            }
            OperationInput::LogIn { username, password } => PayloadBody::Viewer(
                self.log_in(&username, &password, ctx, selection).await?,
            ),
            OperationInput::LogOut => {
                PayloadBody::Viewer(self.log_out(ctx, selection).await?)
            }
            OperationInput::ResetPassword { email } => {
                PayloadBody::Ok(self.reset_password(&email, ctx).await?)
            }
            OperationInput::SendVerificationEmail { email } => {
                PayloadBody::Ok(self.send_verification_email(&email, ctx).await?)
            }
        };

        Ok(MutationPayload {
            client_mutation_id,
            body,
        })
    }

    /// Create a new account, sign it in, and return it as the viewer.
    pub async fn sign_up(
        &self,
        account_fields: serde_json::Map<String, Value>,
        ctx: &mut AuthContext,
        selection: &ViewerSelection,
    ) -> Result<ViewerPayload, MutationError> {
        let class = ClassName::new(ACCOUNT_CLASS);
        let created = self.objects.create_object(&class, account_fields, ctx).await?;

        debug!(account = %created.id, "account created, writing session into request info");
        ctx.request_info_mut()
            .set_session_token(created.session_token);

        let viewer = self.resolve_required_viewer(ctx, selection).await?;
        Ok(ViewerPayload { viewer })
    }

    /// Sign in an existing account and return it as the viewer.
    pub async fn log_in(
        &self,
        username: &Username,
        password: &str,
        ctx: &mut AuthContext,
        selection: &ViewerSelection,
    ) -> Result<ViewerPayload, MutationError> {
        let token = self.auth.sign_in(username, password, ctx).await?;

        debug!("sign-in verified, writing session into request info");
        ctx.request_info_mut().set_session_token(token);

        let viewer = self.resolve_required_viewer(ctx, selection).await?;
        Ok(ViewerPayload { viewer })
    }

    /// Invalidate the current session and return the signed-out account as
    /// the viewer.
    pub async fn log_out(
        &self,
        ctx: &mut AuthContext,
        selection: &ViewerSelection,
    ) -> Result<ViewerPayload, MutationError> {
        // Capture the viewer first: once the session is invalidated the
        // current actor can no longer be resolved.
        let viewer = self.resolve_required_viewer(ctx, selection).await?;

        self.auth.sign_out(ctx).await?;
        ctx.request_info_mut().clear_session_token();
        debug!("session invalidated and cleared from request info");

        Ok(ViewerPayload { viewer })
    }

    /// Trigger a password-reset email. Always acknowledges.
    pub async fn reset_password(
        &self,
        email: &Email,
        ctx: &AuthContext,
    ) -> Result<OkPayload, MutationError> {
        match self.auth.request_password_reset(email, ctx).await {
            Ok(()) => {}
            // Anti-enumeration: an unknown address acknowledges exactly
            // like a known one.
            Err(ServiceError::AccountNotFound(_)) => {
                debug!("password reset requested for unknown email, acknowledging");
            }
            Err(err) => return Err(err.into()),
        }
        Ok(OkPayload::default())
    }

    /// Trigger the verification email again. Always acknowledges.
    pub async fn send_verification_email(
        &self,
        email: &Email,
        ctx: &AuthContext,
    ) -> Result<OkPayload, MutationError> {
        match self.auth.request_verification_email(email, ctx).await {
            Ok(()) => {}
            Err(ServiceError::AccountNotFound(_)) => {
                debug!("verification email requested for unknown email, acknowledging");
            }
            Err(err) => return Err(err.into()),
        }
        Ok(OkPayload::default())
    }

    /// Resolve the viewer the output shape requires, from the context as
    /// it stands now.
    async fn resolve_required_viewer(
        &self,
        ctx: &AuthContext,
        selection: &ViewerSelection,
    ) -> Result<Viewer, MutationError> {
        self.viewers
            .resolve_viewer(
                ctx.config(),
                ctx.request_info(),
                selection,
                VIEWER_PATH_PREFIX,
                true,
            )
            .await
            .map_err(|err| MutationError::resolution(&err))?
            .ok_or_else(|| {
                MutationError::new(ErrorKind::Resolution, "Viewer could not be resolved")
            })
    }
}
