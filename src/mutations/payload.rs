//! Mutation success payloads.

use crate::types::ClientMutationId;
use crate::viewer::{Viewer, ViewerSelection};
use serde_json::{Value, json};

/// Output of the three viewer-returning operations.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerPayload {
    /// The resolved current actor.
    pub viewer: Viewer,
}

/// Output of the two request-style operations. Always reports success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OkPayload {
    /// It's always true.
    pub ok: bool,
}

impl Default for OkPayload {
    fn default() -> Self {
        Self { ok: true }
    }
}

/// Body of a mutation payload, tagged by output shape.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadBody {
    /// `{viewer}` output (signUp, logIn, logOut).
    Viewer(ViewerPayload),
    /// `{ok: true}` output (resetPassword, sendVerificationEmail).
    Ok(OkPayload),
}

/// A mutation's success result: the body plus the echoed correlation token.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationPayload {
    /// The caller's correlation token, unchanged.
    pub client_mutation_id: Option<ClientMutationId>,
    /// The operation's output.
    pub body: PayloadBody,
}

impl MutationPayload {
    /// The viewer, when this payload carries one.
    pub fn viewer(&self) -> Option<&Viewer> {
        match &self.body {
            PayloadBody::Viewer(payload) => Some(&payload.viewer),
            PayloadBody::Ok(_) => None,
        }
    }

    /// Serialize for the schema layer, pruning the viewer to `selection`.
    pub fn to_value(&self, selection: &ViewerSelection) -> Value {
        let mut value = match &self.body {
            PayloadBody::Viewer(payload) => json!({
                "viewer": payload.viewer.to_value(selection),
            }),
            PayloadBody::Ok(payload) => json!({ "ok": payload.ok }),
        };
        if let Some(id) = &self.client_mutation_id {
            value["clientMutationId"] = json!(id);
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_payload_is_always_true() {
        assert!(OkPayload::default().ok);
    }

    #[test]
    fn test_to_value_echoes_client_mutation_id() {
        let payload = MutationPayload {
            client_mutation_id: Some(ClientMutationId::new("corr-9")),
            body: PayloadBody::Ok(OkPayload::default()),
        };
        let value = payload.to_value(&ViewerSelection::all());
        assert_eq!(value["ok"], true);
        assert_eq!(value["clientMutationId"], "corr-9");
    }

    #[test]
    fn test_to_value_without_client_mutation_id() {
        let payload = MutationPayload {
            client_mutation_id: None,
            body: PayloadBody::Ok(OkPayload::default()),
        };
        let value = payload.to_value(&ViewerSelection::all());
        assert!(value.get("clientMutationId").is_none());
    }
}
