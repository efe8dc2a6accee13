//! The viewer: the resolved representation of "the current actor".
//!
//! A viewer is derived from the session credential in the request context.
//! Callers ask for it through a [`ViewerSelection`] naming the account
//! fields they want back.

use crate::types::{AccountId, Email, SessionToken, Username};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Account fields exposed through the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    /// Stable account identifier.
    pub id: AccountId,
    /// Sign-in name.
    pub username: Username,
    /// Email address, if one is on file.
    pub email: Option<Email>,
    /// Whether the email address has been verified.
    pub email_verified: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// The resolved current actor: session credential plus account summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    /// The credential the viewer was resolved from.
    pub session_token: SessionToken,
    /// The account behind that credential.
    pub account: AccountSummary,
}

impl Viewer {
    /// Serialize the viewer, pruned to the caller's selection.
    ///
    /// The session token is always included; selection only narrows the
    /// account fields.
    pub fn to_value(&self, selection: &ViewerSelection) -> Value {
        let full = json!({
            "id": self.account.id,
            "username": self.account.username,
            "email": self.account.email,
            "emailVerified": self.account.email_verified,
            "createdAt": self.account.created_at.to_rfc3339(),
        });

        let account = match selection.account_fields() {
            None => full,
            Some(names) => {
                let mut pruned = serde_json::Map::new();
                if let Value::Object(map) = full {
                    for (key, value) in map {
                        if names.iter().any(|n| n == &key) {
                            pruned.insert(key, value);
                        }
                    }
                }
                Value::Object(pruned)
            }
        };

        json!({
            "sessionToken": self.session_token,
            "account": account,
        })
    }
}

/// Which account fields the caller asked for when resolving the viewer.
///
/// Built by the schema layer from the request's output selection; `all()`
/// is the permissive default used when the caller gave no selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerSelection {
    fields: Option<Vec<String>>,
}

impl ViewerSelection {
    /// Select every account field.
    pub fn all() -> Self {
        Self { fields: None }
    }

    /// Select only the named account fields.
    pub fn fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: Some(names.into_iter().map(Into::into).collect()),
        }
    }

    /// The selected account field names, or `None` for all fields.
    pub fn account_fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }
}
