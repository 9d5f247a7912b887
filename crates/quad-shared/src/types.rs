use serde::{Deserialize, Serialize};

use crate::constants::FALLBACK_SENDER_NAME;

// User identity = the auth provider's opaque uid string
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The signed-in user as seen by the sync layer.
///
/// Owned by the authentication collaborator; the sync layer only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    pub uid: UserId,
    /// Account email, if the auth provider exposed one.
    pub email: Option<String>,
    /// Profile display name, if the user set one.
    pub display_name: Option<String>,
}

impl CurrentUser {
    /// Name shown on outgoing chat messages: profile name, else the local
    /// part of the email, else a fixed fallback.
    pub fn sender_name(&self) -> String {
        if let Some(name) = self.display_name.as_deref() {
            if !name.is_empty() {
                return name.to_string();
            }
        }
        if let Some(email) = self.email.as_deref() {
            if let Some((local, _)) = email.split_once('@') {
                if !local.is_empty() {
                    return local.to_string();
                }
            }
        }
        FALLBACK_SENDER_NAME.to_string()
    }
}
