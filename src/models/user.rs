//! User profile model and in-memory session state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role assigned to self-registered users.
pub const DEFAULT_ROLE: &str = "user";

/// User profile stored in Firestore, keyed by identity uid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Profile written at registration.
    pub fn new_user(name: &str, email: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            role: Some(DEFAULT_ROLE.to_string()),
            created_at: Some(created_at),
        }
    }
}

/// An identity issued by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
}

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    /// Populated only when a profile document exists
    pub name: Option<String>,
}

impl Session {
    /// Name shown in the header: profile name, else email.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.identity.email.as_deref())
            .unwrap_or(&self.identity.uid)
    }
}

/// Current session state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn uid(&self) -> Option<&str> {
        self.session().map(|s| s.identity.uid.as_str())
    }
}
