use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// A user record as reported by the hosted auth service.
///
/// The same shape describes the signed-in identity and the author attached to
/// an enriched comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

pub const ANONYMOUS_NAME: &str = "Anonymous";

impl UserProfile {
    /// Metadata name, else the local part of the email address.
    pub fn display_name(&self) -> String {
        let from_metadata = self
            .user_metadata
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        if let Some(name) = from_metadata {
            return name.to_string();
        }

        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| ANONYMOUS_NAME.to_string())
    }
}

/// Display name for an optional author, falling back to "Anonymous".
pub fn display_name(author: Option<&UserProfile>) -> String {
    author
        .map(UserProfile::display_name)
        .unwrap_or_else(|| ANONYMOUS_NAME.to_string())
}
