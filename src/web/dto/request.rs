//! Request DTOs for Web API.

use serde::Deserialize;

/// Body of `/retrieve` and `/delete`.
#[derive(Debug, Default, Deserialize)]
pub struct IdentifierRequest {
    /// Record id.
    #[serde(default)]
    pub identifier: Option<String>,
}

impl IdentifierRequest {
    /// The identifier, or an empty string when missing.
    pub fn id(&self) -> &str {
        self.identifier.as_deref().unwrap_or_default()
    }
}
