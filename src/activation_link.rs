use uuid::Uuid;

use crate::accounts::RoleKind;

/// One-time activation link token, emailed at registration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivationLink {
    token: String,
}

impl ActivationLink {
    pub fn new() -> Self {
        Self {
            token: Uuid::new_v4().to_string(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Public URL that activates the account, e.g.
    /// `http://host/api/author/activate/<token>`
    pub fn url(&self, api_url: &str, role: RoleKind) -> String {
        format!(
            "{}/api/{}/activate/{}",
            api_url.trim_end_matches('/'),
            role,
            self.token
        )
    }
}

impl Default for ActivationLink {
    fn default() -> Self {
        Self::new()
    }
}
