use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller identity resolved from a bearer credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
}

impl Identity {
    /// Check if the caller has a specific role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}
