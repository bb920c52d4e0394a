//! Wire models for the GoTrue admin API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user record from `GET /auth/v1/admin/users`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    /// Application-controlled metadata (where the role claim lives)
    #[serde(default)]
    pub app_metadata: serde_json::Value,
    /// User-controlled metadata
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl AdminUser {
    /// The role claim from `app_metadata`, when present
    pub fn role(&self) -> Option<&str> {
        self.app_metadata.get("role").and_then(|v| v.as_str())
    }
}

/// Page envelope for the admin user listing
#[derive(Debug, Deserialize)]
pub struct UserPage {
    #[serde(default)]
    pub users: Vec<AdminUser>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_reads_app_metadata() {
        let user: AdminUser = serde_json::from_value(serde_json::json!({
            "id": "4f9fd9a6-3a57-4c7b-9f4e-2a2d4c3b1a00",
            "email": "instructor@example.com",
            "app_metadata": {"role": "instructor"}
        }))
        .expect("valid user json");
        assert_eq!(user.role(), Some("instructor"));
    }

    #[test]
    fn missing_optional_fields_deserialize() {
        let user: AdminUser = serde_json::from_value(serde_json::json!({
            "id": "4f9fd9a6-3a57-4c7b-9f4e-2a2d4c3b1a00"
        }))
        .expect("minimal user json");
        assert!(user.email.is_none());
        assert!(user.role().is_none());
    }
}
