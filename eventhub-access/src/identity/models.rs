// Copyright 2026 EventHub Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Identity data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rbac::Role;

/// Account held by the identity directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Unique identifier (UUID v4)
    pub id: String,

    /// Email address, unique ignoring case
    pub email: String,

    /// Name shown to other users
    pub display_name: String,

    /// Argon2 password hash
    pub password_hash: String,

    /// Role (Admin, Organizer, User)
    pub role: Role,

    /// Organization the account belongs to, if any
    pub organization_id: Option<String>,

    /// Active status (disabled identities cannot authenticate)
    pub is_active: bool,

    /// Email verification status
    pub is_verified: bool,

    /// Most recent successful login
    pub last_login_at: Option<DateTime<Utc>>,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Creates an active, unverified identity with a fresh id.
    pub fn new(
        email: impl Into<String>,
        display_name: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.into(),
            display_name: display_name.into(),
            password_hash: password_hash.into(),
            role,
            organization_id: None,
            is_active: true,
            is_verified: false,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the organization affiliation.
    pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
        self.organization_id = Some(organization_id.into());
        self
    }
}

/// Identity as exposed outside the access layer (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct IdentityResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub organization_id: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&Identity> for IdentityResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            role: identity.role,
            organization_id: identity.organization_id.clone(),
            is_active: identity.is_active,
            is_verified: identity.is_verified,
            last_login_at: identity.last_login_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_identity_defaults() {
        let identity = Identity::new("ana@example.com", "Ana", "hash", Role::User)
            .with_organization("org-1");
        assert!(identity.is_active);
        assert!(!identity.is_verified);
        assert_eq!(identity.organization_id.as_deref(), Some("org-1"));
        assert!(Uuid::parse_str(&identity.id).is_ok());
    }

    #[test]
    fn test_response_omits_password_hash() {
        let identity = Identity::new("ana@example.com", "Ana", "secret-hash", Role::User);
        let json = serde_json::to_string(&IdentityResponse::from(&identity)).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"role\":\"user\""));
    }
}
