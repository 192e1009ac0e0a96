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

//! Request-scoped caller context.

use serde::Serialize;

use super::models::{Permission, Role};
use super::resolver::role_permissions;
use crate::error::AccessError;
use crate::identity::Identity;

/// Resolved identity behind an authenticated request.
///
/// Rebuilt for every request from the session record and the directory.
/// Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerIdentity {
    /// Identity id
    pub id: String,

    /// Email address
    pub email: String,

    /// Current role, as held by the directory
    pub role: Role,

    /// Organization affiliation
    pub organization_id: Option<String>,

    /// Email verification flag
    pub is_verified: bool,

    /// Activation flag
    pub is_active: bool,

    /// Session the request was authenticated with
    pub session_id: Option<String>,

    /// Permission tuples derived from the rule table
    pub permissions: Vec<Permission>,
}

impl CallerIdentity {
    /// Builds a caller from a directory record.
    pub fn from_identity(identity: &Identity, session_id: Option<String>) -> Self {
        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            role: identity.role,
            organization_id: identity.organization_id.clone(),
            is_verified: identity.is_verified,
            is_active: identity.is_active,
            session_id,
            permissions: role_permissions(Some(identity.role)),
        }
    }
}

/// Who is making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Authenticated(CallerIdentity),
}

impl Caller {
    /// Role of the caller, `None` when anonymous.
    pub fn role(&self) -> Option<Role> {
        match self {
            Caller::Anonymous => None,
            Caller::Authenticated(identity) => Some(identity.role),
        }
    }

    /// Identity of the caller, `None` when anonymous.
    pub fn identity(&self) -> Option<&CallerIdentity> {
        match self {
            Caller::Anonymous => None,
            Caller::Authenticated(identity) => Some(identity),
        }
    }

    /// Identity of the caller, or `Unauthenticated`.
    pub fn require(&self) -> Result<&CallerIdentity, AccessError> {
        self.identity().ok_or(AccessError::Unauthenticated)
    }

    pub fn is_admin(&self) -> bool {
        self.role().is_some_and(|role| role.is_admin())
    }
}

impl From<CallerIdentity> for Caller {
    fn from(identity: CallerIdentity) -> Self {
        Caller::Authenticated(identity)
    }
}
