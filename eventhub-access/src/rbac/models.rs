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

//! RBAC data models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AccessError;

/// Caller role.
///
/// Admin dominates both other roles. Organizer and user are incomparable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access to every resource
    Admin,

    /// Manages events and members of their own organization
    Organizer,

    /// Browses public content and manages their own favorites
    User,
}

impl Role {
    /// Every role.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Organizer, Role::User];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Organizer => "organizer",
            Role::User => "user",
        }
    }

    /// Check if role is admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "organizer" => Ok(Role::Organizer),
            "user" => Ok(Role::User),
            other => Err(AccessError::UnknownResource(format!("role '{}'", other))),
        }
    }
}

/// Operation performed on a resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    Publish,
    Verify,
    Manage,
}

impl Action {
    /// Every action.
    pub const ALL: [Action; 7] = [
        Action::Read,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Publish,
        Action::Verify,
        Action::Manage,
    ];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Publish => "publish",
            Action::Verify => "verify",
            Action::Manage => "manage",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| AccessError::UnknownResource(format!("action '{}'", s)))
    }
}

/// Kind of resource guarded by the access gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Event,
    Organization,
    User,
    Favorite,
    Category,
}

impl ResourceKind {
    /// Every resource kind.
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Event,
        ResourceKind::Organization,
        ResourceKind::User,
        ResourceKind::Favorite,
        ResourceKind::Category,
    ];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Event => "event",
            ResourceKind::Organization => "organization",
            ResourceKind::User => "user",
            ResourceKind::Favorite => "favorite",
            ResourceKind::Category => "category",
        }
    }

    /// Publicly visible instances of these kinds are readable without a session.
    pub fn is_publicly_readable(&self) -> bool {
        matches!(self, ResourceKind::Event | ResourceKind::Organization)
    }

    /// Returns true if `action` is meaningful for this kind.
    pub fn supports(&self, action: Action) -> bool {
        use Action::*;
        match self {
            ResourceKind::Event => matches!(action, Read | Create | Update | Delete | Publish),
            ResourceKind::Organization => {
                matches!(action, Read | Create | Update | Delete | Verify | Manage)
            }
            ResourceKind::User => matches!(action, Read | Create | Update | Delete | Manage),
            ResourceKind::Favorite | ResourceKind::Category => {
                matches!(action, Read | Create | Update | Delete)
            }
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AccessError::UnknownResource(format!("resource '{}'", s)))
    }
}

/// A (resource kind, action) pair granted to a caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Permission {
    pub kind: ResourceKind,
    pub action: Action,
}

impl Permission {
    pub fn new(kind: ResourceKind, action: Action) -> Self {
        Self { kind, action }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.action)
    }
}

/// Ownership and visibility of the resource instance being checked.
///
/// For creation this describes the instance the payload would create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceTarget {
    /// Organization that owns the instance
    pub owner_organization: Option<String>,

    /// Identity that owns the instance (favorites, user records)
    pub owner_identity: Option<String>,

    /// Whether the instance is in a publicly visible state
    pub publicly_visible: bool,
}

impl ResourceTarget {
    /// A publicly visible instance with no owner.
    pub fn public() -> Self {
        Self {
            publicly_visible: true,
            ..Self::default()
        }
    }

    /// An instance owned by an organization.
    pub fn owned_by_organization(organization_id: impl Into<String>) -> Self {
        Self {
            owner_organization: Some(organization_id.into()),
            ..Self::default()
        }
    }

    /// An instance owned by an identity.
    pub fn owned_by_identity(identity_id: impl Into<String>) -> Self {
        Self {
            owner_identity: Some(identity_id.into()),
            ..Self::default()
        }
    }

    /// Sets the visibility flag.
    pub fn visible(mut self, publicly_visible: bool) -> Self {
        self.publicly_visible = publicly_visible;
        self
    }
}

/// Structured reason attached to a denial.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    NotAuthenticated,
    WrongOrganization,
    RoleLacksCapability,
    NotOwner,
    UnknownResource,
}

impl DenialReason {
    /// Stable reason string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::NotAuthenticated => "not authenticated",
            DenialReason::WrongOrganization => "wrong organization",
            DenialReason::RoleLacksCapability => "role lacks capability",
            DenialReason::NotOwner => "not owner",
            DenialReason::UnknownResource => "unknown resource or action",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenialReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip_names() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), kind);
        }
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
        assert_eq!("organizer".parse::<Role>().unwrap(), Role::Organizer);
    }

    #[test]
    fn test_unknown_names_rejected() {
        assert!(matches!("ticket".parse::<ResourceKind>(), Err(AccessError::UnknownResource(_))));
        assert!(matches!("archive".parse::<Action>(), Err(AccessError::UnknownResource(_))));
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_supported_actions() {
        assert!(ResourceKind::Event.supports(Action::Publish));
        assert!(!ResourceKind::Event.supports(Action::Verify));
        assert!(ResourceKind::Organization.supports(Action::Verify));
        assert!(!ResourceKind::Favorite.supports(Action::Publish));
    }

    #[test]
    fn test_serialization_names() {
        let permission = Permission::new(ResourceKind::Event, Action::Publish);
        let json = serde_json::to_string(&permission).unwrap();
        assert_eq!(json, r#"{"kind":"event","action":"publish"}"#);
        assert_eq!(permission.to_string(), "event:publish");
    }
}
