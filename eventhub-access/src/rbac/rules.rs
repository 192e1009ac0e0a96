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

//! The role rule table.
//!
//! This table is the only place policy is written down. The resolver
//! evaluates it, and the capability map and permission list are derived
//! from it, so they cannot drift apart.
//!
//! Admin has no rows: it is allowed everything before the table is consulted.

use super::models::{Action, ResourceKind, Role};

/// Instance constraint attached to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Any instance
    Any,
    /// Only instances in a publicly visible state
    PublicOnly,
    /// Only instances owned by the caller's organization
    OwnOrganization,
    /// Only instances owned by the caller
    OwnIdentity,
}

/// One grant: `role` may perform `action` on `kind` within `scope`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub role: Role,
    pub kind: ResourceKind,
    pub action: Action,
    pub scope: Scope,
}

const fn rule(role: Role, kind: ResourceKind, action: Action, scope: Scope) -> Rule {
    Rule {
        role,
        kind,
        action,
        scope,
    }
}

use Action::{Create, Delete, Publish, Read, Update};
use ResourceKind::{Category, Event, Favorite, Organization, User};
use Scope::{Any, OwnIdentity, OwnOrganization, PublicOnly};

pub const RULES: &[Rule] = &[
    // Organizer: reads everything, mutates what their organization owns
    rule(Role::Organizer, Event, Read, Any),
    rule(Role::Organizer, Organization, Read, Any),
    rule(Role::Organizer, User, Read, Any),
    rule(Role::Organizer, Favorite, Read, Any),
    rule(Role::Organizer, Category, Read, Any),
    rule(Role::Organizer, Event, Create, OwnOrganization),
    rule(Role::Organizer, Event, Update, OwnOrganization),
    rule(Role::Organizer, Event, Delete, OwnOrganization),
    rule(Role::Organizer, Event, Publish, OwnOrganization),
    rule(Role::Organizer, Organization, Create, OwnOrganization),
    rule(Role::Organizer, Organization, Update, OwnOrganization),
    rule(Role::Organizer, Organization, Delete, OwnOrganization),
    rule(Role::Organizer, User, Create, OwnOrganization),
    rule(Role::Organizer, User, Update, OwnOrganization),
    rule(Role::Organizer, User, Delete, OwnOrganization),
    // User: public catalogue, own profile, own favorites
    rule(Role::User, Event, Read, PublicOnly),
    rule(Role::User, Organization, Read, PublicOnly),
    rule(Role::User, Category, Read, PublicOnly),
    rule(Role::User, User, Read, OwnIdentity),
    rule(Role::User, Favorite, Read, OwnIdentity),
    rule(Role::User, Favorite, Create, OwnIdentity),
    rule(Role::User, Favorite, Update, OwnIdentity),
    rule(Role::User, Favorite, Delete, OwnIdentity),
];

/// Finds the rule row for a (role, kind, action) triple.
pub fn rule_for(role: Role, kind: ResourceKind, action: Action) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.role == role && r.kind == kind && r.action == action)
}

/// Iterates the rows granted to a role.
pub fn rules_for_role(role: Role) -> impl Iterator<Item = &'static Rule> {
    RULES.iter().filter(move |r| r.role == role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_only_use_supported_actions() {
        for r in RULES {
            assert!(r.kind.supports(r.action), "{:?} grants an unsupported action", r);
        }
    }

    #[test]
    fn test_rows_are_unique() {
        for (i, a) in RULES.iter().enumerate() {
            for b in &RULES[i + 1..] {
                assert!(
                    !(a.role == b.role && a.kind == b.kind && a.action == b.action),
                    "duplicate row {:?}",
                    a
                );
            }
        }
    }

    #[test]
    fn test_admin_has_no_rows() {
        assert_eq!(rules_for_role(Role::Admin).count(), 0);
    }
}
