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

//! Permission resolution.
//!
//! `resolve` is a pure function of its inputs. It performs no I/O and keeps
//! no state between calls.

use std::collections::BTreeMap;

use super::caller::{Caller, CallerIdentity};
use super::models::{Action, Decision, DenialReason, Permission, ResourceKind, ResourceTarget, Role};
use super::rules::{rule_for, rules_for_role, Scope};
use crate::error::AccessError;

/// Decides whether `caller` may perform `action` on an instance of `kind`.
///
/// Evaluation order, first match wins:
/// 1. admin is allowed
/// 2. reads of publicly visible event/organization instances are allowed
/// 3. anonymous callers are denied
/// 4. the role's rule row decides, subject to its scope
/// 5. no row: the role lacks the capability, or the pair is unknown
pub fn resolve(
    caller: &Caller,
    action: Action,
    kind: ResourceKind,
    target: &ResourceTarget,
) -> Decision {
    if caller.is_admin() {
        return Decision::Allow;
    }

    if action == Action::Read && kind.is_publicly_readable() && target.publicly_visible {
        return Decision::Allow;
    }

    let identity = match caller {
        Caller::Anonymous => return Decision::Deny(DenialReason::NotAuthenticated),
        Caller::Authenticated(identity) => identity,
    };

    match rule_for(identity.role, kind, action) {
        Some(rule) => evaluate_scope(rule.scope, identity, target),
        None if kind.supports(action) => Decision::Deny(DenialReason::RoleLacksCapability),
        None => Decision::Deny(DenialReason::UnknownResource),
    }
}

fn evaluate_scope(scope: Scope, identity: &CallerIdentity, target: &ResourceTarget) -> Decision {
    match scope {
        Scope::Any => Decision::Allow,
        Scope::PublicOnly => {
            if target.publicly_visible {
                Decision::Allow
            } else {
                Decision::Deny(DenialReason::RoleLacksCapability)
            }
        }
        Scope::OwnOrganization => match (&identity.organization_id, &target.owner_organization) {
            (Some(own), Some(owner)) if own == owner => Decision::Allow,
            _ => Decision::Deny(DenialReason::WrongOrganization),
        },
        Scope::OwnIdentity => match &target.owner_identity {
            Some(owner) if *owner == identity.id => Decision::Allow,
            _ => Decision::Deny(DenialReason::NotOwner),
        },
    }
}

/// Resolves and converts a denial into an error.
pub fn check(
    caller: &Caller,
    action: Action,
    kind: ResourceKind,
    target: &ResourceTarget,
) -> Result<(), AccessError> {
    match resolve(caller, action, kind, target) {
        Decision::Allow => Ok(()),
        Decision::Deny(DenialReason::NotAuthenticated) => Err(AccessError::Unauthenticated),
        Decision::Deny(DenialReason::UnknownResource) => {
            Err(AccessError::UnknownResource(Permission::new(kind, action).to_string()))
        }
        Decision::Deny(reason) => Err(AccessError::AccessDenied(reason)),
    }
}

/// Flat capability map: whether the caller holds `action` on any kind.
pub fn capabilities(caller: &Caller) -> BTreeMap<Action, bool> {
    let mut map: BTreeMap<Action, bool> = Action::ALL.into_iter().map(|a| (a, false)).collect();

    match caller.role() {
        Some(Role::Admin) => {
            for granted in map.values_mut() {
                *granted = true;
            }
        }
        Some(role) => {
            for rule in rules_for_role(role) {
                map.insert(rule.action, true);
            }
        }
        None => {
            map.insert(Action::Read, true);
        }
    }

    map
}

/// Permission tuples held by the caller, sorted.
pub fn permissions(caller: &Caller) -> Vec<Permission> {
    role_permissions(caller.role())
}

/// Permission tuples held by a role, `None` meaning anonymous.
pub(crate) fn role_permissions(role: Option<Role>) -> Vec<Permission> {
    let mut granted: Vec<Permission> = match role {
        Some(Role::Admin) => ResourceKind::ALL
            .into_iter()
            .flat_map(|kind| {
                Action::ALL
                    .into_iter()
                    .filter(move |action| kind.supports(*action))
                    .map(move |action| Permission::new(kind, action))
            })
            .collect(),
        Some(role) => rules_for_role(role)
            .map(|rule| Permission::new(rule.kind, rule.action))
            .chain(public_reads())
            .collect(),
        None => public_reads().collect(),
    };

    granted.sort();
    granted.dedup();
    granted
}

fn public_reads() -> impl Iterator<Item = Permission> {
    ResourceKind::ALL
        .into_iter()
        .filter(|kind| kind.is_publicly_readable())
        .map(|kind| Permission::new(kind, Action::Read))
}

/// Validates a role transition requested by `actor`.
///
/// Only admins may change roles. An admin can never move their own account
/// out of the admin role, whatever other admins exist.
pub fn validate_role_change(
    actor: &CallerIdentity,
    target_id: &str,
    current_role: Role,
    new_role: Role,
) -> Result<(), AccessError> {
    if !actor.role.is_admin() {
        return Err(AccessError::AccessDenied(DenialReason::RoleLacksCapability));
    }

    if actor.id == target_id && current_role.is_admin() && !new_role.is_admin() {
        return Err(AccessError::SelfDemotion);
    }

    Ok(())
}
