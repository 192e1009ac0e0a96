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


//! Per-kind access policies and security filter injection.

use uuid::Uuid;

use super::filter::{FilterValue, QueryOptions, SCOPE_KEY};
use crate::rbac::{Caller, CallerIdentity, ResourceKind, Role};

type FilterRule = fn(&Caller) -> Vec<(String, FilterValue)>;

/// Access policy of one resource kind.
pub struct ResourcePolicy {
    pub kind: ResourceKind,

    /// Denied reads surface as `NotFound` instead of `AccessDenied`
    pub conceal_existence: bool,

    filter: FilterRule,
}

impl ResourcePolicy {
    /// Publicly visible instances may be read without a session.
    pub fn is_publicly_readable(&self) -> bool {
        self.kind.is_publicly_readable()
    }

    /// Security filters for a non-admin caller.
    pub fn filters_for(&self, caller: &Caller) -> Vec<(String, FilterValue)> {
        (self.filter)(caller)
    }
}

static POLICIES: [ResourcePolicy; 5] = [
    ResourcePolicy {
        kind: ResourceKind::Event,
        conceal_existence: false,
        filter: event_filters,
    },
    ResourcePolicy {
        kind: ResourceKind::Organization,
        conceal_existence: false,
        filter: organization_filters,
    },
    ResourcePolicy {
        kind: ResourceKind::User,
        conceal_existence: true,
        filter: user_filters,
    },
    ResourcePolicy {
        kind: ResourceKind::Favorite,
        conceal_existence: true,
        filter: favorite_filters,
    },
    ResourcePolicy {
        kind: ResourceKind::Category,
        conceal_existence: false,
        filter: no_filters,
    },
];

/// Returns the policy of a resource kind.
pub fn policy_for(kind: ResourceKind) -> &'static ResourcePolicy {
    match kind {
        ResourceKind::Event => &POLICIES[0],
        ResourceKind::Organization => &POLICIES[1],
        ResourceKind::User => &POLICIES[2],
        ResourceKind::Favorite => &POLICIES[3],
        ResourceKind::Category => &POLICIES[4],
    }
}

/// Narrows a list query to what the caller may see.
///
/// Injected filters replace caller-supplied filters on the same field.
/// Admins are not filtered.
pub fn apply_security_filters(query: &mut QueryOptions, caller: &Caller, kind: ResourceKind) {
    if caller.is_admin() {
        return;
    }

    for (field, value) in policy_for(kind).filters_for(caller) {
        query.filters.insert(field, value);
    }
}

fn filter(field: &str, value: FilterValue) -> (String, FilterValue) {
    (field.to_string(), value)
}

/// Matches no record: no identity or favorite is ever owned by the nil id.
fn nothing(field: &str) -> (String, FilterValue) {
    filter(field, FilterValue::equals(Uuid::nil().to_string()))
}

fn published_and_public() -> Vec<(String, FilterValue)> {
    vec![
        filter("status", FilterValue::equals("published")),
        filter("visibility", FilterValue::equals("public")),
    ]
}

fn authenticated(caller: &Caller) -> Option<(&CallerIdentity, Role)> {
    caller.identity().map(|identity| (identity, identity.role))
}

fn event_filters(caller: &Caller) -> Vec<(String, FilterValue)> {
    match authenticated(caller) {
        Some((identity, Role::Organizer)) => match &identity.organization_id {
            Some(org) => vec![filter(
                SCOPE_KEY,
                FilterValue::AnyOf(vec![
                    filter("status", FilterValue::equals("published")),
                    filter("organization_id", FilterValue::equals(org.as_str())),
                ]),
            )],
            None => vec![filter("status", FilterValue::equals("published"))],
        },
        _ => published_and_public(),
    }
}

fn organization_filters(caller: &Caller) -> Vec<(String, FilterValue)> {
    match authenticated(caller) {
        Some((_, Role::Organizer)) => vec![filter("status", FilterValue::equals("active"))],
        Some((_, Role::User)) => vec![
            filter("status", FilterValue::equals("active")),
            filter("is_verified", FilterValue::equals(true)),
        ],
        _ => vec![
            filter("status", FilterValue::equals("active")),
            filter("visibility", FilterValue::equals("public")),
        ],
    }
}

fn user_filters(caller: &Caller) -> Vec<(String, FilterValue)> {
    match authenticated(caller) {
        Some((identity, Role::Organizer)) => match &identity.organization_id {
            Some(org) => vec![filter("organization_id", FilterValue::equals(org.as_str()))],
            None => vec![nothing("id")],
        },
        Some((identity, _)) => vec![filter("id", FilterValue::equals(identity.id.as_str()))],
        None => vec![nothing("id")],
    }
}

fn favorite_filters(caller: &Caller) -> Vec<(String, FilterValue)> {
    match caller.identity() {
        Some(identity) => vec![filter("user_id", FilterValue::equals(identity.id.as_str()))],
        None => vec![nothing("user_id")],
    }
}

fn no_filters(_caller: &Caller) -> Vec<(String, FilterValue)> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role, organization_id: Option<&str>) -> Caller {
        Caller::Authenticated(CallerIdentity {
            id: "id-1".to_string(),
            email: "someone@example.com".to_string(),
            role,
            organization_id: organization_id.map(str::to_string),
            is_verified: true,
            is_active: true,
            session_id: None,
            permissions: Vec::new(),
        })
    }

    fn filtered(caller: &Caller, kind: ResourceKind) -> QueryOptions {
        let mut query = QueryOptions::new();
        apply_security_filters(&mut query, caller, kind);
        query
    }

    #[test]
    fn test_policies_are_indexed_by_kind() {
        for kind in ResourceKind::ALL {
            assert_eq!(policy_for(kind).kind, kind);
        }
        assert!(policy_for(ResourceKind::User).conceal_existence);
        assert!(policy_for(ResourceKind::Favorite).conceal_existence);
        assert!(!policy_for(ResourceKind::Event).conceal_existence);
        assert!(policy_for(ResourceKind::Event).is_publicly_readable());
    }

    #[test]
    fn test_admin_is_unfiltered() {
        let admin = caller(Role::Admin, None);
        for kind in ResourceKind::ALL {
            assert!(filtered(&admin, kind).filters.is_empty());
        }
    }

    #[test]
    fn test_injected_filters_override_caller_filters() {
        let mut query = QueryOptions::new().with_filter("status", FilterValue::equals("draft"));
        apply_security_filters(&mut query, &Caller::Anonymous, ResourceKind::Event);
        assert_eq!(query.filters["status"], FilterValue::equals("published"));
        assert_eq!(query.filters["visibility"], FilterValue::equals("public"));
    }

    #[test]
    fn test_organizer_event_scope() {
        let query = filtered(&caller(Role::Organizer, Some("org-1")), ResourceKind::Event);
        assert!(matches!(
            query.filters.get(SCOPE_KEY),
            Some(FilterValue::AnyOf(alts)) if alts.len() == 2
        ));

        let query = filtered(&caller(Role::Organizer, None), ResourceKind::Event);
        assert_eq!(query.filters["status"], FilterValue::equals("published"));
    }

    #[test]
    fn test_user_kind_filters() {
        let nil = FilterValue::equals(Uuid::nil().to_string());
        assert_eq!(filtered(&Caller::Anonymous, ResourceKind::User).filters["id"], nil);
        assert_eq!(filtered(&caller(Role::Organizer, None), ResourceKind::User).filters["id"], nil);
        let organizer = filtered(&caller(Role::Organizer, Some("org-1")), ResourceKind::User);
        assert_eq!(organizer.filters["organization_id"], FilterValue::equals("org-1"));
        assert_eq!(
            filtered(&caller(Role::User, None), ResourceKind::User).filters["id"],
            FilterValue::equals("id-1")
        );
    }

    #[test]
    fn test_organization_filters_per_caller() {
        let active = FilterValue::equals("active");

        let anonymous = filtered(&Caller::Anonymous, ResourceKind::Organization).filters;
        assert_eq!(anonymous.len(), 2);
        assert_eq!(anonymous["status"], active);
        assert_eq!(anonymous["visibility"], FilterValue::equals("public"));

        let organizer =
            filtered(&caller(Role::Organizer, Some("org-1")), ResourceKind::Organization).filters;
        assert_eq!(organizer.len(), 1);
        assert_eq!(organizer["status"], active);

        let user = filtered(&caller(Role::User, None), ResourceKind::Organization).filters;
        assert_eq!(user.len(), 2);
        assert_eq!(user["status"], active);
        assert_eq!(user["is_verified"], FilterValue::equals(true));
    }

    #[test]
    fn test_category_is_unfiltered() {
        let callers = [
            Caller::Anonymous,
            caller(Role::User, None),
            caller(Role::Organizer, Some("org-1")),
        ];
        for caller in callers {
            assert!(filtered(&caller, ResourceKind::Category).filters.is_empty());
        }
    }
}
