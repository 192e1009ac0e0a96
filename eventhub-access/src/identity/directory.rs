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


//! Identity directory.
//!
//! The directory is the source of truth for roles, affiliation and the
//! activation flag. The access layer re-reads it on every authentication.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::models::Identity;
use crate::error::AccessError;
use crate::rbac::Role;

/// Lookup and update operations on identities.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Loads an identity by id.
    async fn get_by_id(&self, id: &str) -> Result<Option<Identity>, AccessError>;

    /// Loads an identity by email, ignoring case.
    async fn get_by_email(&self, email: &str) -> Result<Option<Identity>, AccessError>;

    /// Replaces the role of an identity and returns the updated record.
    async fn update_role(&self, id: &str, role: Role) -> Result<Identity, AccessError>;

    /// Sets the activation flag and returns the updated record.
    async fn set_active(&self, id: &str, active: bool) -> Result<Identity, AccessError>;

    /// Stamps the last successful login.
    async fn update_last_login(&self, id: &str, at: DateTime<Utc>) -> Result<(), AccessError>;
}

/// In-process directory keyed by identity id.
#[derive(Default)]
pub struct MemoryDirectory {
    identities: RwLock<HashMap<String, Identity>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an identity.
    pub async fn insert(&self, identity: Identity) {
        self.identities.write().await.insert(identity.id.clone(), identity);
    }

    async fn modify<F>(&self, id: &str, apply: F) -> Result<Identity, AccessError>
    where
        F: FnOnce(&mut Identity) + Send,
    {
        let mut identities = self.identities.write().await;
        let identity = identities.get_mut(id).ok_or(AccessError::IdentityNotFound)?;
        apply(identity);
        identity.updated_at = Utc::now();
        Ok(identity.clone())
    }
}

#[async_trait]
impl IdentityDirectory for MemoryDirectory {
    async fn get_by_id(&self, id: &str) -> Result<Option<Identity>, AccessError> {
        Ok(self.identities.read().await.get(id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Identity>, AccessError> {
        let identities = self.identities.read().await;
        Ok(identities.values().find(|i| i.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn update_role(&self, id: &str, role: Role) -> Result<Identity, AccessError> {
        self.modify(id, |identity| identity.role = role).await
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<Identity, AccessError> {
        self.modify(id, |identity| identity.is_active = active).await
    }

    async fn update_last_login(&self, id: &str, at: DateTime<Utc>) -> Result<(), AccessError> {
        self.modify(id, |identity| identity.last_login_at = Some(at)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_email_lookup_ignores_case() {
        let directory = MemoryDirectory::new();
        let identity = Identity::new("Ana@Example.com", "Ana", "hash", Role::User);
        directory.insert(identity.clone()).await;

        let found = directory.get_by_email("ana@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, identity.id);
        assert!(directory.get_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_updates() {
        let directory = MemoryDirectory::new();
        let identity = Identity::new("ana@example.com", "Ana", "hash", Role::User);
        directory.insert(identity.clone()).await;

        let updated = directory.update_role(&identity.id, Role::Organizer).await.unwrap();
        assert_eq!(updated.role, Role::Organizer);

        let updated = directory.set_active(&identity.id, false).await.unwrap();
        assert!(!updated.is_active);

        let now = Utc::now();
        directory.update_last_login(&identity.id, now).await.unwrap();
        let stored = directory.get_by_id(&identity.id).await.unwrap().unwrap();
        assert_eq!(stored.last_login_at, Some(now));
    }

    #[tokio::test]
    async fn test_missing_identity() {
        let directory = MemoryDirectory::new();
        let result = directory.set_active("missing", false).await;
        assert!(matches!(result, Err(AccessError::IdentityNotFound)));
    }
}
