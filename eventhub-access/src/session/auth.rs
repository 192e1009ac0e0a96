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


//! Authentication service.

use std::sync::Arc;

use eventhub_core::ClientMetadata;
use tracing::{info, warn};

use super::manager::{IssuedSession, SessionManager};
use crate::error::AccessError;
use crate::identity::{IdentityDirectory, PasswordHasher};

/// Password login on top of the identity directory and session manager.
#[derive(Clone)]
pub struct AuthService {
    directory: Arc<dyn IdentityDirectory>,
    sessions: Arc<SessionManager>,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(directory: Arc<dyn IdentityDirectory>, sessions: Arc<SessionManager>) -> Self {
        Self {
            directory,
            sessions,
            hasher: PasswordHasher::new(),
        }
    }

    /// Authenticates with email and password and issues a session.
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` if the email is unknown or the password is wrong
    /// - `AccountDisabled` if the identity is deactivated
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: ClientMetadata,
    ) -> Result<IssuedSession, AccessError> {
        let identity = self
            .directory
            .get_by_email(email)
            .await?
            .ok_or(AccessError::InvalidCredentials)?;

        if !self.hasher.verify_password(password, &identity.password_hash)? {
            warn!("Failed login for {}", identity.id);
            return Err(AccessError::InvalidCredentials);
        }

        if !identity.is_active {
            return Err(AccessError::AccountDisabled);
        }

        let issued = self.sessions.issue_for(&identity, client).await?;
        info!("Login for {} from {}", identity.id, issued.session.client.device_label);
        Ok(issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Identity, MemoryDirectory};
    use crate::rbac::Role;
    use crate::session::{Bookkeeper, SessionConfig};
    use eventhub_core::MemoryCredentialStore;

    async fn setup(active: bool) -> AuthService {
        let directory = Arc::new(MemoryDirectory::new());
        let hash = PasswordHasher::new().hash_password("s3cret-pass").unwrap();
        let mut identity = Identity::new("Ana@Example.com", "Ana", hash, Role::User);
        identity.is_active = active;
        directory.insert(identity).await;

        let sessions = Arc::new(SessionManager::new(
            Arc::new(MemoryCredentialStore::new()),
            directory.clone(),
            "test_secret_key_at_least_32_bytes",
            SessionConfig::default(),
            Bookkeeper::disabled(),
        ));
        AuthService::new(directory, sessions)
    }

    fn client() -> ClientMetadata {
        ClientMetadata::new("203.0.113.5", "okhttp/4.12.0")
    }

    #[tokio::test]
    async fn test_login_success() {
        let auth = setup(true).await;
        let issued = auth.login("ana@example.com", "s3cret-pass", client()).await.unwrap();
        assert_eq!(issued.session.client.device_label, "Mobile app");
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let auth = setup(true).await;
        assert!(matches!(
            auth.login("ana@example.com", "wrong", client()).await,
            Err(AccessError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@example.com", "s3cret-pass", client()).await,
            Err(AccessError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_login_disabled_account() {
        let auth = setup(false).await;
        assert!(matches!(
            auth.login("ana@example.com", "s3cret-pass", client()).await,
            Err(AccessError::AccountDisabled)
        ));
    }
}
