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


//! Administrative identity operations: role changes and activation.

use std::sync::Arc;

use tracing::info;

use super::directory::IdentityDirectory;
use super::models::Identity;
use crate::error::AccessError;
use crate::rbac::{validate_role_change, Caller, CallerIdentity, DenialReason, Role};
use crate::session::SessionManager;

/// Role and activation management, restricted to admins.
pub struct IdentityAdmin {
    directory: Arc<dyn IdentityDirectory>,
    sessions: Arc<SessionManager>,
}

impl IdentityAdmin {
    pub fn new(directory: Arc<dyn IdentityDirectory>, sessions: Arc<SessionManager>) -> Self {
        Self {
            directory,
            sessions,
        }
    }

    /// Changes the role of an identity.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` / `AccessDenied` if the actor is not an admin
    /// - `IdentityNotFound` if the target does not exist
    /// - `SelfDemotion` if an admin tries to leave the admin role
    pub async fn change_role(
        &self,
        actor: &Caller,
        target_id: &str,
        new_role: Role,
    ) -> Result<Identity, AccessError> {
        let actor = require_admin(actor)?;
        let target = self
            .directory
            .get_by_id(target_id)
            .await?
            .ok_or(AccessError::IdentityNotFound)?;

        validate_role_change(actor, target_id, target.role, new_role)?;

        let updated = self.directory.update_role(target_id, new_role).await?;
        info!(
            "Role of {} changed from {} to {} by {}",
            target_id, target.role, new_role, actor.id
        );
        Ok(updated)
    }

    /// Activates or deactivates an identity.
    ///
    /// Deactivation revokes every session of the identity.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` / `AccessDenied` if the actor is not an admin
    /// - `SelfDeactivation` if an admin tries to deactivate themselves
    /// - `IdentityNotFound` if the target does not exist
    pub async fn set_active(
        &self,
        actor: &Caller,
        target_id: &str,
        active: bool,
    ) -> Result<Identity, AccessError> {
        let actor = require_admin(actor)?;
        if actor.id == target_id && !active {
            return Err(AccessError::SelfDeactivation);
        }

        let updated = self.directory.set_active(target_id, active).await?;
        if active {
            info!("Identity {} reactivated by {}", target_id, actor.id);
        } else {
            let revoked = self.sessions.revoke_all(target_id).await?;
            info!(
                "Identity {} deactivated by {}, {} sessions revoked",
                target_id, actor.id, revoked
            );
        }
        Ok(updated)
    }
}

fn require_admin(caller: &Caller) -> Result<&CallerIdentity, AccessError> {
    let identity = caller.require()?;
    if !identity.role.is_admin() {
        return Err(AccessError::AccessDenied(DenialReason::RoleLacksCapability));
    }
    Ok(identity)
}
