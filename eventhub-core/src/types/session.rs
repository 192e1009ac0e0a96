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

//! Server-side record of one issued credential pair.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::client::ClientMetadata;
use crate::error::StoreError;

/// Record stored in the credential store for every issued session.
///
/// The raw refresh credential is never stored. Only its fingerprint is kept,
/// so a leaked store cannot be replayed against the rotation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionToken {
    /// Identity that owns this session
    pub identity_id: String,

    /// Hex SHA-256 of the refresh credential (unique across all records)
    pub fingerprint: String,

    /// Correlation id shared with the `jti` claim of both signed credentials
    pub session_id: String,

    /// Issuance timestamp
    pub issued_at: DateTime<Utc>,

    /// Expiry timestamp (always after `issued_at`)
    pub expires_at: DateTime<Utc>,

    /// Revocation flag (monotonic)
    pub revoked: bool,

    /// Set exactly once, on the first revocation
    pub revoked_at: Option<DateTime<Utc>>,

    /// Last time the session authenticated a request
    pub last_used_at: Option<DateTime<Utc>>,

    /// Origin address, user agent and device label
    pub client: ClientMetadata,
}

impl SessionToken {
    /// Creates a new, unrevoked session record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidRecord` if `expires_at` is not strictly
    /// after `issued_at` or if the fingerprint is empty.
    pub fn new(
        identity_id: impl Into<String>,
        fingerprint: impl Into<String>,
        session_id: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        client: ClientMetadata,
    ) -> Result<Self, StoreError> {
        if expires_at <= issued_at {
            return Err(StoreError::InvalidRecord(
                "expiry must be after issuance".to_string(),
            ));
        }

        let fingerprint = fingerprint.into();
        if fingerprint.is_empty() {
            return Err(StoreError::InvalidRecord("empty fingerprint".to_string()));
        }

        Ok(Self {
            identity_id: identity_id.into(),
            fingerprint,
            session_id: session_id.into(),
            issued_at,
            expires_at,
            revoked: false,
            revoked_at: None,
            last_used_at: None,
            client,
        })
    }

    /// Returns true if the session has passed its expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Returns true if the session is neither revoked nor expired.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && !self.is_expired(now)
    }

    /// Marks the session revoked.
    ///
    /// Returns `true` only on the transition from unrevoked to revoked.
    /// A second call leaves `revoked_at` untouched.
    pub fn revoke(&mut self, now: DateTime<Utc>) -> bool {
        if self.revoked {
            return false;
        }
        self.revoked = true;
        self.revoked_at = Some(now);
        true
    }

    /// Records use of the session.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_used_at = Some(now);
    }

    /// Returns true if the reaper may delete this record.
    ///
    /// Expired records are purgeable immediately. Revoked records become
    /// purgeable once `retention` has elapsed since revocation. Active
    /// records are never purgeable.
    pub fn is_purgeable(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        if self.is_expired(now) {
            return true;
        }
        match (self.revoked, self.revoked_at) {
            (true, Some(revoked_at)) => revoked_at + retention <= now,
            _ => false,
        }
    }
}
