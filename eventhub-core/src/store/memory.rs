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

//! In-memory credential store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::engine::{select_evictions, CredentialStore, PurgeStats, RevokeOutcome, RotateOutcome};
use crate::error::StoreError;
use crate::types::SessionToken;

/// Credential store held entirely in process memory.
///
/// Every transition runs under the write half of a single `RwLock`, which
/// makes rotate and capped insert atomic. State is lost on restart, so this
/// store suits tests and single-process development setups.
#[derive(Default)]
pub struct MemoryCredentialStore {
    records: RwLock<Records>,
}

/// Records keyed by fingerprint, plus a session id index.
#[derive(Default)]
struct Records {
    by_fingerprint: HashMap<String, SessionToken>,
    /// session id -> fingerprint
    by_session: HashMap<String, String>,
}

impl Records {
    fn add(&mut self, record: SessionToken) {
        self.by_session.insert(record.session_id.clone(), record.fingerprint.clone());
        self.by_fingerprint.insert(record.fingerprint.clone(), record);
    }

    /// Revokes the oldest active sessions of `identity_id` to make room for one more.
    fn evict_for(
        &mut self,
        identity_id: &str,
        max_active: usize,
        now: DateTime<Utc>,
    ) -> Vec<SessionToken> {
        let victims = select_evictions(
            self.by_fingerprint.values().filter(|r| r.identity_id == identity_id),
            max_active,
            now,
        );

        let mut evicted = Vec::with_capacity(victims.len());
        for fingerprint in victims {
            if let Some(record) = self.by_fingerprint.get_mut(&fingerprint) {
                record.revoke(now);
                evicted.push(record.clone());
            }
        }
        evicted
    }
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, active or not.
    pub async fn len(&self) -> usize {
        self.records.read().await.by_fingerprint.len()
    }

    /// Returns true if the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.by_fingerprint.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert(
        &self,
        record: SessionToken,
        max_active: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionToken>, StoreError> {
        let mut records = self.records.write().await;
        if records.by_fingerprint.contains_key(&record.fingerprint) {
            return Err(StoreError::DuplicateFingerprint);
        }

        let evicted = records.evict_for(&record.identity_id, max_active, now);
        debug!(
            "Storing session {} for identity {} ({} evicted)",
            record.session_id,
            record.identity_id,
            evicted.len()
        );
        records.add(record);
        Ok(evicted)
    }

    async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<SessionToken>, StoreError> {
        Ok(self.records.read().await.by_fingerprint.get(fingerprint).cloned())
    }

    async fn find_by_session_id(
        &self,
        session_id: &str,
    ) -> Result<Option<SessionToken>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .by_session
            .get(session_id)
            .and_then(|fingerprint| records.by_fingerprint.get(fingerprint))
            .cloned())
    }

    async fn list_for_identity(&self, identity_id: &str) -> Result<Vec<SessionToken>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .by_fingerprint
            .values()
            .filter(|r| r.identity_id == identity_id)
            .cloned()
            .collect())
    }

    async fn revoke(
        &self,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<RevokeOutcome, StoreError> {
        let mut records = self.records.write().await;
        let Some(record) = records.by_fingerprint.get_mut(fingerprint) else {
            return Ok(RevokeOutcome::NotFound);
        };

        if !record.is_active(now) {
            return Ok(RevokeOutcome::AlreadyInactive);
        }
        record.revoke(now);
        Ok(RevokeOutcome::Revoked(record.clone()))
    }

    async fn revoke_all(&self, identity_id: &str, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        let mut count = 0;
        for record in records.by_fingerprint.values_mut() {
            if record.identity_id == identity_id && record.is_active(now) {
                record.revoke(now);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn rotate(
        &self,
        old_fingerprint: &str,
        replacement: SessionToken,
        now: DateTime<Utc>,
    ) -> Result<RotateOutcome, StoreError> {
        let mut records = self.records.write().await;
        if records.by_fingerprint.contains_key(&replacement.fingerprint) {
            return Err(StoreError::DuplicateFingerprint);
        }

        let previous = match records.by_fingerprint.get_mut(old_fingerprint) {
            None => return Ok(RotateOutcome::NotFound),
            Some(record) if !record.is_active(now) => return Ok(RotateOutcome::Inactive),
            Some(record) => {
                record.revoke(now);
                record.clone()
            }
        };

        records.add(replacement);
        Ok(RotateOutcome::Rotated { previous })
    }

    async fn touch(&self, fingerprint: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(record) = self.records.write().await.by_fingerprint.get_mut(fingerprint) {
            record.touch(now);
        }
        Ok(())
    }

    async fn purge(
        &self,
        now: DateTime<Utc>,
        revoked_retention: Duration,
    ) -> Result<PurgeStats, StoreError> {
        let mut guard = self.records.write().await;
        let records = &mut *guard;
        let mut stats = PurgeStats::default();
        let by_session = &mut records.by_session;
        records.by_fingerprint.retain(|_, record| {
            if record.is_purgeable(now, revoked_retention) {
                stats.record(record, now);
                by_session.remove(&record.session_id);
                false
            } else {
                true
            }
        });
        Ok(stats)
    }

    async fn count_purgeable(
        &self,
        now: DateTime<Utc>,
        revoked_retention: Duration,
    ) -> Result<PurgeStats, StoreError> {
        let records = self.records.read().await;
        let mut stats = PurgeStats::default();
        for record in records
            .by_fingerprint
            .values()
            .filter(|r| r.is_purgeable(now, revoked_retention))
        {
            stats.record(record, now);
        }
        Ok(stats)
    }
}
