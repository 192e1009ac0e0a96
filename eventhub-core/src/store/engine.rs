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

//! Credential store trait and shared transition rules.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::StoreError;
use crate::types::SessionToken;

// ============================================================================
// Transition Outcomes
// ============================================================================

/// Result of a single-record revocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// The record was active and is now revoked.
    Revoked(SessionToken),
    /// The record exists but was already revoked or expired. Nothing changed.
    AlreadyInactive,
    /// No record carries this fingerprint.
    NotFound,
}

/// Result of a rotate transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotateOutcome {
    /// The old record was revoked and the replacement stored.
    Rotated {
        /// The old record, as revoked.
        previous: SessionToken,
    },
    /// The old record was revoked or expired before this transition.
    Inactive,
    /// No record carries the old fingerprint.
    NotFound,
}

/// Statistics from a purge pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PurgeStats {
    /// Records removed because they passed their expiry.
    pub expired_removed: u64,
    /// Records removed because they were revoked longer than the retention window.
    pub revoked_removed: u64,
}

impl PurgeStats {
    /// Total number of removed records.
    pub fn total(&self) -> u64 {
        self.expired_removed + self.revoked_removed
    }

    /// Counts one purged record.
    pub fn record(&mut self, token: &SessionToken, now: DateTime<Utc>) {
        if token.is_expired(now) {
            self.expired_removed += 1;
        } else {
            self.revoked_removed += 1;
        }
    }

    /// Merges another stats object into this one.
    pub fn merge(&mut self, other: PurgeStats) {
        self.expired_removed += other.expired_removed;
        self.revoked_removed += other.revoked_removed;
    }
}

// ============================================================================
// Store Interface
// ============================================================================

/// Persistence interface for session records.
///
/// Every mutating method is a single atomic transition: implementations must
/// guarantee that two concurrent callers observing the same record cannot
/// both succeed in revoking or rotating it.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Stores a new record, first revoking the identity's oldest active
    /// sessions so that at most `max_active` remain active afterwards.
    ///
    /// # Returns
    ///
    /// Returns the records evicted to make room (already revoked).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateFingerprint` if the fingerprint is taken.
    async fn insert(
        &self,
        record: SessionToken,
        max_active: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionToken>, StoreError>;

    /// Looks up a record by refresh credential fingerprint.
    async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<SessionToken>, StoreError>;

    /// Looks up a record by session correlation id.
    async fn find_by_session_id(&self, session_id: &str)
        -> Result<Option<SessionToken>, StoreError>;

    /// Lists every record (active or not) owned by an identity.
    async fn list_for_identity(&self, identity_id: &str) -> Result<Vec<SessionToken>, StoreError>;

    /// Revokes one record if it is still active.
    async fn revoke(
        &self,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<RevokeOutcome, StoreError>;

    /// Revokes every active record of an identity.
    ///
    /// # Returns
    ///
    /// Returns the number of records that transitioned to revoked.
    async fn revoke_all(&self, identity_id: &str, now: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Revokes the record matching `old_fingerprint` and stores `replacement`
    /// in one transition. The replacement is stored only if the old record
    /// was active.
    async fn rotate(
        &self,
        old_fingerprint: &str,
        replacement: SessionToken,
        now: DateTime<Utc>,
    ) -> Result<RotateOutcome, StoreError>;

    /// Updates the last-used time of a record. Missing records are ignored.
    async fn touch(&self, fingerprint: &str, now: DateTime<Utc>) -> Result<(), StoreError>;

    /// Deletes every purgeable record (see `SessionToken::is_purgeable`).
    async fn purge(
        &self,
        now: DateTime<Utc>,
        revoked_retention: Duration,
    ) -> Result<PurgeStats, StoreError>;

    /// Counts the records `purge` would delete, without deleting them.
    async fn count_purgeable(
        &self,
        now: DateTime<Utc>,
        revoked_retention: Duration,
    ) -> Result<PurgeStats, StoreError>;
}

/// Chooses which active sessions to revoke before inserting a new one.
///
/// Returns fingerprints of the oldest active sessions (by issuance time) such
/// that after inserting one more record at most `max_active` are active.
/// A cap of zero is treated as one.
pub fn select_evictions<'a, I>(records: I, max_active: usize, now: DateTime<Utc>) -> Vec<String>
where
    I: IntoIterator<Item = &'a SessionToken>,
{
    let max_active = max_active.max(1);

    let mut active: Vec<&SessionToken> =
        records.into_iter().filter(|r| r.is_active(now)).collect();
    if active.len() < max_active {
        return Vec::new();
    }

    active.sort_by(|a, b| {
        a.issued_at.cmp(&b.issued_at).then_with(|| a.fingerprint.cmp(&b.fingerprint))
    });

    let excess = active.len() + 1 - max_active;
    active.into_iter().take(excess).map(|r| r.fingerprint.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClientMetadata;

    fn token(fp: &str, issued_at: DateTime<Utc>) -> SessionToken {
        SessionToken::new(
            "user-1",
            fp,
            format!("sid-{}", fp),
            issued_at,
            issued_at + Duration::days(7),
            ClientMetadata::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_no_eviction_below_cap() {
        let now = Utc::now();
        let records = vec![token("a", now), token("b", now)];
        assert!(select_evictions(&records, 5, now).is_empty());
    }

    #[test]
    fn test_evicts_oldest_at_cap() {
        let now = Utc::now();
        let records: Vec<_> = (0..5i64)
            .map(|i| token(&format!("fp{}", i), now - Duration::minutes(10 - i)))
            .collect();

        assert_eq!(select_evictions(&records, 5, now), vec!["fp0".to_string()]);
    }

    #[test]
    fn test_inactive_records_do_not_count() {
        let now = Utc::now();
        let mut revoked = token("old", now - Duration::hours(2));
        revoked.revoke(now);
        let records = vec![revoked, token("new", now)];

        assert!(select_evictions(&records, 2, now).is_empty());
    }

    #[test]
    fn test_over_cap_evicts_down_to_room_for_one() {
        let now = Utc::now();
        let records: Vec<_> = (0..4i64)
            .map(|i| token(&format!("fp{}", i), now - Duration::minutes(10 - i)))
            .collect();

        let evicted = select_evictions(&records, 2, now);
        assert_eq!(evicted, vec!["fp0".to_string(), "fp1".to_string(), "fp2".to_string()]);
    }

    #[test]
    fn test_purge_stats_merge() {
        let mut a = PurgeStats {
            expired_removed: 2,
            revoked_removed: 1,
        };
        a.merge(PurgeStats {
            expired_removed: 3,
            revoked_removed: 4,
        });
        assert_eq!(a.total(), 10);
    }
}
