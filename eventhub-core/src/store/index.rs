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

//! Durable credential store backed by redb.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use redb::{Database, ReadableTable, Table, TableDefinition};
use tokio::task;
use tracing::debug;

use super::engine::{select_evictions, CredentialStore, PurgeStats, RevokeOutcome, RotateOutcome};
use crate::error::StoreError;
use crate::types::SessionToken;

/// fingerprint -> bincode-encoded `SessionToken`
const SESSIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");
/// session id -> fingerprint
const SESSION_ID_TABLE: TableDefinition<&str, &str> = TableDefinition::new("session_ids");
/// "{identity_id}\x1f{fingerprint}" -> fingerprint
const IDENTITY_TABLE: TableDefinition<&str, &str> = TableDefinition::new("identity_sessions");

const KEY_SEPARATOR: char = '\u{1f}';

/// Credential store persisted in a redb database file.
///
/// Each trait method runs in a single redb transaction on a blocking thread.
/// redb admits one writer at a time, so rotate and capped insert are atomic
/// with respect to each other and to revocation.
#[derive(Clone)]
pub struct RedbCredentialStore {
    db: Arc<Database>,
}

impl RedbCredentialStore {
    /// Creates or opens a credential database.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the redb database file
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(db_path).map_err(db_err)?;

        // redb requires a write transaction to create tables
        let write_txn = db.begin_write().map_err(db_err)?;
        {
            write_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
            write_txn.open_table(SESSION_ID_TABLE).map_err(db_err)?;
            write_txn.open_table(IDENTITY_TABLE).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Runs a closure against the database on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?
    }
}

fn db_err<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Database(e.to_string())
}

fn encode(record: &SessionToken) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<SessionToken, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn identity_prefix(identity_id: &str) -> String {
    format!("{}{}", identity_id, KEY_SEPARATOR)
}

fn identity_key(identity_id: &str, fingerprint: &str) -> String {
    format!("{}{}", identity_prefix(identity_id), fingerprint)
}

fn load(
    sessions: &impl ReadableTable<&'static str, &'static [u8]>,
    fingerprint: &str,
) -> Result<Option<SessionToken>, StoreError> {
    match sessions.get(fingerprint).map_err(db_err)? {
        Some(guard) => Ok(Some(decode(guard.value())?)),
        None => Ok(None),
    }
}

fn save(
    sessions: &mut Table<'_, &'static str, &'static [u8]>,
    record: &SessionToken,
) -> Result<(), StoreError> {
    let bytes = encode(record)?;
    sessions.insert(record.fingerprint.as_str(), bytes.as_slice()).map_err(db_err)?;
    Ok(())
}

/// Collects the fingerprints indexed under one identity.
fn identity_fingerprints(
    index: &impl ReadableTable<&'static str, &'static str>,
    identity_id: &str,
) -> Result<Vec<String>, StoreError> {
    let prefix = identity_prefix(identity_id);
    let mut fingerprints = Vec::new();
    for item in index.range(prefix.as_str()..).map_err(db_err)? {
        let (key, value) = item.map_err(db_err)?;
        if !key.value().starts_with(&prefix) {
            break;
        }
        fingerprints.push(value.value().to_string());
    }
    Ok(fingerprints)
}

fn load_for_identity(
    sessions: &impl ReadableTable<&'static str, &'static [u8]>,
    index: &impl ReadableTable<&'static str, &'static str>,
    identity_id: &str,
) -> Result<Vec<SessionToken>, StoreError> {
    let mut records = Vec::new();
    for fingerprint in identity_fingerprints(index, identity_id)? {
        if let Some(record) = load(sessions, &fingerprint)? {
            records.push(record);
        }
    }
    Ok(records)
}

/// Writes a new record together with both of its index entries.
fn store_new(
    sessions: &mut Table<'_, &'static str, &'static [u8]>,
    by_session: &mut Table<'_, &'static str, &'static str>,
    by_identity: &mut Table<'_, &'static str, &'static str>,
    record: &SessionToken,
) -> Result<(), StoreError> {
    save(sessions, record)?;
    by_session
        .insert(record.session_id.as_str(), record.fingerprint.as_str())
        .map_err(db_err)?;
    let key = identity_key(&record.identity_id, &record.fingerprint);
    by_identity.insert(key.as_str(), record.fingerprint.as_str()).map_err(db_err)?;
    Ok(())
}

#[async_trait]
impl CredentialStore for RedbCredentialStore {
    async fn insert(
        &self,
        record: SessionToken,
        max_active: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionToken>, StoreError> {
        self.blocking(move |db| {
            let write_txn = db.begin_write().map_err(db_err)?;
            let evicted = {
                let mut sessions = write_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
                let mut by_session = write_txn.open_table(SESSION_ID_TABLE).map_err(db_err)?;
                let mut by_identity = write_txn.open_table(IDENTITY_TABLE).map_err(db_err)?;

                if load(&sessions, &record.fingerprint)?.is_some() {
                    return Err(StoreError::DuplicateFingerprint);
                }

                let owned = load_for_identity(&sessions, &by_identity, &record.identity_id)?;
                let victims = select_evictions(&owned, max_active, now);

                let mut evicted = Vec::with_capacity(victims.len());
                for mut existing in owned {
                    if victims.contains(&existing.fingerprint) {
                        existing.revoke(now);
                        save(&mut sessions, &existing)?;
                        evicted.push(existing);
                    }
                }

                store_new(&mut sessions, &mut by_session, &mut by_identity, &record)?;
                evicted
            };
            write_txn.commit().map_err(db_err)?;

            debug!(
                "Stored session {} for identity {} ({} evicted)",
                record.session_id,
                record.identity_id,
                evicted.len()
            );
            Ok(evicted)
        })
        .await
    }

    async fn find_by_fingerprint(
        &self,
        fingerprint: &str,
    ) -> Result<Option<SessionToken>, StoreError> {
        let fingerprint = fingerprint.to_string();
        self.blocking(move |db| {
            let read_txn = db.begin_read().map_err(db_err)?;
            let sessions = read_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
            load(&sessions, &fingerprint)
        })
        .await
    }

    async fn find_by_session_id(
        &self,
        session_id: &str,
    ) -> Result<Option<SessionToken>, StoreError> {
        let session_id = session_id.to_string();
        self.blocking(move |db| {
            let read_txn = db.begin_read().map_err(db_err)?;
            let by_session = read_txn.open_table(SESSION_ID_TABLE).map_err(db_err)?;
            let fingerprint = match by_session.get(session_id.as_str()).map_err(db_err)? {
                Some(guard) => guard.value().to_string(),
                None => return Ok(None),
            };
            let sessions = read_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
            load(&sessions, &fingerprint)
        })
        .await
    }

    async fn list_for_identity(&self, identity_id: &str) -> Result<Vec<SessionToken>, StoreError> {
        let identity_id = identity_id.to_string();
        self.blocking(move |db| {
            let read_txn = db.begin_read().map_err(db_err)?;
            let sessions = read_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
            let by_identity = read_txn.open_table(IDENTITY_TABLE).map_err(db_err)?;
            load_for_identity(&sessions, &by_identity, &identity_id)
        })
        .await
    }

    async fn revoke(
        &self,
        fingerprint: &str,
        now: DateTime<Utc>,
    ) -> Result<RevokeOutcome, StoreError> {
        let fingerprint = fingerprint.to_string();
        self.blocking(move |db| {
            let write_txn = db.begin_write().map_err(db_err)?;
            let outcome = {
                let mut sessions = write_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
                match load(&sessions, &fingerprint)? {
                    None => RevokeOutcome::NotFound,
                    Some(record) if !record.is_active(now) => RevokeOutcome::AlreadyInactive,
                    Some(mut record) => {
                        record.revoke(now);
                        save(&mut sessions, &record)?;
                        RevokeOutcome::Revoked(record)
                    }
                }
            };
            write_txn.commit().map_err(db_err)?;
            Ok(outcome)
        })
        .await
    }

    async fn revoke_all(&self, identity_id: &str, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let identity_id = identity_id.to_string();
        self.blocking(move |db| {
            let write_txn = db.begin_write().map_err(db_err)?;
            let count = {
                let mut sessions = write_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
                let by_identity = write_txn.open_table(IDENTITY_TABLE).map_err(db_err)?;

                let mut count = 0;
                for mut record in load_for_identity(&sessions, &by_identity, &identity_id)? {
                    if record.is_active(now) {
                        record.revoke(now);
                        save(&mut sessions, &record)?;
                        count += 1;
                    }
                }
                count
            };
            write_txn.commit().map_err(db_err)?;
            Ok(count)
        })
        .await
    }

    async fn rotate(
        &self,
        old_fingerprint: &str,
        replacement: SessionToken,
        now: DateTime<Utc>,
    ) -> Result<RotateOutcome, StoreError> {
        let old_fingerprint = old_fingerprint.to_string();
        self.blocking(move |db| {
            let write_txn = db.begin_write().map_err(db_err)?;
            let outcome = {
                let mut sessions = write_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
                let mut by_session = write_txn.open_table(SESSION_ID_TABLE).map_err(db_err)?;
                let mut by_identity = write_txn.open_table(IDENTITY_TABLE).map_err(db_err)?;

                if load(&sessions, &replacement.fingerprint)?.is_some() {
                    return Err(StoreError::DuplicateFingerprint);
                }

                match load(&sessions, &old_fingerprint)? {
                    None => RotateOutcome::NotFound,
                    Some(previous) if !previous.is_active(now) => RotateOutcome::Inactive,
                    Some(mut previous) => {
                        previous.revoke(now);
                        save(&mut sessions, &previous)?;
                        store_new(&mut sessions, &mut by_session, &mut by_identity, &replacement)?;
                        RotateOutcome::Rotated { previous }
                    }
                }
            };
            write_txn.commit().map_err(db_err)?;
            Ok(outcome)
        })
        .await
    }

    async fn touch(&self, fingerprint: &str, now: DateTime<Utc>) -> Result<(), StoreError> {
        let fingerprint = fingerprint.to_string();
        self.blocking(move |db| {
            let write_txn = db.begin_write().map_err(db_err)?;
            {
                let mut sessions = write_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
                if let Some(mut record) = load(&sessions, &fingerprint)? {
                    record.touch(now);
                    save(&mut sessions, &record)?;
                }
            }
            write_txn.commit().map_err(db_err)?;
            Ok(())
        })
        .await
    }

    async fn purge(
        &self,
        now: DateTime<Utc>,
        revoked_retention: Duration,
    ) -> Result<PurgeStats, StoreError> {
        self.blocking(move |db| {
            let write_txn = db.begin_write().map_err(db_err)?;
            let stats = {
                let mut sessions = write_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;
                let mut by_session = write_txn.open_table(SESSION_ID_TABLE).map_err(db_err)?;
                let mut by_identity = write_txn.open_table(IDENTITY_TABLE).map_err(db_err)?;

                let mut doomed = Vec::new();
                for item in sessions.iter().map_err(db_err)? {
                    let (_, value) = item.map_err(db_err)?;
                    let record = decode(value.value())?;
                    if record.is_purgeable(now, revoked_retention) {
                        doomed.push(record);
                    }
                }

                let mut stats = PurgeStats::default();
                for record in doomed {
                    sessions.remove(record.fingerprint.as_str()).map_err(db_err)?;
                    by_session.remove(record.session_id.as_str()).map_err(db_err)?;
                    let key = identity_key(&record.identity_id, &record.fingerprint);
                    by_identity.remove(key.as_str()).map_err(db_err)?;
                    stats.record(&record, now);
                }
                stats
            };
            write_txn.commit().map_err(db_err)?;
            Ok(stats)
        })
        .await
    }

    async fn count_purgeable(
        &self,
        now: DateTime<Utc>,
        revoked_retention: Duration,
    ) -> Result<PurgeStats, StoreError> {
        self.blocking(move |db| {
            let read_txn = db.begin_read().map_err(db_err)?;
            let sessions = read_txn.open_table(SESSIONS_TABLE).map_err(db_err)?;

            let mut stats = PurgeStats::default();
            for item in sessions.iter().map_err(db_err)? {
                let (_, value) = item.map_err(db_err)?;
                let record = decode(value.value())?;
                if record.is_purgeable(now, revoked_retention) {
                    stats.record(&record, now);
                }
            }
            Ok(stats)
        })
        .await
    }
}
