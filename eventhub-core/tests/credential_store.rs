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

//! Credential Store Integration Tests
//!
//! Runs one behavioural suite against both store implementations:
//! - capped insert evicts the oldest active session
//! - revocation is idempotent
//! - rotation has exactly one winner
//! - purge removes only terminal records

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use eventhub_core::{
    ClientMetadata, CredentialStore, MemoryCredentialStore, RedbCredentialStore, RevokeOutcome,
    RotateOutcome, SessionToken, StoreError,
};
use tempfile::TempDir;

fn token(identity: &str, fp: &str, issued_at: DateTime<Utc>, lifetime: Duration) -> SessionToken {
    SessionToken::new(
        identity,
        fp,
        format!("sid-{}", fp),
        issued_at,
        issued_at + lifetime,
        ClientMetadata::new("192.0.2.10", "Mozilla/5.0 (X11; Linux x86_64) Firefox/121.0"),
    )
    .expect("valid token")
}

/// Creates a redb store in a temporary directory.
fn create_redb_store() -> (RedbCredentialStore, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = RedbCredentialStore::open(&temp_dir.path().join("sessions.redb"))
        .expect("Failed to open credential store");
    (store, temp_dir)
}

async fn check_cap_evicts_oldest(store: &dyn CredentialStore) {
    let base = Utc::now() - Duration::hours(1);
    for i in 0..5i64 {
        let issued = base + Duration::minutes(i);
        let evicted = store
            .insert(token("alice", &format!("fp-{}", i), issued, Duration::days(7)), 5, issued)
            .await
            .unwrap();
        assert!(evicted.is_empty());
    }

    let now = Utc::now();
    let newest = token("alice", "fp-5", now, Duration::days(7));
    let evicted = store.insert(newest, 5, now).await.unwrap();
    assert_eq!(evicted.len(), 1);
    assert_eq!(evicted[0].fingerprint, "fp-0");

    let sessions = store.list_for_identity("alice").await.unwrap();
    assert_eq!(sessions.len(), 6);
    assert_eq!(sessions.iter().filter(|s| s.is_active(now)).count(), 5);
    let oldest = store.find_by_fingerprint("fp-0").await.unwrap().unwrap();
    assert!(oldest.revoked);
}

async fn check_revoke_idempotent(store: &dyn CredentialStore) {
    let now = Utc::now();
    store.insert(token("bob", "bob-fp", now, Duration::days(7)), 5, now).await.unwrap();

    let first = store.revoke("bob-fp", now).await.unwrap();
    let revoked_at = match first {
        RevokeOutcome::Revoked(record) => record.revoked_at,
        other => panic!("unexpected outcome {:?}", other),
    };

    let second = store.revoke("bob-fp", now + Duration::minutes(5)).await.unwrap();
    assert_eq!(second, RevokeOutcome::AlreadyInactive);

    let record = store.find_by_fingerprint("bob-fp").await.unwrap().unwrap();
    assert!(record.revoked);
    assert_eq!(record.revoked_at, revoked_at);

    assert_eq!(store.revoke("missing", now).await.unwrap(), RevokeOutcome::NotFound);
}

async fn check_rotate_and_lookup(store: &dyn CredentialStore) {
    let now = Utc::now();
    store.insert(token("carol", "c-1", now, Duration::days(7)), 5, now).await.unwrap();

    let replacement = token("carol", "c-2", now, Duration::days(7));
    let outcome = store.rotate("c-1", replacement, now).await.unwrap();
    match outcome {
        RotateOutcome::Rotated { previous } => assert!(previous.revoked),
        other => panic!("unexpected outcome {:?}", other),
    }

    let replay_token = token("carol", "c-3", now, Duration::days(7));
    let replay = store.rotate("c-1", replay_token, now).await.unwrap();
    assert_eq!(replay, RotateOutcome::Inactive);

    let by_id = store.find_by_session_id("sid-c-2").await.unwrap().unwrap();
    assert_eq!(by_id.fingerprint, "c-2");
    assert!(store.find_by_session_id("sid-c-3").await.unwrap().is_none());
}

async fn check_revoke_all(store: &dyn CredentialStore) {
    let now = Utc::now();
    for i in 0..3 {
        let fp = format!("dave-{}", i);
        store.insert(token("dave", &fp, now, Duration::days(7)), 5, now).await.unwrap();
    }
    store.insert(token("erin", "erin-0", now, Duration::days(7)), 5, now).await.unwrap();

    assert_eq!(store.revoke_all("dave", now).await.unwrap(), 3);
    assert_eq!(store.revoke_all("dave", now).await.unwrap(), 0);

    let erin = store.find_by_fingerprint("erin-0").await.unwrap().unwrap();
    assert!(erin.is_active(now));
}

async fn check_purge(store: &dyn CredentialStore) {
    let issued = Utc::now();
    store.insert(token("frank", "f-live", issued, Duration::days(7)), 5, issued).await.unwrap();

    let retention = Duration::days(30);
    let stats = store.purge(issued + Duration::days(6), retention).await.unwrap();
    assert_eq!(stats.total(), 0);
    assert!(store.find_by_fingerprint("f-live").await.unwrap().is_some());

    // Every seven-day session written by earlier checks is past expiry here too
    let later = issued + Duration::days(31);
    let preview = store.count_purgeable(later, retention).await.unwrap();
    assert!(store.find_by_fingerprint("f-live").await.unwrap().is_some());

    let stats = store.purge(later, retention).await.unwrap();
    assert!(stats.expired_removed >= 1);
    assert_eq!(stats, preview);
    assert!(store.find_by_fingerprint("f-live").await.unwrap().is_none());
    assert!(store.find_by_session_id("sid-f-live").await.unwrap().is_none());
    assert!(store.list_for_identity("frank").await.unwrap().is_empty());
}

async fn check_revoked_retention(store: &dyn CredentialStore) {
    let issued = Utc::now();
    store.insert(token("gina", "g-1", issued, Duration::days(90)), 5, issued).await.unwrap();
    store.revoke("g-1", issued).await.unwrap();

    let retention = Duration::days(30);
    let stats = store.purge(issued + Duration::days(10), retention).await.unwrap();
    assert_eq!(stats.total(), 0);

    let stats = store.purge(issued + Duration::days(31), retention).await.unwrap();
    assert_eq!(stats.revoked_removed, 1);
}

async fn check_duplicate(store: &dyn CredentialStore) {
    let now = Utc::now();
    store.insert(token("hank", "dup", now, Duration::days(7)), 5, now).await.unwrap();
    let result = store.insert(token("ivan", "dup", now, Duration::days(7)), 5, now).await;
    assert!(matches!(result, Err(StoreError::DuplicateFingerprint)));
}

async fn run_suite(store: &dyn CredentialStore) {
    check_cap_evicts_oldest(store).await;
    check_revoke_idempotent(store).await;
    check_rotate_and_lookup(store).await;
    check_revoke_all(store).await;
    check_purge(store).await;
    check_revoked_retention(store).await;
    check_duplicate(store).await;
}

#[tokio::test]
async fn test_memory_store_suite() {
    let store = MemoryCredentialStore::new();
    run_suite(&store).await;
}

#[tokio::test]
async fn test_redb_store_suite() {
    let (store, _temp_dir) = create_redb_store();
    run_suite(&store).await;
}

#[tokio::test]
async fn test_redb_store_survives_reopen() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("sessions.redb");
    let now = Utc::now();

    {
        let store = RedbCredentialStore::open(&path).unwrap();
        store.insert(token("judy", "j-1", now, Duration::days(7)), 5, now).await.unwrap();
    }

    let store = RedbCredentialStore::open(&path).unwrap();
    let record = store.find_by_fingerprint("j-1").await.unwrap().unwrap();
    assert_eq!(record.identity_id, "judy");
    assert_eq!(record.client.device_label, "Firefox on Linux");
}

#[tokio::test]
async fn test_concurrent_rotation_has_one_winner() {
    let (redb, _temp_dir) = create_redb_store();
    let stores: Vec<Arc<dyn CredentialStore>> =
        vec![Arc::new(MemoryCredentialStore::new()), Arc::new(redb)];

    for store in stores {
        let now = Utc::now();
        store.insert(token("kim", "k-0", now, Duration::days(7)), 5, now).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let replacement = token("kim", &format!("k-next-{}", i), now, Duration::days(7));
                store.rotate("k-0", replacement, Utc::now()).await.unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                RotateOutcome::Rotated { .. } => winners += 1,
                RotateOutcome::Inactive => {}
                RotateOutcome::NotFound => panic!("record vanished"),
            }
        }
        assert_eq!(winners, 1);
    }
}
