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


//! Runtime wiring tests: startup, root bootstrap and the session reaper.

use std::path::Path;
use std::sync::Arc;

use chrono::{Duration, Utc};
use eventhub_access::{
    Bookkeeper, IdentityDirectory, MemoryDirectory, Role, SessionConfig, SessionManager,
};
use eventhub_core::{ClientMetadata, CredentialStore, RedbCredentialStore, SessionToken};
use eventhub_server::config::{
    BookkeepingSettings, BootstrapConfig, ReaperConfig, SecurityConfig, SessionSettings,
    StorageConfig,
};
use eventhub_server::reaper::SessionReaper;
use eventhub_server::{App, Config};
use tempfile::TempDir;

const SECRET: &str = "runtime-test-secret-with-at-least-32-bytes";

fn test_config(data_dir: &Path, root_password: Option<&str>) -> Config {
    Config {
        security: SecurityConfig {
            jwt_secret: SECRET.to_string(),
            generated_secret: false,
        },
        sessions: SessionSettings {
            access_ttl_minutes: 15,
            refresh_ttl_days: 7,
            max_active_sessions: 5,
            revoked_retention_days: 30,
        },
        storage: StorageConfig::at(data_dir.to_path_buf()),
        reaper: ReaperConfig {
            enabled: false,
            interval_minutes: 60,
            dry_run: false,
        },
        bookkeeping: BookkeepingSettings {
            workers: 1,
            queue_capacity: 16,
        },
        bootstrap: BootstrapConfig {
            root_email: "root@eventhub.test".to_string(),
            root_password: root_password.map(str::to_string),
        },
    }
}

fn record(identity: &str, fingerprint: &str, issued_days_ago: i64, ttl_days: i64) -> SessionToken {
    let issued_at = Utc::now() - Duration::days(issued_days_ago);
    SessionToken::new(
        identity,
        fingerprint,
        format!("sid-{}", fingerprint),
        issued_at,
        issued_at + Duration::days(ttl_days),
        ClientMetadata::default(),
    )
    .unwrap()
}

async fn seeded_manager(dir: &TempDir) -> (Arc<SessionManager>, Arc<dyn CredentialStore>) {
    let store: Arc<dyn CredentialStore> =
        Arc::new(RedbCredentialStore::open(&dir.path().join("sessions.redb")).unwrap());

    let now = Utc::now();
    // Expired three days ago
    store.insert(record("u1", "fp-expired", 10, 7), 5, now).await.unwrap();
    // Still active
    store.insert(record("u1", "fp-live", 1, 7), 5, now).await.unwrap();

    let directory: Arc<dyn IdentityDirectory> = Arc::new(MemoryDirectory::new());
    let manager = Arc::new(SessionManager::new(
        store.clone(),
        directory,
        SECRET,
        SessionConfig::default(),
        Bookkeeper::disabled(),
    ));
    (manager, store)
}

#[tokio::test]
async fn test_reaper_dry_run_counts_without_deleting() {
    let dir = TempDir::new().unwrap();
    let (manager, store) = seeded_manager(&dir).await;

    let reaper = SessionReaper::new(
        manager,
        ReaperConfig {
            enabled: true,
            interval_minutes: 60,
            dry_run: true,
        },
    );

    let stats = reaper.run_once().await.unwrap();
    assert_eq!(stats.expired_removed, 1);
    assert_eq!(stats.revoked_removed, 0);
    assert!(store.find_by_fingerprint("fp-expired").await.unwrap().is_some());
}

#[tokio::test]
async fn test_reaper_deletes_expired_records() {
    let dir = TempDir::new().unwrap();
    let (manager, store) = seeded_manager(&dir).await;

    let reaper = SessionReaper::new(
        manager,
        ReaperConfig {
            enabled: true,
            interval_minutes: 60,
            dry_run: false,
        },
    );

    let stats = reaper.run_once().await.unwrap();
    assert_eq!(stats.total(), 1);
    assert!(store.find_by_fingerprint("fp-expired").await.unwrap().is_none());
    assert!(store.find_by_fingerprint("fp-live").await.unwrap().is_some());

    // Nothing left to reap
    assert_eq!(reaper.run_once().await.unwrap().total(), 0);
}

#[tokio::test]
async fn test_spawned_reaper_can_be_aborted() {
    let dir = TempDir::new().unwrap();
    let (manager, _store) = seeded_manager(&dir).await;

    let handle = SessionReaper::new(
        manager,
        ReaperConfig {
            enabled: true,
            interval_minutes: 60,
            dry_run: false,
        },
    )
    .spawn();

    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn test_reaper_clamps_oversized_interval() {
    let dir = TempDir::new().unwrap();
    let (manager, _store) = seeded_manager(&dir).await;

    let handle = SessionReaper::new(
        manager,
        ReaperConfig {
            enabled: true,
            interval_minutes: u64::MAX,
            dry_run: false,
        },
    )
    .spawn();

    // Let the loop start and arm its timer
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(!handle.is_finished());

    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn test_app_rejects_unrepresentable_lifetimes() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path(), None);
    config.sessions.revoked_retention_days = i64::MAX;

    let err = App::new(config).await.err().unwrap();
    assert!(err.to_string().contains("Configuration error"));
}

#[tokio::test]
async fn test_app_bootstraps_root_admin() {
    let dir = TempDir::new().unwrap();
    let app = App::new(test_config(dir.path(), Some("root-password"))).await.unwrap();

    assert!(dir.path().join("sessions.redb").exists());

    let issued = app
        .auth()
        .login("root@eventhub.test", "root-password", ClientMetadata::default())
        .await
        .unwrap();
    let caller = app.sessions().authenticate(&issued.access_token).await.unwrap();
    assert_eq!(caller.role, Role::Admin);
    assert!(caller.is_verified);

    app.shutdown().await;
}

#[tokio::test]
async fn test_app_skips_bootstrap_without_password() {
    let dir = TempDir::new().unwrap();
    let app = App::new(test_config(dir.path(), None)).await.unwrap();

    let root = app.directory().get_by_email("root@eventhub.test").await.unwrap();
    assert!(root.is_none());

    app.shutdown().await;
}

#[tokio::test]
async fn test_bootstrap_is_idempotent_across_restarts() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), Some("root-password"));

    let app = App::new(config.clone()).await.unwrap();
    let first = app.directory().get_by_email("root@eventhub.test").await.unwrap().unwrap();
    eventhub_server::app::initialize_root_user(app.directory(), &config.bootstrap)
        .await
        .unwrap();
    let second = app.directory().get_by_email("root@eventhub.test").await.unwrap().unwrap();
    assert_eq!(first.id, second.id);

    app.shutdown().await;
}
