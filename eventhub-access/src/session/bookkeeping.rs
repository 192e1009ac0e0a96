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


//! Best-effort bookkeeping worker pool.
//!
//! Last-used and last-login stamps are written off the request path by a
//! fixed number of workers reading from one bounded queue. When the queue is
//! full new tasks are dropped with a warning. Failures are logged and never
//! reach the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use eventhub_core::CredentialStore;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::identity::IdentityDirectory;

/// Deferred write produced by a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookkeepingTask {
    /// Update the last-used time of a session
    TouchSession { fingerprint: String, at: DateTime<Utc> },
    /// Stamp the last successful login of an identity
    RecordLogin { identity_id: String, at: DateTime<Utc> },
}

/// Pool sizing.
#[derive(Debug, Clone)]
pub struct BookkeepingConfig {
    /// Number of worker tasks
    pub workers: usize,
    /// Queue capacity; tasks beyond it are dropped
    pub queue_capacity: usize,
}

impl Default for BookkeepingConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_capacity: 1024,
        }
    }
}

/// Cheap handle used to enqueue bookkeeping tasks.
#[derive(Clone)]
pub struct Bookkeeper {
    sender: Option<mpsc::Sender<BookkeepingTask>>,
}

impl Bookkeeper {
    /// A handle that discards every task.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Enqueues a task without waiting.
    pub fn dispatch(&self, task: BookkeepingTask) {
        let Some(sender) = &self.sender else {
            return;
        };

        match sender.try_send(task) {
            Ok(()) => {}
            Err(TrySendError::Full(task)) => {
                warn!("Bookkeeping queue full, dropping {:?}", task);
            }
            Err(TrySendError::Closed(task)) => {
                debug!("Bookkeeping pool stopped, dropping {:?}", task);
            }
        }
    }
}

/// Fixed-size pool of bookkeeping workers.
pub struct BookkeepingPool {
    sender: mpsc::Sender<BookkeepingTask>,
    shutdown: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl BookkeepingPool {
    /// Spawns the workers. Must be called inside a Tokio runtime.
    pub fn start(
        config: &BookkeepingConfig,
        store: Arc<dyn CredentialStore>,
        directory: Arc<dyn IdentityDirectory>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let (shutdown, shutdown_rx) = watch::channel(false);
        let receiver = Arc::new(Mutex::new(receiver));
        let worker_count = config.workers.max(1);

        let workers = (0..worker_count)
            .map(|id| {
                let worker = Worker {
                    id,
                    receiver: receiver.clone(),
                    shutdown: shutdown_rx.clone(),
                    store: store.clone(),
                    directory: directory.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        info!(
            "Bookkeeping pool started: {} workers, queue capacity {}",
            worker_count,
            config.queue_capacity.max(1)
        );

        Self {
            sender,
            shutdown,
            workers,
        }
    }

    /// Returns a handle for enqueueing tasks.
    pub fn handle(&self) -> Bookkeeper {
        Bookkeeper {
            sender: Some(self.sender.clone()),
        }
    }

    /// Stops the workers and waits for them to exit.
    ///
    /// A task already taken by a worker completes. Queued tasks may be dropped.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        drop(self.sender);

        for worker in self.workers {
            if let Err(e) = worker.await {
                warn!("Bookkeeping worker ended abnormally: {}", e);
            }
        }

        info!("Bookkeeping pool stopped");
    }
}

struct Worker {
    id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<BookkeepingTask>>>,
    shutdown: watch::Receiver<bool>,
    store: Arc<dyn CredentialStore>,
    directory: Arc<dyn IdentityDirectory>,
}

impl Worker {
    async fn run(mut self) {
        loop {
            let next = {
                let mut receiver = self.receiver.lock().await;
                tokio::select! {
                    task = receiver.recv() => task,
                    _ = self.shutdown.changed() => None,
                }
            };

            match next {
                Some(task) => self.execute(task).await,
                None => break,
            }
        }

        debug!("Bookkeeping worker {} exiting", self.id);
    }

    async fn execute(&self, task: BookkeepingTask) {
        match task {
            BookkeepingTask::TouchSession { fingerprint, at } => {
                if let Err(e) = self.store.touch(&fingerprint, at).await {
                    warn!("Failed to record session use: {}", e);
                }
            }
            BookkeepingTask::RecordLogin { identity_id, at } => {
                if let Err(e) = self.directory.update_last_login(&identity_id, at).await {
                    warn!("Failed to record login for {}: {}", identity_id, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use super::*;
    use crate::identity::{Identity, MemoryDirectory};
    use crate::rbac::Role;
    use eventhub_core::{ClientMetadata, MemoryCredentialStore, SessionToken};

    #[tokio::test]
    async fn test_tasks_are_applied() {
        let store = Arc::new(MemoryCredentialStore::new());
        let directory = Arc::new(MemoryDirectory::new());
        let identity = Identity::new("ana@example.com", "Ana", "hash", Role::User);
        directory.insert(identity.clone()).await;

        let now = Utc::now();
        let record = SessionToken::new(
            identity.id.clone(),
            "fp-1",
            "sid-1",
            now,
            now + chrono::Duration::days(7),
            ClientMetadata::new("192.0.2.1", "curl/8.0"),
        )
        .unwrap();
        store.insert(record, 5, now).await.unwrap();

        let config = BookkeepingConfig::default();
        let pool = BookkeepingPool::start(&config, store.clone(), directory.clone());
        let bookkeeper = pool.handle();
        bookkeeper.dispatch(BookkeepingTask::TouchSession {
            fingerprint: "fp-1".to_string(),
            at: now,
        });
        bookkeeper.dispatch(BookkeepingTask::RecordLogin {
            identity_id: identity.id.clone(),
            at: now,
        });

        let mut applied = false;
        for _ in 0..50 {
            let touched = store.find_by_fingerprint("fp-1").await.unwrap().unwrap().last_used_at;
            let login = directory.get_by_id(&identity.id).await.unwrap().unwrap().last_login_at;
            if touched == Some(now) && login == Some(now) {
                applied = true;
                break;
            }
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
        assert!(applied);

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_workers() {
        let store = Arc::new(MemoryCredentialStore::new());
        let directory = Arc::new(MemoryDirectory::new());
        let config = BookkeepingConfig {
            workers: 1,
            queue_capacity: 4,
        };
        let pool = BookkeepingPool::start(&config, store, directory);

        // Unknown identity: logged and skipped
        pool.handle().dispatch(BookkeepingTask::RecordLogin {
            identity_id: "missing".to_string(),
            at: Utc::now(),
        });

        tokio::time::timeout(StdDuration::from_secs(5), pool.shutdown())
            .await
            .expect("pool shuts down");
    }

    #[tokio::test]
    async fn test_disabled_and_stopped_handles_drop_tasks() {
        Bookkeeper::disabled().dispatch(BookkeepingTask::RecordLogin {
            identity_id: "x".to_string(),
            at: Utc::now(),
        });

        let pool = BookkeepingPool::start(
            &BookkeepingConfig::default(),
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(MemoryDirectory::new()),
        );
        let handle = pool.handle();
        pool.shutdown().await;

        handle.dispatch(BookkeepingTask::TouchSession {
            fingerprint: "gone".to_string(),
            at: Utc::now(),
        });
    }
}
