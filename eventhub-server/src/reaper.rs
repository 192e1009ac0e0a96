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


//! Session reaper for automatic record expiration.
//!
//! Runs in the background and periodically deletes expired session records
//! and revoked records past their retention window.

use std::sync::Arc;

use chrono::Utc;
use eventhub_access::{AccessError, SessionManager};
use eventhub_core::PurgeStats;
use tokio::time::{interval, Duration as TokioDuration};
use tracing::{error, info};

use crate::config::{ReaperConfig, MAX_REAPER_INTERVAL_MINUTES};

/// Background session reaper.
pub struct SessionReaper {
    /// Session manager owning the credential store.
    sessions: Arc<SessionManager>,
    /// Reaper configuration.
    config: ReaperConfig,
}

impl SessionReaper {
    pub fn new(sessions: Arc<SessionManager>, config: ReaperConfig) -> Self {
        Self { sessions, config }
    }

    /// Spawns the reaper as a background task.
    ///
    /// Returns a join handle that can be used to wait for or abort the reaper.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run_loop().await;
        })
    }

    async fn run_loop(&self) {
        let interval_duration = TokioDuration::from_secs(
            self.config.interval_minutes.clamp(1, MAX_REAPER_INTERVAL_MINUTES) * 60,
        );
        let mut timer = interval(interval_duration);

        info!(
            "Session reaper started (interval: {} minutes, dry_run: {})",
            self.config.interval_minutes, self.config.dry_run
        );

        // Skip the first tick (fires immediately)
        timer.tick().await;

        let mut totals = PurgeStats::default();
        loop {
            timer.tick().await;

            let start = std::time::Instant::now();
            match self.run_once().await {
                Ok(stats) => {
                    info!(
                        "Session reaping completed in {:?}. Expired: {}, Revoked: {}{}",
                        start.elapsed(),
                        stats.expired_removed,
                        stats.revoked_removed,
                        if self.config.dry_run { " (dry run)" } else { "" }
                    );
                    if !self.config.dry_run {
                        totals.merge(stats);
                        info!("Session records reaped since startup: {}", totals.total());
                    }
                }
                Err(e) => {
                    error!("Session reaping failed: {}", e);
                }
            }
        }
    }

    /// Runs one reaping pass.
    ///
    /// In dry-run mode the records are counted, not deleted.
    pub async fn run_once(&self) -> Result<PurgeStats, AccessError> {
        let now = Utc::now();
        if self.config.dry_run {
            self.sessions.preview_reap_at(now).await
        } else {
            self.sessions.reap_at(now).await
        }
    }
}
