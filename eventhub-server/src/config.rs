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


//! Configuration management for the EventHub access runtime.

use std::path::PathBuf;
use std::str::FromStr;

use eventhub_access::{BookkeepingConfig, SessionConfig};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Minimum signing secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted refresh lifetime and revoked retention, in days.
pub const MAX_LIFETIME_DAYS: i64 = 3650;

/// Longest accepted reaper interval, in minutes (one week).
pub const MAX_REAPER_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Credential signing settings
    pub security: SecurityConfig,
    /// Session lifetimes and limits
    pub sessions: SessionSettings,
    /// Credential store location
    pub storage: StorageConfig,
    /// Session reaper settings
    pub reaper: ReaperConfig,
    /// Bookkeeping worker pool settings
    pub bookkeeping: BookkeepingSettings,
    /// Initial admin account
    pub bootstrap: BootstrapConfig,
}

/// Credential signing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// HS256 signing secret.
    /// Can be set via EVENTHUB_JWT_SECRET environment variable.
    /// A random secret is generated when unset, so sessions do not survive
    /// a restart.
    pub jwt_secret: String,
    /// True when `jwt_secret` was generated at startup
    #[serde(skip)]
    pub generated_secret: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        match std::env::var("EVENTHUB_JWT_SECRET") {
            Ok(secret) => Self {
                jwt_secret: secret,
                generated_secret: false,
            },
            Err(_) => Self {
                jwt_secret: generate_secret(),
                generated_secret: true,
            },
        }
    }
}

/// Random hex-encoded signing secret, `2 * MIN_SECRET_LEN` characters long.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; MIN_SECRET_LEN];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Session lifetimes and limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Access credential lifetime in minutes (default: 15).
    /// Can be set via EVENTHUB_ACCESS_TTL_MINUTES environment variable.
    pub access_ttl_minutes: i64,
    /// Refresh credential lifetime in days (default: 7).
    /// Can be set via EVENTHUB_REFRESH_TTL_DAYS environment variable.
    pub refresh_ttl_days: i64,
    /// Maximum concurrently active sessions per identity (default: 5).
    /// Can be set via EVENTHUB_MAX_SESSIONS environment variable.
    pub max_active_sessions: usize,
    /// Days a revoked record is kept before reaping (default: 30).
    /// Can be set via EVENTHUB_REVOKED_RETENTION_DAYS environment variable.
    pub revoked_retention_days: i64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            access_ttl_minutes: env_or("EVENTHUB_ACCESS_TTL_MINUTES", 15),
            refresh_ttl_days: env_or("EVENTHUB_REFRESH_TTL_DAYS", 7),
            max_active_sessions: env_or("EVENTHUB_MAX_SESSIONS", 5),
            revoked_retention_days: env_or("EVENTHUB_REVOKED_RETENTION_DAYS", 30),
        }
    }
}

impl SessionSettings {
    /// Converts to lifetimes, rejecting values chrono cannot represent.
    pub fn to_session_config(&self) -> Result<SessionConfig, String> {
        let out_of_range = |name: &str| format!("{} is out of range", name);
        Ok(SessionConfig {
            access_ttl: chrono::Duration::try_minutes(self.access_ttl_minutes)
                .ok_or_else(|| out_of_range("EVENTHUB_ACCESS_TTL_MINUTES"))?,
            refresh_ttl: chrono::Duration::try_days(self.refresh_ttl_days)
                .ok_or_else(|| out_of_range("EVENTHUB_REFRESH_TTL_DAYS"))?,
            max_active_sessions: self.max_active_sessions,
            revoked_retention: chrono::Duration::try_days(self.revoked_retention_days)
                .ok_or_else(|| out_of_range("EVENTHUB_REVOKED_RETENTION_DAYS"))?,
        })
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory.
    /// Can be set via EVENTHUB_DATA_DIR environment variable.
    pub data_dir: PathBuf,
    /// Path to the session database
    pub sessions_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = std::env::var("EVENTHUB_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("eventhub-data"));

        Self::at(data_dir)
    }
}

impl StorageConfig {
    /// Storage rooted at `data_dir`.
    pub fn at(data_dir: PathBuf) -> Self {
        Self {
            sessions_path: data_dir.join("sessions.redb"),
            data_dir,
        }
    }
}

/// Session reaper configuration.
///
/// The reaper runs as a background task and periodically deletes expired
/// session records and revoked records past retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaperConfig {
    /// Enable the reaper.
    /// Can be set via EVENTHUB_REAPER_ENABLED environment variable.
    pub enabled: bool,
    /// Reaping interval in minutes (default: 60).
    /// Can be set via EVENTHUB_REAPER_INTERVAL_MINUTES environment variable.
    pub interval_minutes: u64,
    /// Dry-run mode - log what would be deleted without deleting.
    /// Can be set via EVENTHUB_REAPER_DRY_RUN environment variable.
    pub dry_run: bool,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            enabled: env_flag("EVENTHUB_REAPER_ENABLED", true),
            interval_minutes: env_or("EVENTHUB_REAPER_INTERVAL_MINUTES", 60),
            dry_run: env_flag("EVENTHUB_REAPER_DRY_RUN", false),
        }
    }
}

/// Bookkeeping worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookkeepingSettings {
    /// Number of workers (default: 2).
    /// Can be set via EVENTHUB_BOOKKEEPING_WORKERS environment variable.
    pub workers: usize,
    /// Queue capacity (default: 1024).
    /// Can be set via EVENTHUB_BOOKKEEPING_QUEUE environment variable.
    pub queue_capacity: usize,
}

impl Default for BookkeepingSettings {
    fn default() -> Self {
        Self {
            workers: env_or("EVENTHUB_BOOKKEEPING_WORKERS", 2),
            queue_capacity: env_or("EVENTHUB_BOOKKEEPING_QUEUE", 1024),
        }
    }
}

impl BookkeepingSettings {
    pub fn to_pool_config(&self) -> BookkeepingConfig {
        BookkeepingConfig {
            workers: self.workers,
            queue_capacity: self.queue_capacity,
        }
    }
}

/// Initial admin account, created at startup when a password is given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Admin email.
    /// Can be set via EVENTHUB_ROOT_EMAIL environment variable.
    pub root_email: String,
    /// Admin password; no admin is created when unset.
    /// Can be set via EVENTHUB_ROOT_PASSWORD environment variable.
    #[serde(skip_serializing)]
    pub root_password: Option<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            root_email: std::env::var("EVENTHUB_ROOT_EMAIL")
                .unwrap_or_else(|_| "admin@localhost".to_string()),
            root_password: std::env::var("EVENTHUB_ROOT_PASSWORD").ok(),
        }
    }
}

impl Config {
    /// Loads configuration from the environment and validates it.
    pub fn load() -> anyhow::Result<Self> {
        let config = Self::default();
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
        Ok(config)
    }

    /// Validates configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.security.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(format!(
                "EVENTHUB_JWT_SECRET must be at least {} bytes",
                MIN_SECRET_LEN
            ));
        }
        if self.sessions.access_ttl_minutes <= 0 {
            return Err("EVENTHUB_ACCESS_TTL_MINUTES must be positive".to_string());
        }
        if self.sessions.refresh_ttl_days <= 0 {
            return Err("EVENTHUB_REFRESH_TTL_DAYS must be positive".to_string());
        }
        if self.sessions.refresh_ttl_days > MAX_LIFETIME_DAYS {
            return Err(format!(
                "EVENTHUB_REFRESH_TTL_DAYS must be at most {}",
                MAX_LIFETIME_DAYS
            ));
        }
        if self.sessions.access_ttl_minutes >= self.sessions.refresh_ttl_days * 24 * 60 {
            return Err("access lifetime must be shorter than refresh lifetime".to_string());
        }
        if self.sessions.max_active_sessions == 0 {
            return Err("EVENTHUB_MAX_SESSIONS must be at least 1".to_string());
        }
        if !(0..=MAX_LIFETIME_DAYS).contains(&self.sessions.revoked_retention_days) {
            return Err(format!(
                "EVENTHUB_REVOKED_RETENTION_DAYS must be between 0 and {}",
                MAX_LIFETIME_DAYS
            ));
        }
        if !(1..=MAX_REAPER_INTERVAL_MINUTES).contains(&self.reaper.interval_minutes) {
            return Err(format!(
                "EVENTHUB_REAPER_INTERVAL_MINUTES must be between 1 and {}",
                MAX_REAPER_INTERVAL_MINUTES
            ));
        }
        if self.bookkeeping.workers == 0 || self.bookkeeping.queue_capacity == 0 {
            return Err("bookkeeping workers and queue capacity must be at least 1".to_string());
        }
        self.sessions.to_session_config()?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            security: SecurityConfig::default(),
            sessions: SessionSettings::default(),
            storage: StorageConfig::default(),
            reaper: ReaperConfig::default(),
            bookkeeping: BookkeepingSettings::default(),
            bootstrap: BootstrapConfig::default(),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|s| s.to_lowercase() == "true" || s == "1")
        .unwrap_or(default)
}
