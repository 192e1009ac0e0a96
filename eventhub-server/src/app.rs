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


//! Application initialization and runtime.
//!
//! This module handles:
//! - Credential store and identity directory initialization
//! - Bookkeeping worker pool and session reaper startup
//! - Root administrator bootstrap
//! - Graceful shutdown

use std::sync::Arc;

use anyhow::{Context, Result};
use eventhub_access::{
    AuthService, BookkeepingPool, Identity, IdentityAdmin, IdentityDirectory, MemoryDirectory,
    PasswordHasher, Role, SessionManager,
};
use eventhub_core::{CredentialStore, RedbCredentialStore};
use tracing::{info, warn};

use crate::config::{BootstrapConfig, Config};
use crate::reaper::SessionReaper;

/// Main application.
pub struct App {
    config: Config,
    directory: Arc<MemoryDirectory>,
    sessions: Arc<SessionManager>,
    auth: AuthService,
    admin: IdentityAdmin,
    pool: BookkeepingPool,
}

impl App {
    /// Creates a new application instance.
    ///
    /// Opens the credential store, starts the bookkeeping pool and
    /// bootstraps the root administrator. Must be called inside a Tokio
    /// runtime.
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing EventHub access runtime...");

        if config.security.generated_secret {
            warn!("EVENTHUB_JWT_SECRET not set, using a random secret for this process");
        }

        let session_config = config
            .sessions
            .to_session_config()
            .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

        tokio::fs::create_dir_all(&config.storage.data_dir).await?;

        let store: Arc<dyn CredentialStore> = Arc::new(
            RedbCredentialStore::open(&config.storage.sessions_path)
                .context("Failed to open credential store")?,
        );
        info!("Credential store opened at {:?}", config.storage.sessions_path);

        let directory = Arc::new(MemoryDirectory::new());
        let directory_dyn: Arc<dyn IdentityDirectory> = directory.clone();

        let pool = BookkeepingPool::start(
            &config.bookkeeping.to_pool_config(),
            store.clone(),
            directory_dyn.clone(),
        );

        let sessions = Arc::new(SessionManager::new(
            store,
            directory_dyn.clone(),
            &config.security.jwt_secret,
            session_config,
            pool.handle(),
        ));

        let auth = AuthService::new(directory_dyn.clone(), sessions.clone());
        let admin = IdentityAdmin::new(directory_dyn, sessions.clone());

        initialize_root_user(directory.as_ref(), &config.bootstrap).await?;

        Ok(Self {
            config,
            directory,
            sessions,
            auth,
            admin,
            pool,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Identity directory backing this runtime.
    pub fn directory(&self) -> &Arc<MemoryDirectory> {
        &self.directory
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Login entry point.
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Role and activation management entry point.
    pub fn admin(&self) -> &IdentityAdmin {
        &self.admin
    }

    /// Runs background tasks until a shutdown signal arrives.
    pub async fn run(self) -> Result<()> {
        info!("EventHub access runtime starting...");
        info!(
            "Session limits: access {} min, refresh {} days, {} active sessions",
            self.config.sessions.access_ttl_minutes,
            self.config.sessions.refresh_ttl_days,
            self.config.sessions.max_active_sessions
        );

        let reaper_handle = if self.config.reaper.enabled {
            let reaper = SessionReaper::new(self.sessions.clone(), self.config.reaper.clone());
            Some(reaper.spawn())
        } else {
            info!("Session reaper disabled");
            None
        };

        let result = shutdown_signal().await;

        if let Some(handle) = reaper_handle {
            handle.abort();
            info!("Session reaper stopped");
        }

        self.shutdown().await;
        result
    }

    /// Stops the bookkeeping pool.
    pub async fn shutdown(self) {
        self.pool.shutdown().await;
        info!("Shutdown complete");
    }
}

/// Waits for Ctrl+C or SIGTERM.
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.context("Failed to install Ctrl+C handler")
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .context("Failed to install signal handler")?
            .recv()
            .await;
        Ok::<(), anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        result = ctrl_c => {
            result?;
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        result = terminate => {
            result?;
            info!("Received terminate signal, starting graceful shutdown...");
        }
    }
    Ok(())
}

/// Creates the root administrator if a password is configured.
///
/// Environment variables:
/// - `EVENTHUB_ROOT_EMAIL` - Email of the root administrator (default: "admin@localhost")
/// - `EVENTHUB_ROOT_PASSWORD` - Password (required for initialization)
///
/// If an identity with that email already exists, this function does nothing.
pub async fn initialize_root_user(
    directory: &MemoryDirectory,
    bootstrap: &BootstrapConfig,
) -> Result<()> {
    let password = match &bootstrap.root_password {
        Some(password) => password,
        None => {
            info!("Root user initialization skipped (EVENTHUB_ROOT_PASSWORD not set)");
            return Ok(());
        }
    };

    if directory.get_by_email(&bootstrap.root_email).await?.is_some() {
        info!("Root user '{}' already exists", bootstrap.root_email);
        return Ok(());
    }

    let hash = PasswordHasher::new()
        .hash_password(password)
        .map_err(|e| anyhow::anyhow!("Failed to create root user: {}", e))?;

    let mut identity = Identity::new(&bootstrap.root_email, "Administrator", hash, Role::Admin);
    identity.is_verified = true;
    let id = identity.id.clone();
    directory.insert(identity).await;

    info!("Root user '{}' created successfully (ID: {})", bootstrap.root_email, id);
    Ok(())
}
