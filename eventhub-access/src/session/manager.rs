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


//! Session lifecycle manager.
//!
//! The only component that mints, rotates or invalidates session records.
//! Every validation re-reads the credential store; there is no token cache.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use eventhub_core::{
    ClientMetadata, CredentialStore, PurgeStats, RevokeOutcome, RotateOutcome, SessionToken,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::bookkeeping::{Bookkeeper, BookkeepingTask};
use super::fingerprint::fingerprint;
use super::jwt::{TokenKind, TokenPair, TokenSigner};
use crate::error::{AccessError, TokenErrorKind};
use crate::identity::{Identity, IdentityDirectory};
use crate::rbac::{Caller, CallerIdentity};

/// Session lifetimes and limits.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Access credential lifetime
    pub access_ttl: Duration,

    /// Refresh credential (and session record) lifetime
    pub refresh_ttl: Duration,

    /// Maximum concurrently active sessions per identity
    pub max_active_sessions: usize,

    /// How long revoked records are kept before the reaper deletes them
    pub revoked_retention: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
            max_active_sessions: 5,
            revoked_retention: Duration::days(30),
        }
    }
}

/// Credentials handed to the client after issue or rotation.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
    /// Stored record backing the refresh credential
    pub session: SessionToken,
}

impl IssuedSession {
    fn new(pair: TokenPair, session: SessionToken) -> Self {
        Self {
            access_token: pair.access.token,
            refresh_token: pair.refresh.token,
            access_expires_at: pair.access.expires_at,
            refresh_expires_at: pair.refresh.expires_at,
            session,
        }
    }
}

/// Active session as shown to its owner.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SessionView {
    pub session_id: String,
    pub device_label: String,
    pub ip_address: String,
    pub last_used_at: Option<DateTime<Utc>>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// True for the session the listing request was made with
    pub current: bool,
}

impl SessionView {
    fn from_record(record: &SessionToken, current_session: Option<&str>) -> Self {
        Self {
            session_id: record.session_id.clone(),
            device_label: record.client.device_label.clone(),
            ip_address: record.client.ip_address.clone(),
            last_used_at: record.last_used_at,
            issued_at: record.issued_at,
            expires_at: record.expires_at,
            current: current_session == Some(record.session_id.as_str()),
        }
    }
}

/// Issues, rotates, validates and revokes sessions.
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    directory: Arc<dyn IdentityDirectory>,
    signer: TokenSigner,
    config: SessionConfig,
    bookkeeper: Bookkeeper,
}

impl SessionManager {
    /// Creates a session manager.
    ///
    /// # Arguments
    ///
    /// * `store` - Credential store holding session records
    /// * `directory` - Identity directory
    /// * `secret` - Credential signing secret (at least 32 bytes)
    /// * `config` - Lifetimes and limits
    /// * `bookkeeper` - Handle for best-effort last-used/last-login writes
    pub fn new(
        store: Arc<dyn CredentialStore>,
        directory: Arc<dyn IdentityDirectory>,
        secret: &str,
        config: SessionConfig,
        bookkeeper: Bookkeeper,
    ) -> Self {
        let signer = TokenSigner::new(secret, config.access_ttl, config.refresh_ttl);
        Self {
            store,
            directory,
            signer,
            config,
            bookkeeper,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Issues a session for an identity looked up in the directory.
    ///
    /// # Errors
    ///
    /// - `IdentityNotFound` if the identity does not exist
    /// - `AccountDisabled` if the identity is deactivated
    pub async fn issue(
        &self,
        identity_id: &str,
        client: ClientMetadata,
    ) -> Result<IssuedSession, AccessError> {
        let identity = self
            .directory
            .get_by_id(identity_id)
            .await?
            .ok_or(AccessError::IdentityNotFound)?;
        self.issue_for(&identity, client).await
    }

    /// Issues a session for an already loaded identity.
    ///
    /// When the identity is at its session cap, its oldest active sessions
    /// are revoked in the same store transition as the insert.
    pub async fn issue_for(
        &self,
        identity: &Identity,
        client: ClientMetadata,
    ) -> Result<IssuedSession, AccessError> {
        if !identity.is_active {
            return Err(AccessError::AccountDisabled);
        }

        let now = Utc::now();
        let pair = self.signer.issue_pair(identity, now)?;
        let record = self.new_record(identity, &pair, now, client)?;

        let evicted = self
            .store
            .insert(record.clone(), self.config.max_active_sessions, now)
            .await?;
        for old in &evicted {
            info!(
                "Session limit reached for {}, revoked oldest session {}",
                identity.id, old.session_id
            );
        }

        self.bookkeeper.dispatch(BookkeepingTask::RecordLogin {
            identity_id: identity.id.clone(),
            at: now,
        });

        debug!("Issued session {} for {}", record.session_id, identity.id);
        Ok(IssuedSession::new(pair, record))
    }

    /// Exchanges a refresh credential for a new session.
    ///
    /// The old record is revoked and the replacement stored in one store
    /// transition, so a credential can be rotated at most once.
    ///
    /// # Errors
    ///
    /// - `TokenInactive` if the credential is expired, revoked, or lost a
    ///   concurrent rotation
    /// - `InvalidToken` if the credential is malformed, badly signed, or an
    ///   access credential
    /// - `TokenNotFound` if no record matches
    /// - `AccountDisabled` if the identity was deactivated
    pub async fn rotate(
        &self,
        refresh_token: &str,
        client: ClientMetadata,
    ) -> Result<IssuedSession, AccessError> {
        let claims = self.signer.decode(refresh_token).map_err(|kind| match kind {
            TokenErrorKind::Expired => AccessError::TokenInactive,
            other => AccessError::InvalidToken(other),
        })?;
        if claims.kind != TokenKind::Refresh {
            return Err(AccessError::InvalidToken(TokenErrorKind::Malformed));
        }

        let old_fingerprint = fingerprint(refresh_token);
        let record = self
            .store
            .find_by_fingerprint(&old_fingerprint)
            .await?
            .ok_or(AccessError::TokenNotFound)?;

        let now = Utc::now();
        if !record.is_active(now) {
            return Err(AccessError::TokenInactive);
        }
        if record.session_id != claims.jti || record.identity_id != claims.sub {
            warn!("Refresh credential does not match its session record {}", record.session_id);
            return Err(AccessError::InvalidToken(TokenErrorKind::Malformed));
        }

        let identity = self
            .directory
            .get_by_id(&record.identity_id)
            .await?
            .ok_or(AccessError::IdentityNotFound)?;
        if !identity.is_active {
            return Err(AccessError::AccountDisabled);
        }

        let pair = self.signer.issue_pair(&identity, now)?;
        let replacement = self.new_record(&identity, &pair, now, client)?;

        match self.store.rotate(&old_fingerprint, replacement.clone(), now).await? {
            RotateOutcome::Rotated { previous } => {
                debug!(
                    "Rotated session {} into {} for {}",
                    previous.session_id, replacement.session_id, identity.id
                );
                Ok(IssuedSession::new(pair, replacement))
            }
            RotateOutcome::Inactive => Err(AccessError::TokenInactive),
            RotateOutcome::NotFound => Err(AccessError::TokenNotFound),
        }
    }

    /// Revokes one session by fingerprint.
    ///
    /// Idempotent. Returns true if this call revoked the session.
    pub async fn revoke(&self, fingerprint: &str) -> Result<bool, AccessError> {
        match self.store.revoke(fingerprint, Utc::now()).await? {
            RevokeOutcome::Revoked(record) => {
                info!("Revoked session {} for {}", record.session_id, record.identity_id);
                Ok(true)
            }
            RevokeOutcome::AlreadyInactive | RevokeOutcome::NotFound => Ok(false),
        }
    }

    /// Revokes the session behind a refresh credential.
    pub async fn logout(&self, refresh_token: &str) -> Result<bool, AccessError> {
        self.revoke(&fingerprint(refresh_token)).await
    }

    /// Revokes every active session of an identity.
    ///
    /// Idempotent. Returns the number of sessions revoked by this call.
    pub async fn revoke_all(&self, identity_id: &str) -> Result<u64, AccessError> {
        let revoked = self.store.revoke_all(identity_id, Utc::now()).await?;
        if revoked > 0 {
            info!("Revoked {} sessions for {}", revoked, identity_id);
        }
        Ok(revoked)
    }

    /// Revokes one of the caller's own sessions by session id.
    ///
    /// # Errors
    ///
    /// Returns `TokenNotFound` if the session does not exist or belongs to
    /// another identity.
    pub async fn revoke_session(
        &self,
        caller: &CallerIdentity,
        session_id: &str,
    ) -> Result<bool, AccessError> {
        let record = self
            .store
            .find_by_session_id(session_id)
            .await?
            .filter(|record| record.identity_id == caller.id)
            .ok_or(AccessError::TokenNotFound)?;

        self.revoke(&record.fingerprint).await
    }

    /// Lists the active sessions of an identity, most recent first.
    pub async fn list_active(
        &self,
        identity_id: &str,
        current_session: Option<&str>,
    ) -> Result<Vec<SessionView>, AccessError> {
        let now = Utc::now();
        let mut records: Vec<SessionToken> = self
            .store
            .list_for_identity(identity_id)
            .await?
            .into_iter()
            .filter(|record| record.is_active(now))
            .collect();

        records.sort_by(|a, b| {
            b.issued_at
                .cmp(&a.issued_at)
                .then_with(|| b.session_id.cmp(&a.session_id))
        });

        Ok(records
            .iter()
            .map(|record| SessionView::from_record(record, current_session))
            .collect())
    }

    /// Deletes expired records and revoked records past retention.
    pub async fn reap(&self) -> Result<PurgeStats, AccessError> {
        self.reap_at(Utc::now()).await
    }

    /// Same as [`SessionManager::reap`] with an explicit clock.
    pub async fn reap_at(&self, now: DateTime<Utc>) -> Result<PurgeStats, AccessError> {
        let stats = self.store.purge(now, self.config.revoked_retention).await?;
        if stats.total() > 0 {
            info!(
                "Reaped {} session records ({} expired, {} revoked)",
                stats.total(),
                stats.expired_removed,
                stats.revoked_removed
            );
        }
        Ok(stats)
    }

    /// Counts what [`SessionManager::reap_at`] would delete, deleting nothing.
    pub async fn preview_reap_at(&self, now: DateTime<Utc>) -> Result<PurgeStats, AccessError> {
        Ok(self.store.count_purgeable(now, self.config.revoked_retention).await?)
    }

    /// Validates an access credential and resolves its caller.
    ///
    /// # Errors
    ///
    /// - `InvalidToken` if the credential is malformed, expired, badly
    ///   signed, or a refresh credential
    /// - `TokenNotFound` / `TokenInactive` if its session is gone or revoked
    /// - `IdentityNotFound` / `AccountDisabled` if the identity is gone or
    ///   deactivated
    pub async fn authenticate(&self, access_token: &str) -> Result<CallerIdentity, AccessError> {
        let claims = self.signer.decode(access_token).map_err(AccessError::InvalidToken)?;
        if claims.kind != TokenKind::Access {
            return Err(AccessError::InvalidToken(TokenErrorKind::Malformed));
        }

        let record = self
            .store
            .find_by_session_id(&claims.jti)
            .await?
            .ok_or(AccessError::TokenNotFound)?;
        let now = Utc::now();
        if !record.is_active(now) {
            return Err(AccessError::TokenInactive);
        }
        if record.identity_id != claims.sub {
            return Err(AccessError::InvalidToken(TokenErrorKind::Malformed));
        }

        let identity = self
            .directory
            .get_by_id(&record.identity_id)
            .await?
            .ok_or(AccessError::IdentityNotFound)?;
        if !identity.is_active {
            return Err(AccessError::AccountDisabled);
        }

        self.bookkeeper.dispatch(BookkeepingTask::TouchSession {
            fingerprint: record.fingerprint.clone(),
            at: now,
        });

        Ok(CallerIdentity::from_identity(&identity, Some(record.session_id)))
    }

    /// Resolves an optional access credential into a caller.
    ///
    /// No credential means anonymous. A credential that fails validation is
    /// an error, never a silent downgrade to anonymous.
    pub async fn resolve_caller(&self, access_token: Option<&str>) -> Result<Caller, AccessError> {
        match access_token {
            None => Ok(Caller::Anonymous),
            Some(token) => Ok(Caller::Authenticated(self.authenticate(token).await?)),
        }
    }

    fn new_record(
        &self,
        identity: &Identity,
        pair: &TokenPair,
        now: DateTime<Utc>,
        client: ClientMetadata,
    ) -> Result<SessionToken, AccessError> {
        let record = SessionToken::new(
            identity.id.clone(),
            fingerprint(&pair.refresh.token),
            pair.session_id.clone(),
            now,
            pair.refresh.expires_at,
            client,
        )?;
        Ok(record)
    }
}
