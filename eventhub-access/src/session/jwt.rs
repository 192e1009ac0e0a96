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


//! Signed credential generation and validation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AccessError, TokenErrorKind};
use crate::identity::Identity;
use crate::rbac::Role;

/// Which half of a session a credential is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived, presented on every request
    Access,
    /// Long-lived, presented only to rotate
    Refresh,
}

/// Signed credential claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (identity ID)
    pub sub: String,

    /// Email at issue time
    pub email: String,

    /// Role at issue time (informational, the directory is authoritative)
    pub role: Role,

    /// Access or refresh
    pub kind: TokenKind,

    /// Session correlation id shared by both credentials of a pair
    pub jti: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// A signed credential and its expiry.
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Access and refresh credentials minted together.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: SignedToken,
    pub refresh: SignedToken,
    pub session_id: String,
}

/// HS256 signer for session credentials.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenSigner {
    /// Creates a signer.
    ///
    /// `secret` should be at least 32 bytes.
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Mints an access/refresh pair sharing a fresh session id.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::TokenGenerationFailed` if signing fails.
    pub fn issue_pair(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, AccessError> {
        let session_id = Uuid::new_v4().to_string();
        let access = self.sign(identity, &session_id, TokenKind::Access, now, self.access_ttl)?;
        let refresh = self.sign(identity, &session_id, TokenKind::Refresh, now, self.refresh_ttl)?;

        Ok(TokenPair {
            access,
            refresh,
            session_id,
        })
    }

    fn sign(
        &self,
        identity: &Identity,
        session_id: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
        lifetime: Duration,
    ) -> Result<SignedToken, AccessError> {
        let expires_at = now + lifetime;
        let claims = Claims {
            sub: identity.id.clone(),
            email: identity.email.clone(),
            role: identity.role,
            kind,
            jti: session_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| AccessError::TokenGenerationFailed)?;

        Ok(SignedToken { token, expires_at })
    }

    /// Validates the signature and expiry of a credential and returns its claims.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenErrorKind> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenErrorKind::Expired,
                ErrorKind::InvalidSignature => TokenErrorKind::SignatureInvalid,
                _ => TokenErrorKind::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_key_at_least_32_bytes";

    fn signer() -> TokenSigner {
        TokenSigner::new(SECRET, Duration::minutes(15), Duration::days(7))
    }

    fn identity() -> Identity {
        Identity::new("ana@example.com", "Ana", "hash", Role::Organizer)
    }

    #[test]
    fn test_pair_shares_session_id() {
        let identity = identity();
        let pair = signer().issue_pair(&identity, Utc::now()).unwrap();

        let access = signer().decode(&pair.access.token).unwrap();
        let refresh = signer().decode(&pair.refresh.token).unwrap();

        assert_eq!(access.kind, TokenKind::Access);
        assert_eq!(refresh.kind, TokenKind::Refresh);
        assert_eq!(access.jti, pair.session_id);
        assert_eq!(refresh.jti, pair.session_id);
        assert_eq!(access.sub, identity.id);
        assert_eq!(access.role, Role::Organizer);
        assert_ne!(pair.access.token, pair.refresh.token);
    }

    #[test]
    fn test_expiry_follows_lifetimes() {
        let now = Utc::now();
        let pair = signer().issue_pair(&identity(), now).unwrap();
        assert_eq!(pair.access.expires_at, now + Duration::minutes(15));
        assert_eq!(pair.refresh.expires_at, now + Duration::days(7));

        let claims = signer().decode(&pair.refresh.token).unwrap();
        assert_eq!(claims.exp, pair.refresh.expires_at.timestamp());
    }

    #[test]
    fn test_expired_token() {
        let issued = Utc::now() - Duration::hours(1);
        let pair = signer().issue_pair(&identity(), issued).unwrap();
        assert_eq!(signer().decode(&pair.access.token), Err(TokenErrorKind::Expired));
        assert!(signer().decode(&pair.refresh.token).is_ok());
    }

    #[test]
    fn test_wrong_secret() {
        let pair = signer().issue_pair(&identity(), Utc::now()).unwrap();
        let other = TokenSigner::new(
            "another_secret_key_at_least_32_bytes",
            Duration::minutes(15),
            Duration::days(7),
        );
        assert_eq!(other.decode(&pair.access.token), Err(TokenErrorKind::SignatureInvalid));
    }

    #[test]
    fn test_malformed_token() {
        assert_eq!(signer().decode("invalid_token"), Err(TokenErrorKind::Malformed));
        assert_eq!(signer().decode(""), Err(TokenErrorKind::Malformed));
    }
}
