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

//! Access error types.

use std::fmt;

use eventhub_core::StoreError;
use thiserror::Error;

use crate::rbac::DenialReason;

/// Why a signed credential failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenErrorKind {
    /// Not a well-formed credential, or the wrong credential type
    Malformed,
    /// Signature is valid but the credential is past its expiry
    Expired,
    /// Signature does not verify against the server secret
    SignatureInvalid,
}

impl fmt::Display for TokenErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenErrorKind::Malformed => "malformed",
            TokenErrorKind::Expired => "expired",
            TokenErrorKind::SignatureInvalid => "signature invalid",
        };
        f.write_str(text)
    }
}

/// Session and authorization errors.
#[derive(Error, Debug)]
pub enum AccessError {
    /// No caller context was presented
    #[error("Authentication required")]
    Unauthenticated,

    /// Caller lacks the permission for this operation
    #[error("Access denied: {0}")]
    AccessDenied(DenialReason),

    /// No session record matches the presented credential
    #[error("Session token not found")]
    TokenNotFound,

    /// Session record is revoked or expired
    #[error("Session token is revoked or expired")]
    TokenInactive,

    /// Identity is deactivated
    #[error("Account is disabled")]
    AccountDisabled,

    /// Credential failed signature or format checks
    #[error("Invalid token: {0}")]
    InvalidToken(TokenErrorKind),

    /// Unrecognized resource kind or action (a caller bug, not a user error)
    #[error("Unknown resource or action: {0}")]
    UnknownResource(String),

    /// Admin attempted to drop their own admin role
    #[error("Administrators cannot demote their own account")]
    SelfDemotion,

    /// Admin attempted to deactivate their own account
    #[error("Administrators cannot deactivate their own account")]
    SelfDeactivation,

    /// Identity does not exist in the directory
    #[error("Identity not found")]
    IdentityNotFound,

    /// Email or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Resource does not exist (or its existence is concealed from the caller)
    #[error("Resource not found")]
    NotFound,

    /// Signing a credential failed
    #[error("Token generation failed")]
    TokenGenerationFailed,

    /// Password hashing operation failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Password hash format is invalid
    #[error("Invalid password hash format")]
    InvalidHash,

    /// Data-access collaborator failed
    #[error("Repository error: {0}")]
    Repository(String),

    /// Identity directory collaborator failed
    #[error("Directory error: {0}")]
    Directory(String),

    /// Credential store failed
    #[error("Credential store error: {0}")]
    Store(#[from] StoreError),
}

impl AccessError {
    /// Returns true for failures the transport reports as "not authenticated".
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            AccessError::Unauthenticated
                | AccessError::TokenNotFound
                | AccessError::TokenInactive
                | AccessError::AccountDisabled
                | AccessError::InvalidToken(_)
                | AccessError::InvalidCredentials
        )
    }

    /// Returns true for permission denials.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            AccessError::AccessDenied(_)
                | AccessError::SelfDemotion
                | AccessError::SelfDeactivation
        )
    }

    /// Message safe to show outside the process.
    ///
    /// Denial reasons can reveal organizational structure, so denials are
    /// collapsed to a generic text. `Display` keeps the structured reason
    /// for logs.
    pub fn outward_message(&self) -> String {
        if self.is_denial() {
            "not authorized".to_string()
        } else if self.is_auth_failure() {
            "not authenticated".to_string()
        } else {
            self.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outward_message_redacts_denial_reason() {
        let err = AccessError::AccessDenied(DenialReason::WrongOrganization);
        assert_eq!(err.to_string(), "Access denied: wrong organization");
        assert_eq!(err.outward_message(), "not authorized");
    }

    #[test]
    fn test_auth_failures() {
        assert!(AccessError::TokenInactive.is_auth_failure());
        assert!(AccessError::InvalidToken(TokenErrorKind::Expired).is_auth_failure());
        assert!(!AccessError::NotFound.is_auth_failure());
        assert_eq!(AccessError::TokenNotFound.outward_message(), "not authenticated");
    }
}
