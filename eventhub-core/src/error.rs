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

//! Error types for the credential store.

use thiserror::Error;

/// Errors that can occur in the credential store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A record with the same fingerprint already exists.
    #[error("Duplicate session fingerprint")]
    DuplicateFingerprint,

    /// Record violates a structural invariant.
    #[error("Invalid session record: {0}")]
    InvalidRecord(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database operation error.
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
