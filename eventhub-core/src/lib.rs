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

//! EventHub Core - Credential Store
//!
//! This crate holds the server-side state of issued sessions:
//! - Session records and client metadata
//! - The `CredentialStore` trait with its atomic transitions
//! - An in-memory store and a durable redb-backed store

pub mod error;
pub mod store;
pub mod types;

pub use error::StoreError;
pub use store::{
    CredentialStore, MemoryCredentialStore, PurgeStats, RedbCredentialStore, RevokeOutcome,
    RotateOutcome,
};
pub use types::{ClientMetadata, SessionToken};
