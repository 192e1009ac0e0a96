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


//! EventHub Access - Sessions and Authorization
//!
//! This crate decides who a caller is and what they may do:
//! - Session issue, rotation, revocation and reaping over a credential store
//! - A single role rule table and the pure permission resolver built on it
//! - An access gateway that checks every resource operation and narrows
//!   list queries with security filters

pub mod error;
pub mod gateway;
pub mod identity;
pub mod rbac;
pub mod session;

pub use error::{AccessError, TokenErrorKind};
pub use gateway::{
    apply_security_filters, AccessGateway, FilterValue, Filterable, QueryOptions,
    ResourceRepository,
};
pub use identity::{Identity, IdentityAdmin, IdentityDirectory, MemoryDirectory, PasswordHasher};
pub use rbac::{
    Action, Caller, CallerIdentity, Decision, DenialReason, Permission, ResourceKind,
    ResourceTarget, Role,
};
pub use session::{
    AuthService, Bookkeeper, BookkeepingConfig, BookkeepingPool, IssuedSession, SessionConfig,
    SessionManager, SessionView,
};
