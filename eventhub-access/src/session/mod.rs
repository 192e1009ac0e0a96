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


//! Session lifecycle.
//!
//! Provides credential signing, refresh fingerprints, the session manager,
//! password login and the bookkeeping worker pool.

pub mod auth;
pub mod bookkeeping;
pub mod fingerprint;
pub mod jwt;
pub mod manager;

pub use auth::AuthService;
pub use bookkeeping::{Bookkeeper, BookkeepingConfig, BookkeepingPool, BookkeepingTask};
pub use fingerprint::fingerprint;
pub use jwt::{Claims, TokenKind, TokenSigner};
pub use manager::{IssuedSession, SessionConfig, SessionManager, SessionView};
