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


//! Identities: models, the directory collaborator, password hashing and
//! administrative operations.

pub mod admin;
pub mod directory;
pub mod models;
pub mod password;

pub use admin::IdentityAdmin;
pub use directory::{IdentityDirectory, MemoryDirectory};
pub use models::{Identity, IdentityResponse};
pub use password::PasswordHasher;
