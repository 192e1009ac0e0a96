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

//! Role-based access control.
//!
//! Provides the role rule table, the permission resolver and the views
//! derived from it.

pub mod caller;
pub mod models;
pub mod resolver;
pub mod rules;

pub use caller::{Caller, CallerIdentity};
pub use models::{Action, Decision, DenialReason, Permission, ResourceKind, ResourceTarget, Role};
pub use resolver::{capabilities, check, permissions, resolve, validate_role_change};
pub use rules::{rule_for, Rule, Scope, RULES};
