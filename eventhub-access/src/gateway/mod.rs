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


//! Access gateway: permission-checked resource access and security filters.

pub mod filter;
pub mod guard;
pub mod policy;

pub use filter::{FilterValue, Filterable, QueryOptions, SCOPE_KEY};
pub use guard::{AccessGateway, ResourceRepository};
pub use policy::{apply_security_filters, policy_for, ResourcePolicy};
