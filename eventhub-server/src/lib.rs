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


//! EventHub Server - access runtime wiring.
//!
//! Loads configuration, opens the credential store and runs the session
//! reaper and bookkeeping workers around the access crate.

pub mod app;
pub mod config;
pub mod reaper;

pub use app::App;
pub use config::Config;
