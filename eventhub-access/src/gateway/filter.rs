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


//! Query filters.
//!
//! Filters are field/value constraints kept in a map keyed by field name,
//! so a later insert for the same field replaces an earlier one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Map key used for a disjunction spanning several fields.
pub const SCOPE_KEY: &str = "$scope";

/// Constraint on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValue {
    /// Field equals the value
    Eq(Value),
    /// Field equals one of the values
    OneOf(Vec<Value>),
    /// At least one of the (field, constraint) pairs holds
    AnyOf(Vec<(String, FilterValue)>),
}

impl FilterValue {
    pub fn equals(value: impl Into<Value>) -> Self {
        FilterValue::Eq(value.into())
    }

    fn matches<T: Filterable + ?Sized>(&self, field: &str, record: &T) -> bool {
        match self {
            FilterValue::Eq(expected) => record.field(field).as_ref() == Some(expected),
            FilterValue::OneOf(options) => record
                .field(field)
                .is_some_and(|actual| options.contains(&actual)),
            FilterValue::AnyOf(alternatives) => alternatives
                .iter()
                .any(|(name, constraint)| constraint.matches(name, record)),
        }
    }
}

/// Record that exposes its fields to filter evaluation.
pub trait Filterable {
    /// Returns the value of a field, `None` if the record has no such field.
    fn field(&self, name: &str) -> Option<Value>;
}

/// Options passed to a repository list call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub filters: BTreeMap<String, FilterValue>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the filter on `field`.
    pub fn with_filter(mut self, field: impl Into<String>, value: FilterValue) -> Self {
        self.filters.insert(field.into(), value);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true if `record` satisfies every filter.
    pub fn matches<T: Filterable + ?Sized>(&self, record: &T) -> bool {
        self.filters
            .iter()
            .all(|(field, constraint)| constraint.matches(field, record))
    }

    /// Filters and paginates an in-memory collection.
    pub fn apply<'a, T, I>(&self, records: I) -> Vec<&'a T>
    where
        T: Filterable + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        records
            .into_iter()
            .filter(|record| self.matches(*record))
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}
