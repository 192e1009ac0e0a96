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


//! Access gateway.
//!
//! Wraps a data-access collaborator so that every read, list and mutation
//! passes the permission resolver first.

use async_trait::async_trait;
use tracing::debug;

use super::filter::QueryOptions;
use super::policy::{apply_security_filters, policy_for};
use crate::error::AccessError;
use crate::rbac::{check, Action, Caller, ResourceKind, ResourceTarget};

/// Data-access collaborator for one resource kind.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Kind of resource this repository serves
    const KIND: ResourceKind;

    type Record: Send + Sync;
    type Payload: Send + Sync;

    async fn find(&self, id: &str) -> Result<Option<Self::Record>, AccessError>;

    async fn list(&self, query: &QueryOptions) -> Result<Vec<Self::Record>, AccessError>;

    async fn create(&self, payload: Self::Payload) -> Result<Self::Record, AccessError>;

    async fn update(&self, id: &str, payload: Self::Payload) -> Result<Self::Record, AccessError>;

    async fn delete(&self, id: &str) -> Result<(), AccessError>;

    /// Ownership and visibility of a stored record.
    fn target_of(&self, record: &Self::Record) -> ResourceTarget;

    /// Ownership a payload would give the record, `None` if it sets none.
    fn payload_target(&self, payload: &Self::Payload) -> Option<ResourceTarget>;
}

/// Permission-checked front of a [`ResourceRepository`].
pub struct AccessGateway<R> {
    repository: R,
}

impl<R: ResourceRepository> AccessGateway<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Loads one record the caller may read.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the record does not exist, if the read is denied on a
    ///   kind that conceals existence, or if an anonymous caller asks for a
    ///   non-public instance of a publicly readable kind
    /// - `Unauthenticated` for anonymous callers on other kinds
    /// - `AccessDenied` otherwise
    pub async fn get(&self, id: &str, caller: &Caller) -> Result<R::Record, AccessError> {
        let policy = policy_for(R::KIND);
        if matches!(caller, Caller::Anonymous) && !policy.is_publicly_readable() {
            return Err(AccessError::Unauthenticated);
        }

        let record = self.repository.find(id).await?.ok_or(AccessError::NotFound)?;

        match self.check_read(caller, &record) {
            Ok(()) => Ok(record),
            Err(err) if err.is_denial() && policy.conceal_existence => {
                debug!("Concealed {} {}: {}", R::KIND, id, err);
                Err(AccessError::NotFound)
            }
            // Anonymous callers only ever see public instances of these kinds
            Err(AccessError::Unauthenticated) => {
                debug!("Concealed non-public {} {} from anonymous caller", R::KIND, id);
                Err(AccessError::NotFound)
            }
            Err(err) => Err(err),
        }
    }

    /// Lists the records matching `query` that the caller may see.
    pub async fn list(
        &self,
        mut query: QueryOptions,
        caller: &Caller,
    ) -> Result<Vec<R::Record>, AccessError> {
        apply_security_filters(&mut query, caller, R::KIND);
        self.repository.list(&query).await
    }

    pub async fn create(
        &self,
        payload: R::Payload,
        caller: &Caller,
    ) -> Result<R::Record, AccessError> {
        self.check_create(caller, &payload)?;
        self.repository.create(payload).await
    }

    /// Updates a record after checking read and update access.
    ///
    /// A payload that reassigns ownership is also checked against the new owner.
    pub async fn update(
        &self,
        id: &str,
        payload: R::Payload,
        caller: &Caller,
    ) -> Result<R::Record, AccessError> {
        let existing = self.get(id, caller).await?;
        self.check_update(caller, &existing)?;
        if let Some(target) = self.repository.payload_target(&payload) {
            self.decide(caller, Action::Update, &target)?;
        }
        self.repository.update(id, payload).await
    }

    pub async fn delete(&self, id: &str, caller: &Caller) -> Result<(), AccessError> {
        let existing = self.get(id, caller).await?;
        self.check_delete(caller, &existing)?;
        self.repository.delete(id).await
    }

    pub fn check_read(&self, caller: &Caller, record: &R::Record) -> Result<(), AccessError> {
        self.decide(caller, Action::Read, &self.repository.target_of(record))
    }

    /// Checks creation against the ownership the payload would set.
    /// A payload without ownership is treated as owned by nobody.
    pub fn check_create(&self, caller: &Caller, payload: &R::Payload) -> Result<(), AccessError> {
        let target = self.repository.payload_target(payload).unwrap_or_default();
        self.decide(caller, Action::Create, &target)
    }

    pub fn check_update(&self, caller: &Caller, record: &R::Record) -> Result<(), AccessError> {
        self.decide(caller, Action::Update, &self.repository.target_of(record))
    }

    pub fn check_delete(&self, caller: &Caller, record: &R::Record) -> Result<(), AccessError> {
        self.decide(caller, Action::Delete, &self.repository.target_of(record))
    }

    /// Checks a kind-specific action such as publish or verify.
    pub fn check_action(
        &self,
        caller: &Caller,
        action: Action,
        record: &R::Record,
    ) -> Result<(), AccessError> {
        self.decide(caller, action, &self.repository.target_of(record))
    }

    fn decide(
        &self,
        caller: &Caller,
        action: Action,
        target: &ResourceTarget,
    ) -> Result<(), AccessError> {
        check(caller, action, R::KIND, target).inspect_err(|err| {
            debug!(
                "Denied {} on {} to {:?}: {}",
                action,
                R::KIND,
                caller.identity().map(|identity| identity.id.as_str()),
                err
            );
        })
    }
}
