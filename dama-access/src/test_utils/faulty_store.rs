// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::context::AuthorizationContext;
use crate::error::StoreError;
use crate::principal::{GroupId, ResourceId, UserId};
use crate::role::Role;
use crate::traits::{GrantStore, GroupMembership};

#[derive(Debug, Default)]
struct Faults {
    reads: Option<StoreError>,
    membership: Option<StoreError>,
    allow_grants: Option<StoreError>,
    create_reference: Option<StoreError>,
    create_grant: HashMap<UserId, StoreError>,
    revoke_grant: HashMap<UserId, StoreError>,
    delete_reference: HashMap<GroupId, StoreError>,
    yielding: bool,
    mutations: usize,
}

/// Grant store wrapper which fails selected operations with a configured error and forwards
/// everything else to the inner store.
///
/// Also counts attempted mutations, failed ones included. With `yield_on_every_call` each store
/// call first yields to the scheduler, so concurrent callers interleave call by call.
#[derive(Clone, Debug)]
pub struct FaultyStore<S> {
    inner: S,
    faults: Arc<Mutex<Faults>>,
}

impl<S> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            faults: Arc::new(Mutex::new(Faults::default())),
        }
    }

    /// Fail all grant and reference reads.
    pub fn fail_reads(&self, error: StoreError) {
        self.faults.lock().unwrap().reads = Some(error);
    }

    /// Fail all group membership lookups.
    pub fn fail_membership(&self, error: StoreError) {
        self.faults.lock().unwrap().membership = Some(error);
    }

    pub fn fail_allow_grants(&self, error: StoreError) {
        self.faults.lock().unwrap().allow_grants = Some(error);
    }

    pub fn fail_create_reference(&self, error: StoreError) {
        self.faults.lock().unwrap().create_reference = Some(error);
    }

    pub fn fail_create_grant(&self, user: &UserId, error: StoreError) {
        self.faults
            .lock()
            .unwrap()
            .create_grant
            .insert(user.clone(), error);
    }

    pub fn fail_revoke_grant(&self, user: &UserId, error: StoreError) {
        self.faults
            .lock()
            .unwrap()
            .revoke_grant
            .insert(user.clone(), error);
    }

    pub fn fail_delete_reference(&self, group: &GroupId, error: StoreError) {
        self.faults
            .lock()
            .unwrap()
            .delete_reference
            .insert(group.clone(), error);
    }

    pub fn yield_on_every_call(&self) {
        self.faults.lock().unwrap().yielding = true;
    }

    /// Number of attempted mutations.
    pub fn mutations(&self) -> usize {
        self.faults.lock().unwrap().mutations
    }

    async fn pause(&self) {
        let yielding = self.faults.lock().unwrap().yielding;
        if yielding {
            tokio::task::yield_now().await;
        }
    }

    async fn read_fault(&self) -> Result<(), StoreError> {
        self.pause().await;
        match &self.faults.lock().unwrap().reads {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn mutation(
        &self,
        select: impl FnOnce(&Faults) -> Option<StoreError>,
    ) -> Result<(), StoreError> {
        self.pause().await;
        let mut faults = self.faults.lock().unwrap();
        faults.mutations += 1;
        match select(&faults) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl<S> GrantStore for FaultyStore<S>
where
    S: GrantStore,
{
    async fn list_grants(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        role: Role,
    ) -> Result<HashSet<UserId>, StoreError> {
        self.read_fault().await?;
        self.inner.list_grants(ctx, resource, role).await
    }

    async fn grant_role(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        user: &UserId,
    ) -> Result<Option<Role>, StoreError> {
        self.read_fault().await?;
        self.inner.grant_role(ctx, resource, user).await
    }

    async fn list_references(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
    ) -> Result<HashSet<(GroupId, Role)>, StoreError> {
        self.read_fault().await?;
        self.inner.list_references(ctx, resource).await
    }

    async fn create_grant(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        user: &UserId,
        role: Role,
    ) -> Result<(), StoreError> {
        self.mutation(|faults| faults.create_grant.get(user).cloned()).await?;
        self.inner.create_grant(ctx, resource, user, role).await
    }

    async fn revoke_grant(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        user: &UserId,
    ) -> Result<(), StoreError> {
        self.mutation(|faults| faults.revoke_grant.get(user).cloned()).await?;
        self.inner.revoke_grant(ctx, resource, user).await
    }

    async fn create_reference(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        group: &GroupId,
        role: Role,
    ) -> Result<(), StoreError> {
        self.mutation(|faults| faults.create_reference.clone()).await?;
        self.inner.create_reference(ctx, resource, group, role).await
    }

    async fn delete_reference(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        group: &GroupId,
    ) -> Result<(), StoreError> {
        self.mutation(|faults| faults.delete_reference.get(group).cloned()).await?;
        self.inner.delete_reference(ctx, resource, group).await
    }

    async fn allow_grants(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        maximum_role: Role,
    ) -> Result<(), StoreError> {
        self.mutation(|faults| faults.allow_grants.clone()).await?;
        self.inner.allow_grants(ctx, resource, maximum_role).await
    }
}

impl<S> GroupMembership for FaultyStore<S>
where
    S: GroupMembership,
{
    async fn groups_of(&self, user: &UserId) -> Result<HashSet<GroupId>, StoreError> {
        self.pause().await;
        if let Some(error) = &self.faults.lock().unwrap().membership {
            return Err(error.clone());
        }
        self.inner.groups_of(user).await
    }

    async fn membership_role(
        &self,
        group: &GroupId,
        user: &UserId,
    ) -> Result<Option<Role>, StoreError> {
        self.pause().await;
        if let Some(error) = &self.faults.lock().unwrap().membership {
            return Err(error.clone());
        }
        self.inner.membership_role(group, user).await
    }
}
