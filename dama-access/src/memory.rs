// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::context::AuthorizationContext;
use crate::error::StoreError;
use crate::principal::{Grant, GroupId, Principal, ResourceId, UserId};
use crate::role::Role;
use crate::traits::{GrantStore, GroupMembership};

#[derive(Debug, Default)]
struct ResourceState {
    grants: HashMap<UserId, Role>,
    references: HashMap<GroupId, Role>,
    /// Highest role which may be granted, `None` until grants got allowed.
    grants_allowed: Option<Role>,
}

#[derive(Debug, Default)]
struct State {
    users: HashSet<UserId>,
    groups: HashMap<GroupId, HashMap<UserId, Role>>,
    resources: HashMap<ResourceId, ResourceState>,
}

/// In-memory grant store and group directory.
///
/// This does not persist data permanently, all changes are lost when the process ends. Use this
/// only in development or test contexts.
///
/// Mutations are permitted for the system context, administrators and users holding a manager
/// grant on the resource. Reads are permitted for every context.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user account.
    pub async fn add_user(&self, user: &UserId) {
        let mut state = self.state.write().await;
        state.users.insert(user.clone());
    }

    /// Registers a group, members are added with `add_group_member`.
    pub async fn add_group(&self, group: &GroupId) {
        let mut state = self.state.write().await;
        state.groups.entry(group.clone()).or_default();
    }

    /// Adds a registered user to a registered group, replacing an earlier membership role.
    pub async fn add_group_member(
        &self,
        group: &GroupId,
        user: &UserId,
        role: Role,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.users.contains(user) {
            return Err(StoreError::PrincipalNotFound(Principal::User(user.clone())));
        }
        let Some(members) = state.groups.get_mut(group) else {
            return Err(StoreError::PrincipalNotFound(Principal::Group(group.clone())));
        };
        members.insert(user.clone(), role);
        Ok(())
    }

    /// Registers a new resource which is readable by the ingesting group, as resources are
    /// before their permissions got handed over.
    pub async fn add_resource(
        &self,
        resource: &ResourceId,
        ingesting_group: &GroupId,
        role: Role,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.groups.contains_key(ingesting_group) {
            return Err(StoreError::PrincipalNotFound(Principal::Group(
                ingesting_group.clone(),
            )));
        }
        if state.resources.contains_key(resource) {
            return Err(StoreError::AlreadyExists {
                resource: resource.clone(),
                principal: Principal::Group(ingesting_group.clone()),
            });
        }
        let mut resource_state = ResourceState::default();
        resource_state
            .references
            .insert(ingesting_group.clone(), role);
        state.resources.insert(resource.clone(), resource_state);
        Ok(())
    }

    /// Returns all direct user grants of a resource.
    pub async fn grants(&self, resource: &ResourceId) -> Result<HashMap<UserId, Role>, StoreError> {
        let state = self.state.read().await;
        Ok(state.resource(resource)?.grants.clone())
    }

    /// Returns all group references of a resource.
    pub async fn references(
        &self,
        resource: &ResourceId,
    ) -> Result<HashMap<GroupId, Role>, StoreError> {
        let state = self.state.read().await;
        Ok(state.resource(resource)?.references.clone())
    }

    /// Returns grants and references of a resource together.
    pub async fn entries(&self, resource: &ResourceId) -> Result<HashSet<Grant>, StoreError> {
        let state = self.state.read().await;
        let resource_state = state.resource(resource)?;
        let grants = resource_state
            .grants
            .iter()
            .map(|(user, role)| Grant::new(resource.clone(), user.clone(), *role));
        let references = resource_state
            .references
            .iter()
            .map(|(group, role)| Grant::new(resource.clone(), group.clone(), *role));
        Ok(grants.chain(references).collect())
    }
}

impl State {
    fn resource(&self, resource: &ResourceId) -> Result<&ResourceState, StoreError> {
        self.resources
            .get(resource)
            .ok_or_else(|| StoreError::ResourceNotFound(resource.clone()))
    }

    /// Returns the resource for mutation after checking that the context may change it.
    fn resource_mut(
        &mut self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
    ) -> Result<&mut ResourceState, StoreError> {
        let resource_state = self
            .resources
            .get_mut(resource)
            .ok_or_else(|| StoreError::ResourceNotFound(resource.clone()))?;

        let is_owner = resource_state
            .grants
            .get(ctx.user())
            .is_some_and(|role| role.at_least(Role::Manager));
        if !ctx.is_administrator() && !is_owner {
            return Err(StoreError::Unauthorized(ctx.user().clone()));
        }

        Ok(resource_state)
    }

    fn check_grantable(
        resource: &ResourceId,
        resource_state: &ResourceState,
        role: Role,
    ) -> Result<(), StoreError> {
        if !role.is_grantable() {
            return Err(StoreError::RoleNotGrantable(role));
        }
        match resource_state.grants_allowed {
            Some(maximum) if role <= maximum => Ok(()),
            _ => Err(StoreError::GrantsNotAllowed {
                resource: resource.clone(),
                role,
            }),
        }
    }
}

impl GrantStore for MemoryStore {
    async fn list_grants(
        &self,
        _ctx: &AuthorizationContext,
        resource: &ResourceId,
        role: Role,
    ) -> Result<HashSet<UserId>, StoreError> {
        let state = self.state.read().await;
        let resource_state = state.resource(resource)?;
        Ok(resource_state
            .grants
            .iter()
            .filter_map(|(user, granted)| {
                if *granted == role {
                    Some(user.clone())
                } else {
                    None
                }
            })
            .collect())
    }

    async fn grant_role(
        &self,
        _ctx: &AuthorizationContext,
        resource: &ResourceId,
        user: &UserId,
    ) -> Result<Option<Role>, StoreError> {
        let state = self.state.read().await;
        Ok(state.resource(resource)?.grants.get(user).copied())
    }

    async fn list_references(
        &self,
        _ctx: &AuthorizationContext,
        resource: &ResourceId,
    ) -> Result<HashSet<(GroupId, Role)>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .resource(resource)?
            .references
            .iter()
            .map(|(group, role)| (group.clone(), *role))
            .collect())
    }

    async fn create_grant(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        user: &UserId,
        role: Role,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.users.contains(user) {
            return Err(StoreError::PrincipalNotFound(Principal::User(user.clone())));
        }
        let resource_state = state.resource_mut(ctx, resource)?;
        State::check_grantable(resource, resource_state, role)?;
        if resource_state.grants.contains_key(user) {
            return Err(StoreError::AlreadyExists {
                resource: resource.clone(),
                principal: Principal::User(user.clone()),
            });
        }
        resource_state.grants.insert(user.clone(), role);
        Ok(())
    }

    async fn revoke_grant(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        user: &UserId,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let resource_state = state.resource_mut(ctx, resource)?;
        match resource_state.grants.remove(user) {
            Some(_) => Ok(()),
            None => Err(StoreError::GrantNotFound {
                resource: resource.clone(),
                user: user.clone(),
            }),
        }
    }

    async fn create_reference(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        group: &GroupId,
        role: Role,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.groups.contains_key(group) {
            return Err(StoreError::PrincipalNotFound(Principal::Group(group.clone())));
        }
        let resource_state = state.resource_mut(ctx, resource)?;
        if !role.is_grantable() {
            return Err(StoreError::RoleNotGrantable(role));
        }
        if resource_state.references.contains_key(group) {
            return Err(StoreError::AlreadyExists {
                resource: resource.clone(),
                principal: Principal::Group(group.clone()),
            });
        }
        resource_state.references.insert(group.clone(), role);
        Ok(())
    }

    async fn delete_reference(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        group: &GroupId,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let resource_state = state.resource_mut(ctx, resource)?;
        match resource_state.references.remove(group) {
            Some(_) => Ok(()),
            None => Err(StoreError::ReferenceNotFound {
                resource: resource.clone(),
                group: group.clone(),
            }),
        }
    }

    async fn allow_grants(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        maximum_role: Role,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let resource_state = state.resource_mut(ctx, resource)?;
        if !maximum_role.is_grantable() {
            return Err(StoreError::RoleNotGrantable(maximum_role));
        }
        resource_state.grants_allowed = Some(maximum_role);
        Ok(())
    }
}

impl GroupMembership for MemoryStore {
    async fn groups_of(&self, user: &UserId) -> Result<HashSet<GroupId>, StoreError> {
        let state = self.state.read().await;
        if !state.users.contains(user) {
            return Err(StoreError::PrincipalNotFound(Principal::User(user.clone())));
        }
        Ok(state
            .groups
            .iter()
            .filter_map(|(group, members)| {
                if members.contains_key(user) {
                    Some(group.clone())
                } else {
                    None
                }
            })
            .collect())
    }

    async fn membership_role(
        &self,
        group: &GroupId,
        user: &UserId,
    ) -> Result<Option<Role>, StoreError> {
        let state = self.state.read().await;
        let Some(members) = state.groups.get(group) else {
            return Err(StoreError::PrincipalNotFound(Principal::Group(group.clone())));
        };
        Ok(members.get(user).copied())
    }
}
