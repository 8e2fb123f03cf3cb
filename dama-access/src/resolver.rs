// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::action::Action;
use crate::config::Config;
use crate::context::AuthorizationContext;
use crate::error::{LookupError, StoreError};
use crate::principal::{Principal, ResourceId, UserId};
use crate::role::Role;
use crate::traits::{GrantStore, GroupMembership};

/// Computes the effective role a principal holds on a resource.
///
/// The effective role is the maximum of the principal's direct grant and, for users, the
/// references of every group the user belongs to. Nothing is cached, every call reads the store.
#[derive(Clone, Debug)]
pub struct RoleResolver<S, M> {
    store: S,
    membership: M,
    config: Config,
}

impl<S, M> RoleResolver<S, M>
where
    S: GrantStore,
    M: GroupMembership,
{
    pub fn new(store: S, membership: M, config: Config) -> Self {
        Self {
            store,
            membership,
            config,
        }
    }

    /// Returns the maximum role the principal holds on the resource, `GUEST` if there is no
    /// matching grant.
    ///
    /// Fails if the resource does not exist or the context may not query it. Callers must then
    /// treat the principal as `GUEST`, see [`RoleResolver::effective_role_or_guest`].
    pub async fn resolve_effective_role(
        &self,
        resource: &ResourceId,
        principal: &Principal,
        ctx: &AuthorizationContext,
    ) -> Result<Role, LookupError> {
        let lookup_failed = |source: StoreError| LookupError::AuthorizationLookupFailed {
            resource: resource.clone(),
            principal: principal.clone(),
            source,
        };

        let role = match principal {
            Principal::User(user) => {
                let direct = self
                    .store
                    .grant_role(ctx, resource, user)
                    .await
                    .map_err(lookup_failed)?;
                let references = self
                    .store
                    .list_references(ctx, resource)
                    .await
                    .map_err(lookup_failed)?;

                // Unknown users are ordinary viewers without any group.
                let groups = match self.membership.groups_of(user).await {
                    Ok(groups) => groups,
                    Err(StoreError::PrincipalNotFound(_)) => HashSet::new(),
                    Err(err) => return Err(lookup_failed(err)),
                };

                let inherited = references
                    .iter()
                    .filter(|(group, _)| groups.contains(group))
                    .map(|(_, role)| *role)
                    .max();

                direct.into_iter().chain(inherited).max()
            }
            Principal::Group(group) => self
                .store
                .list_references(ctx, resource)
                .await
                .map_err(lookup_failed)?
                .into_iter()
                .filter(|(referenced, _)| referenced == group)
                .map(|(_, role)| role)
                .max(),
        };

        let role = role.unwrap_or(Role::Guest);
        debug!(%resource, %principal, %role, "resolved effective role");
        Ok(role)
    }

    /// Like `resolve_effective_role` but falls back to `GUEST` when the lookup fails.
    pub async fn effective_role_or_guest(
        &self,
        resource: &ResourceId,
        principal: &Principal,
        ctx: &AuthorizationContext,
    ) -> Role {
        match self.resolve_effective_role(resource, principal, ctx).await {
            Ok(role) => role,
            Err(err) => {
                warn!(%err, "continuing with GUEST role");
                Role::Guest
            }
        }
    }

    /// Returns `true` if the viewer behind the context may perform the action on the resource.
    ///
    /// Administrators are always eligible. Everybody else needs an effective role of at least
    /// the action's required role, which is looked up with the system context.
    pub async fn is_eligible(
        &self,
        resource: &ResourceId,
        viewer: &AuthorizationContext,
        action: Action,
    ) -> bool {
        if viewer.is_administrator() {
            return true;
        }

        let role = self
            .effective_role_or_guest(
                resource,
                &Principal::User(viewer.user().clone()),
                &AuthorizationContext::system(),
            )
            .await;
        action.is_permitted(role)
    }

    /// Builds the authorization context of a viewer.
    ///
    /// Without a logged-in user, or when the user's role in the users group can not be
    /// determined, the guest context is returned.
    pub async fn context_for(&self, user: Option<&UserId>) -> AuthorizationContext {
        let Some(user) = user else {
            return AuthorizationContext::guest(&self.config);
        };

        let users_group = self.config.users_group();
        match self.membership.membership_role(users_group, user).await {
            Ok(Some(role)) => AuthorizationContext::new(user.clone(), users_group.clone(), role),
            Ok(None) => {
                warn!(%user, group = %users_group, "user is not a member, using guest context");
                AuthorizationContext::guest(&self.config)
            }
            Err(err) => {
                warn!(%user, %err, "failed to get authorization context, using guest context");
                AuthorizationContext::guest(&self.config)
            }
        }
    }
}
