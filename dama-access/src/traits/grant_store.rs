// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashSet;

use crate::context::AuthorizationContext;
use crate::error::StoreError;
use crate::principal::{GroupId, ResourceId, UserId};
use crate::role::Role;

/// Interface for the authoritative store of grants and references.
///
/// Every call receives the acting authorization context, the store decides whether that context
/// is privileged enough. Single calls are expected to be atomic, sequences of calls are not.
pub trait GrantStore {
    /// Returns all users holding exactly the given role through a direct grant on the resource.
    fn list_grants(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        role: Role,
    ) -> impl Future<Output = Result<HashSet<UserId>, StoreError>>;

    /// Returns the role of the direct grant a user holds on the resource, if any.
    fn grant_role(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        user: &UserId,
    ) -> impl Future<Output = Result<Option<Role>, StoreError>>;

    /// Returns all group-level grants ("references") on the resource.
    fn list_references(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
    ) -> impl Future<Output = Result<HashSet<(GroupId, Role)>, StoreError>>;

    /// Grants a role to a user.
    ///
    /// Fails with an "already exists" error if the user holds any grant on the resource.
    fn create_grant(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        user: &UserId,
        role: Role,
    ) -> impl Future<Output = Result<(), StoreError>>;

    /// Revokes the grant of a user.
    ///
    /// Fails with a "not found" error if no such grant exists.
    fn revoke_grant(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        user: &UserId,
    ) -> impl Future<Output = Result<(), StoreError>>;

    /// Grants a role to a whole group.
    fn create_reference(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        group: &GroupId,
        role: Role,
    ) -> impl Future<Output = Result<(), StoreError>>;

    /// Removes the grant of a group.
    fn delete_reference(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        group: &GroupId,
    ) -> impl Future<Output = Result<(), StoreError>>;

    /// Unlocks the resource for grants up to the given role.
    ///
    /// Some stores refuse any grant beyond the creator's before this was called. Calling it
    /// again with the same role has no further effect.
    fn allow_grants(
        &self,
        ctx: &AuthorizationContext,
        resource: &ResourceId,
        maximum_role: Role,
    ) -> impl Future<Output = Result<(), StoreError>>;
}
