// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashSet;

use crate::error::StoreError;
use crate::principal::{GroupId, UserId};
use crate::role::Role;

/// Interface for querying group membership.
///
/// Membership is managed elsewhere, the access core only reads it.
pub trait GroupMembership {
    /// Returns all groups the user is a member of.
    fn groups_of(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Result<HashSet<GroupId>, StoreError>>;

    /// Returns the maximum role the user may exercise in the group, `None` if the user is not a
    /// member.
    fn membership_role(
        &self,
        group: &GroupId,
        user: &UserId,
    ) -> impl Future<Output = Result<Option<Role>, StoreError>>;
}
