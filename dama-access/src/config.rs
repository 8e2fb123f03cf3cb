// SPDX-License-Identifier: MIT OR Apache-2.0

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::principal::{GroupId, UserId};
use crate::role::Role;

/// Identifier of the repository-wide default membership group.
pub const USERS_GROUP_ID: &str = "USERS";

/// Identifier of the anonymous viewer.
pub const GUEST_USER_ID: &str = "GUEST";

/// Configuration for the access core.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Default membership group every user of the repository belongs to.
    ///
    /// Newly ingested objects become readable for this group.
    pub(crate) users_group: GroupId,

    /// Identity used for viewers who are not logged in.
    pub(crate) guest_user: UserId,

    /// Role of the public read reference installed after ingest.
    pub(crate) public_role: Role,

    /// Run reconciliations of the same resource one after another instead of letting them race.
    pub(crate) serialize_reconciliations: bool,
}

impl Config {
    pub fn new() -> Self {
        Self {
            users_group: GroupId::new(USERS_GROUP_ID),
            guest_user: UserId::new(GUEST_USER_ID),
            public_role: Role::Guest,
            serialize_reconciliations: false,
        }
    }

    pub fn with_users_group(mut self, group: GroupId) -> Self {
        self.users_group = group;
        self
    }

    pub fn with_guest_user(mut self, user: UserId) -> Self {
        self.guest_user = user;
        self
    }

    pub fn with_public_role(mut self, role: Role) -> Self {
        self.public_role = role;
        self
    }

    pub fn with_serialized_reconciliations(mut self, enabled: bool) -> Self {
        self.serialize_reconciliations = enabled;
        self
    }

    pub fn users_group(&self) -> &GroupId {
        &self.users_group
    }

    pub fn guest_user(&self) -> &UserId {
        &self.guest_user
    }

    pub fn public_role(&self) -> Role {
        self.public_role
    }

    pub fn serialize_reconciliations(&self) -> bool {
        self.serialize_reconciliations
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
