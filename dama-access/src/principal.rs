// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::role::Role;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of an individual user, usually the distinguished name of the account.
    UserId
);

string_id!(
    /// Identifier of a group of users.
    GroupId
);

string_id!(
    /// Opaque identifier of a securable resource (a digital object).
    ///
    /// Owned by the external resource-authorization subsystem, treated as an immutable key.
    ResourceId
);

/// A principal which can hold a role on a resource: a single user or a whole group.
///
/// Identity is the pair of kind and ID, a user and a group with the same ID string are different
/// principals.
#[derive(Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub enum Principal {
    User(UserId),
    Group(GroupId),
}

impl Principal {
    /// Return true if this principal is a group.
    pub fn is_group(&self) -> bool {
        match self {
            Principal::User(_) => false,
            Principal::Group(_) => true,
        }
    }

    /// Return true if this principal is an individual user.
    pub fn is_user(&self) -> bool {
        !self.is_group()
    }

    /// Return the user ID if this principal is a user.
    pub fn as_user(&self) -> Option<&UserId> {
        match self {
            Principal::User(id) => Some(id),
            Principal::Group(_) => None,
        }
    }

    /// Return the group ID if this principal is a group.
    pub fn as_group(&self) -> Option<&GroupId> {
        match self {
            Principal::User(_) => None,
            Principal::Group(id) => Some(id),
        }
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Principal::User(id) => write!(f, "user:{}", id),
            Principal::Group(id) => write!(f, "group:{}", id),
        }
    }
}

impl From<UserId> for Principal {
    fn from(value: UserId) -> Self {
        Principal::User(value)
    }
}

impl From<GroupId> for Principal {
    fn from(value: GroupId) -> Self {
        Principal::Group(value)
    }
}

/// A persisted role assignment of a principal on a resource.
///
/// Grants whose principal is a group are called "references".
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
pub struct Grant {
    pub resource: ResourceId,
    pub principal: Principal,
    pub role: Role,
}

impl Grant {
    pub fn new(resource: ResourceId, principal: impl Into<Principal>, role: Role) -> Self {
        Self {
            resource,
            principal: principal.into(),
            role,
        }
    }

    /// Return true if this grant is a group reference.
    pub fn is_reference(&self) -> bool {
        self.principal.is_group()
    }
}

#[cfg(test)]
mod tests {
    use crate::Role;

    use super::{Grant, GroupId, Principal, ResourceId, UserId};

    #[test]
    fn identity_includes_kind() {
        let user = Principal::User(UserId::new("staff"));
        let group = Principal::Group(GroupId::new("staff"));

        assert_ne!(user, group);
        assert!(user.is_user());
        assert!(group.is_group());
        assert_eq!(user.as_user(), Some(&UserId::new("staff")));
        assert_eq!(user.as_group(), None);
        assert_eq!(group.to_string(), "group:staff");
    }

    #[test]
    fn references_are_group_grants() {
        let resource = ResourceId::new("object-1");
        let grant = Grant::new(resource.clone(), UserId::new("alice"), Role::Manager);
        let reference = Grant::new(resource, GroupId::new("USERS"), Role::Guest);

        assert!(!grant.is_reference());
        assert!(reference.is_reference());
    }
}
