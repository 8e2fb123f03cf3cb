// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The four roles a principal can hold on a resource. Greater roles are assumed to also contain
/// all lower ones.
///
/// GUEST < MEMBER < MANAGER < ADMINISTRATOR
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Role {
    /// Permission to read a published object.
    #[default]
    Guest,

    /// Permission to edit an object's metadata and mark it as favorite.
    Member,

    /// Permission to change who an object is shared with. Holders of this role are the owners
    /// of a resource.
    Manager,

    /// System-wide super role.
    ///
    /// Always eligible for every action but never granted or revoked on a single resource.
    Administrator,
}

impl Role {
    /// All roles in ascending order.
    pub const ALL: [Role; 4] = [
        Role::Guest,
        Role::Member,
        Role::Manager,
        Role::Administrator,
    ];

    /// Returns `true` if this role is equal to or greater than the `required` role.
    pub fn at_least(&self, required: Role) -> bool {
        *self >= required
    }

    /// Returns `true` if this role may be the subject of a resource grant.
    pub fn is_grantable(&self) -> bool {
        !matches!(self, Role::Administrator)
    }

    /// Role is Guest.
    pub fn is_guest(&self) -> bool {
        matches!(self, Role::Guest)
    }

    /// Role is Member.
    pub fn is_member(&self) -> bool {
        matches!(self, Role::Member)
    }

    /// Role is Manager.
    pub fn is_manager(&self) -> bool {
        matches!(self, Role::Manager)
    }

    /// Role is Administrator.
    pub fn is_administrator(&self) -> bool {
        matches!(self, Role::Administrator)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Guest => "GUEST",
            Role::Member => "MEMBER",
            Role::Manager => "MANAGER",
            Role::Administrator => "ADMINISTRATOR",
        };

        write!(f, "{}", s)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role \"{0}\"")]
pub struct RoleParseError(String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GUEST" => Ok(Role::Guest),
            "MEMBER" => Ok(Role::Member),
            "MANAGER" => Ok(Role::Manager),
            "ADMINISTRATOR" => Ok(Role::Administrator),
            _ => Err(RoleParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Role, RoleParseError};

    #[test]
    fn total_order() {
        assert!(Role::Guest < Role::Member);
        assert!(Role::Member < Role::Manager);
        assert!(Role::Manager < Role::Administrator);

        let mut shuffled = vec![
            Role::Manager,
            Role::Guest,
            Role::Administrator,
            Role::Member,
        ];
        shuffled.sort();
        assert_eq!(shuffled, Role::ALL.to_vec());
    }

    #[test]
    fn at_least_compares_positions() {
        for (i, candidate) in Role::ALL.iter().enumerate() {
            for (j, required) in Role::ALL.iter().enumerate() {
                assert_eq!(candidate.at_least(*required), i >= j);
            }
        }

        // Holding the owner role includes the member role but not the other way around.
        assert!(Role::Manager.at_least(Role::Member));
        assert!(!Role::Member.at_least(Role::Manager));
    }

    #[test]
    fn role_predicates() {
        assert!(Role::default().is_guest());
        assert!(Role::Member.is_member());
        assert!(Role::Manager.is_manager());
        assert!(Role::Administrator.is_administrator());
        assert!(!Role::Manager.is_member());
        assert!(!Role::Member.is_guest());
    }

    #[test]
    fn administrator_is_never_grantable() {
        assert!(Role::Guest.is_grantable());
        assert!(Role::Member.is_grantable());
        assert!(Role::Manager.is_grantable());
        assert!(!Role::Administrator.is_grantable());
    }

    #[test]
    fn display_and_parse() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }

        assert_eq!("manager".parse::<Role>(), Ok(Role::Manager));
        assert_eq!(" Guest ".parse::<Role>(), Ok(Role::Guest));
        assert_eq!(
            "CURATOR".parse::<Role>(),
            Err(RoleParseError("CURATOR".to_string()))
        );
    }
}
