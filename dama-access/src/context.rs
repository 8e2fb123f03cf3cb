// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::config::Config;
use crate::principal::{GroupId, UserId};
use crate::role::Role;

const SYSTEM_USER_ID: &str = "SYSTEM";

/// The acting context handed to every store call.
///
/// A context names the acting user, the group the user acts in and the maximum role the user
/// may exercise in that group ("role restriction"). The system context is unrestricted and is
/// what the core uses for its own store calls after it checked eligibility itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationContext {
    user: UserId,
    group: GroupId,
    role: Role,
    // Reserved internal flag, only set through `system()`.
    system: bool,
}

impl AuthorizationContext {
    pub fn new(user: UserId, group: GroupId, role: Role) -> Self {
        Self {
            user,
            group,
            role,
            system: false,
        }
    }

    /// Unrestricted context used by the core itself.
    pub fn system() -> Self {
        Self {
            user: UserId::new(SYSTEM_USER_ID),
            group: GroupId::new(crate::config::USERS_GROUP_ID),
            role: Role::Administrator,
            system: true,
        }
    }

    /// Context of a viewer who is not logged in: allowed to read, never to write.
    pub fn guest(config: &Config) -> Self {
        Self::new(
            config.guest_user().clone(),
            config.users_group().clone(),
            Role::Guest,
        )
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn group(&self) -> &GroupId {
        &self.group
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_system(&self) -> bool {
        self.system
    }

    /// Returns `true` for the system context and for contexts restricted to the administrator
    /// role. Administrators are eligible for every action.
    pub fn is_administrator(&self) -> bool {
        self.system || self.role.is_administrator()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Config, GroupId, Role, UserId};

    use super::AuthorizationContext;

    #[test]
    fn guest_context_uses_configured_identities() {
        let config = Config::default().with_guest_user(UserId::new("anonymous"));
        let ctx = AuthorizationContext::guest(&config);

        assert_eq!(ctx.user(), &UserId::new("anonymous"));
        assert_eq!(ctx.group(), &GroupId::new("USERS"));
        assert_eq!(ctx.role(), Role::Guest);
        assert!(!ctx.is_system());
        assert!(!ctx.is_administrator());
    }

    #[test]
    fn administrators() {
        assert!(AuthorizationContext::system().is_administrator());

        let admin = AuthorizationContext::new(
            UserId::new("root"),
            GroupId::new("USERS"),
            Role::Administrator,
        );
        assert!(admin.is_administrator());
        assert!(!admin.is_system());

        let manager =
            AuthorizationContext::new(UserId::new("carol"), GroupId::new("USERS"), Role::Manager);
        assert!(!manager.is_administrator());
    }
}
