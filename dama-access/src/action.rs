// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;

use crate::role::Role;

/// Privileged actions a viewer can perform on a digital object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Open the object and download its data.
    View,

    /// Change the object's metadata.
    EditMetadata,

    /// Mark or unmark the object as favorite.
    ToggleFavorite,

    /// Change who the object is shared with.
    Share,

    /// Open the administration views.
    Administer,
}

impl Action {
    /// Minimum role required to perform this action.
    pub fn required_role(&self) -> Role {
        match self {
            Action::View => Role::Guest,
            Action::EditMetadata | Action::ToggleFavorite => Role::Member,
            Action::Share => Role::Manager,
            Action::Administer => Role::Administrator,
        }
    }

    /// Returns `true` if the given role is sufficient for this action.
    pub fn is_permitted(&self, role: Role) -> bool {
        role.at_least(self.required_role())
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::View => "view",
            Action::EditMetadata => "edit metadata",
            Action::ToggleFavorite => "toggle favorite",
            Action::Share => "share",
            Action::Administer => "administer",
        };

        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use crate::Role;

    use super::Action;

    #[test]
    fn required_roles() {
        assert!(Action::View.is_permitted(Role::Guest));
        assert!(!Action::EditMetadata.is_permitted(Role::Guest));
        assert!(Action::ToggleFavorite.is_permitted(Role::Member));
        assert!(!Action::Share.is_permitted(Role::Member));
        assert!(Action::Share.is_permitted(Role::Manager));
        assert!(!Action::Administer.is_permitted(Role::Manager));
    }
}
