// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure decision function turning a sharing selection into grant and revoke operations.
//!
//! The engine never touches a store. It receives the selection of the sharing dialog together
//! with a snapshot of the current member and manager grants and decides which users need a new
//! member grant, which member grants must be revoked and whether the change may be applied at
//! all.
use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, warn};

use crate::principal::UserId;

/// Policy verdicts which forbid applying a sharing selection.
///
/// These are expected outcomes of user input, not faults. The messages are meant to be shown to
/// the user as a corrective hint.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum Rejection {
    #[error("no user with the manager role would remain, an owner is required")]
    NoOwnerRemains,

    #[error("at least one user must have access")]
    EmptySelectionRejected,
}

/// Grant and revoke operations required to reach a selection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrantDiff {
    /// Users which need a new member grant.
    pub to_add: HashSet<UserId>,

    /// Users whose member grant must be revoked.
    pub to_remove: HashSet<UserId>,

    /// Users listed with a member and a manager grant at the same time.
    ///
    /// Only an inconsistent store reports this. They are treated as managers and never revoked,
    /// callers may want to surface them.
    pub inconsistent: HashSet<UserId>,
}

impl GrantDiff {
    /// Returns `true` if nothing needs to be granted or revoked.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Outcome of [`compute_diff`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffResult {
    /// The selection can be reached by applying the contained operations.
    Applicable(GrantDiff),

    /// The selection violates a policy, nothing may be applied.
    Rejected(Rejection),
}

impl DiffResult {
    pub fn is_applicable(&self) -> bool {
        matches!(self, DiffResult::Applicable(_))
    }

    pub fn diff(&self) -> Option<&GrantDiff> {
        match self {
            DiffResult::Applicable(diff) => Some(diff),
            DiffResult::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            DiffResult::Applicable(_) => None,
            DiffResult::Rejected(rejection) => Some(*rejection),
        }
    }
}

/// Computes the operations needed to go from the current member grants to the `desired`
/// selection.
///
/// Rules:
///
/// 1. Selected users without a grant get a member grant.
/// 2. Members missing in the selection lose their grant.
/// 3. Managers are never revoked and never receive an additional member grant. Ownership only
///    changes through an explicit transfer, not through the sharing selection. Leaving selected
///    managers out of `to_add` keeps the store from refusing a second grant for them, so applying
///    the diff always reaches a state for which the diff is empty.
/// 4. Without any manager the selection is rejected with [`Rejection::NoOwnerRemains`].
/// 5. An empty selection is rejected with [`Rejection::EmptySelectionRejected`].
///
/// Rule 4 is checked before rule 5.
pub fn compute_diff(
    desired: &HashSet<UserId>,
    current_members: &HashSet<UserId>,
    current_managers: &HashSet<UserId>,
) -> DiffResult {
    let inconsistent: HashSet<UserId> = current_members
        .intersection(current_managers)
        .cloned()
        .collect();
    if !inconsistent.is_empty() {
        warn!(
            users = ?inconsistent,
            "users hold member and manager grants at the same time, treating them as managers"
        );
    }

    // Managers stay untouched by this diff, so they are exactly the owners remaining afterwards.
    if current_managers.is_empty() {
        debug!("rejecting selection: no manager remains");
        return DiffResult::Rejected(Rejection::NoOwnerRemains);
    }

    if desired.is_empty() {
        debug!("rejecting selection: empty selection");
        return DiffResult::Rejected(Rejection::EmptySelectionRejected);
    }

    let to_add = desired
        .iter()
        .filter(|user| !current_members.contains(user) && !current_managers.contains(user))
        .cloned()
        .collect();

    let to_remove = current_members
        .iter()
        .filter(|user| !desired.contains(user) && !current_managers.contains(user))
        .cloned()
        .collect();

    DiffResult::Applicable(GrantDiff {
        to_add,
        to_remove,
        inconsistent,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use assert_matches::assert_matches;

    use crate::test_utils::users;

    use super::{DiffResult, GrantDiff, Rejection, compute_diff};

    #[test]
    fn adds_new_and_removes_dropped_members() {
        let result = compute_diff(
            &users(&["bob", "dave"]),
            &users(&["alice", "bob"]),
            &users(&["carol"]),
        );

        assert_eq!(
            result,
            DiffResult::Applicable(GrantDiff {
                to_add: users(&["dave"]),
                to_remove: users(&["alice"]),
                inconsistent: HashSet::new(),
            })
        );
        assert!(result.is_applicable());
    }

    #[test]
    fn rejects_without_owner() {
        let result = compute_diff(&users(&["alice", "bob"]), &users(&["alice"]), &users(&[]));

        assert_eq!(result, DiffResult::Rejected(Rejection::NoOwnerRemains));
        assert!(!result.is_applicable());
        assert!(result.diff().is_none());
    }

    #[test]
    fn rejects_empty_selection() {
        let result = compute_diff(&users(&[]), &users(&["alice", "bob"]), &users(&["carol"]));

        assert_eq!(result.rejection(), Some(Rejection::EmptySelectionRejected));
    }

    #[test]
    fn missing_owner_wins_over_empty_selection() {
        let result = compute_diff(&users(&[]), &users(&["alice"]), &users(&[]));

        assert_eq!(result.rejection(), Some(Rejection::NoOwnerRemains));
    }

    #[test]
    fn managers_are_never_touched() {
        // Carol is deselected but owns the object.
        let result = compute_diff(&users(&["alice"]), &users(&["alice"]), &users(&["carol"]));
        assert_matches!(result, DiffResult::Applicable(diff) if diff.is_empty());

        // Selecting the owner does not add a member grant next to the manager grant.
        let result = compute_diff(
            &users(&["alice", "carol"]),
            &users(&["alice"]),
            &users(&["carol"]),
        );
        assert_matches!(result, DiffResult::Applicable(diff) if diff.is_empty());
    }

    #[test]
    fn inconsistent_users_are_treated_as_managers() {
        let result = compute_diff(
            &users(&["bob"]),
            &users(&["bob", "carol"]),
            &users(&["carol"]),
        );

        let diff = result.diff().expect("selection is applicable");
        assert_eq!(diff.inconsistent, users(&["carol"]));
        assert!(diff.to_remove.is_empty());
        assert!(diff.to_add.is_empty());
    }

    mod proptests {
        use std::collections::HashSet;

        use proptest::prelude::*;

        use crate::UserId;
        use crate::diff::{DiffResult, Rejection, compute_diff};

        /// Small universe so that the generated sets overlap often.
        fn user_set(min: usize) -> impl Strategy<Value = HashSet<UserId>> {
            proptest::collection::hash_set(0u8..8, min..8).prop_map(|ids| {
                ids.into_iter()
                    .map(|id| UserId::new(format!("user-{id}")))
                    .collect()
            })
        }

        proptest! {
            #[test]
            fn applying_a_diff_reaches_a_fixed_point(
                desired in user_set(0),
                members in user_set(0),
                managers in user_set(0),
            ) {
                let DiffResult::Applicable(diff) = compute_diff(&desired, &members, &managers) else {
                    return Ok(());
                };

                let applied: HashSet<UserId> = members
                    .union(&diff.to_add)
                    .filter(|user| !diff.to_remove.contains(*user))
                    .cloned()
                    .collect();

                let DiffResult::Applicable(again) = compute_diff(&desired, &applied, &managers) else {
                    panic!("applied state must still be applicable");
                };
                prop_assert!(again.is_empty());

                // Everybody selected has access afterwards, either as member or as manager.
                for user in &desired {
                    prop_assert!(applied.contains(user) || managers.contains(user));
                }
            }

            #[test]
            fn operations_are_disjoint_and_bounded(
                desired in user_set(0),
                members in user_set(0),
                managers in user_set(0),
            ) {
                if let DiffResult::Applicable(diff) = compute_diff(&desired, &members, &managers) {
                    prop_assert!(diff.to_add.is_disjoint(&diff.to_remove));
                    prop_assert!(diff.to_add.is_subset(&desired));
                    prop_assert!(diff.to_remove.is_subset(&members));
                    prop_assert!(diff.to_remove.is_disjoint(&managers));
                    prop_assert!(diff.to_add.is_disjoint(&members));
                }
            }

            #[test]
            fn no_managers_means_no_owner(
                desired in user_set(0),
                members in user_set(0),
            ) {
                let result = compute_diff(&desired, &members, &HashSet::new());
                prop_assert_eq!(result, DiffResult::Rejected(Rejection::NoOwnerRemains));
            }

            #[test]
            fn empty_selection_is_rejected(
                members in user_set(0),
                managers in user_set(1),
            ) {
                let result = compute_diff(&HashSet::new(), &members, &managers);
                prop_assert_eq!(result, DiffResult::Rejected(Rejection::EmptySelectionRejected));
            }
        }
    }
}
