// SPDX-License-Identifier: MIT OR Apache-2.0

//! Applies a sharing selection to the grant store.
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::context::AuthorizationContext;
use crate::diff::{DiffResult, GrantDiff, Rejection, compute_diff};
use crate::error::{FailedOperation, GrantOperation, ReconcileError, StoreError};
use crate::principal::{ResourceId, UserId};
use crate::role::Role;
use crate::traits::GrantStore;

/// Result of applying a grant diff.
///
/// Every operation was attempted independently, failed ones are listed per user. Nothing was
/// rolled back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub added: HashSet<UserId>,
    pub add_failed: HashMap<UserId, StoreError>,
    pub removed: HashSet<UserId>,
    pub remove_failed: HashMap<UserId, StoreError>,

    /// Users the store listed as member and manager at the same time, see [`GrantDiff`].
    pub inconsistent: HashSet<UserId>,
}

impl ApplyReport {
    /// Returns `true` if every grant and revoke operation succeeded.
    pub fn is_complete(&self) -> bool {
        self.add_failed.is_empty() && self.remove_failed.is_empty()
    }

    /// All failed operations, grants first.
    pub fn failures(&self) -> Vec<FailedOperation> {
        let grants = self
            .add_failed
            .iter()
            .map(|(user, error)| (user, GrantOperation::Grant, error));
        let revokes = self
            .remove_failed
            .iter()
            .map(|(user, error)| (user, GrantOperation::Revoke, error));

        grants
            .chain(revokes)
            .map(|(user, operation, error)| FailedOperation {
                user: user.clone(),
                operation,
                error: error.clone(),
            })
            .collect()
    }

    /// Turns an incomplete report into [`ReconcileError::PartialApplicationFailure`].
    pub fn check(self, resource: &ResourceId) -> Result<Self, ReconcileError> {
        if self.is_complete() {
            return Ok(self);
        }

        Err(ReconcileError::PartialApplicationFailure {
            resource: resource.clone(),
            failures: self.failures(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The diff was applied, possibly only partially.
    Applied(ApplyReport),

    /// The selection violates a policy and nothing was applied.
    Rejected(Rejection),
}

impl ReconcileOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, ReconcileOutcome::Rejected(_))
    }

    pub fn report(&self) -> Option<&ApplyReport> {
        match self {
            ReconcileOutcome::Applied(report) => Some(report),
            ReconcileOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            ReconcileOutcome::Applied(_) => None,
            ReconcileOutcome::Rejected(rejection) => Some(*rejection),
        }
    }
}

/// One async mutex per resource.
#[derive(Debug, Default)]
struct ResourceLocks {
    locks: Mutex<HashMap<ResourceId, Arc<AsyncMutex<()>>>>,
}

impl ResourceLocks {
    async fn lock(&self, resource: &ResourceId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries only referenced by the table are neither held nor awaited.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(resource.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Brings the member grants of a resource in line with a sharing selection.
///
/// Every call snapshots the current member and manager grants, decides with [`compute_diff`] and
/// applies the resulting operations one by one. Without serialization, concurrent
/// reconciliations of the same resource race and the last write per user wins.
#[derive(Clone, Debug)]
pub struct GrantReconciler<S> {
    store: S,
    locks: Option<Arc<ResourceLocks>>,
}

impl<S> GrantReconciler<S>
where
    S: GrantStore,
{
    pub fn new(store: S) -> Self {
        Self { store, locks: None }
    }

    /// Creates a reconciler which serializes reconciliations per resource if the config asks
    /// for it.
    pub fn with_config(store: S, config: &Config) -> Self {
        let locks = config
            .serialize_reconciliations()
            .then(|| Arc::new(ResourceLocks::default()));
        Self { store, locks }
    }

    /// Users currently holding access to the resource through a member or manager grant.
    ///
    /// This is the preselection of the sharing dialog.
    pub async fn current_selection(
        &self,
        resource: &ResourceId,
        ctx: &AuthorizationContext,
    ) -> Result<HashSet<UserId>, ReconcileError> {
        let (members, managers) = self.snapshot(resource, ctx).await?;
        Ok(members.into_iter().chain(managers).collect())
    }

    pub async fn reconcile(
        &self,
        resource: &ResourceId,
        desired: &HashSet<UserId>,
        ctx: &AuthorizationContext,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let _guard = match &self.locks {
            Some(locks) => Some(locks.lock(resource).await),
            None => None,
        };

        let (members, managers) = self.snapshot(resource, ctx).await?;

        let diff = match compute_diff(desired, &members, &managers) {
            DiffResult::Applicable(diff) => diff,
            DiffResult::Rejected(rejection) => {
                debug!(%resource, %rejection, "sharing selection rejected");
                return Ok(ReconcileOutcome::Rejected(rejection));
            }
        };

        let report = self.apply(resource, diff, ctx).await;
        info!(
            %resource,
            added = report.added.len(),
            removed = report.removed.len(),
            failed = report.add_failed.len() + report.remove_failed.len(),
            "reconciled member grants"
        );

        Ok(ReconcileOutcome::Applied(report))
    }

    async fn snapshot(
        &self,
        resource: &ResourceId,
        ctx: &AuthorizationContext,
    ) -> Result<(HashSet<UserId>, HashSet<UserId>), ReconcileError> {
        let snapshot_failed = |source| ReconcileError::Snapshot {
            resource: resource.clone(),
            source,
        };

        let members = self
            .store
            .list_grants(ctx, resource, Role::Member)
            .await
            .map_err(snapshot_failed)?;
        let managers = self
            .store
            .list_grants(ctx, resource, Role::Manager)
            .await
            .map_err(snapshot_failed)?;

        debug!(
            %resource,
            members = members.len(),
            managers = managers.len(),
            "read current grants"
        );
        Ok((members, managers))
    }

    async fn apply(
        &self,
        resource: &ResourceId,
        diff: GrantDiff,
        ctx: &AuthorizationContext,
    ) -> ApplyReport {
        let mut report = ApplyReport {
            inconsistent: diff.inconsistent,
            ..Default::default()
        };

        for user in diff.to_add {
            match self
                .store
                .create_grant(ctx, resource, &user, Role::Member)
                .await
            {
                Ok(()) => {
                    debug!(%resource, %user, "granted member role");
                    report.added.insert(user);
                }
                Err(err) => {
                    warn!(%resource, %user, %err, "failed to grant member role");
                    report.add_failed.insert(user, err);
                }
            }
        }

        for user in diff.to_remove {
            match self.store.revoke_grant(ctx, resource, &user).await {
                Ok(()) => {
                    debug!(%resource, %user, "revoked member role");
                    report.removed.insert(user);
                }
                Err(err) => {
                    warn!(%resource, %user, %err, "failed to revoke member role");
                    report.remove_failed.insert(user, err);
                }
            }
        }

        report
    }
}
