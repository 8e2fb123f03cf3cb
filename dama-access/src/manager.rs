// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashSet;

use tracing::debug;

use crate::action::Action;
use crate::bootstrap::IngestPermissionBootstrapper;
use crate::config::Config;
use crate::context::AuthorizationContext;
use crate::error::{BootstrapError, LookupError, ReconcileError, ShareError};
use crate::principal::{Principal, ResourceId, UserId};
use crate::reconciler::{GrantReconciler, ReconcileOutcome};
use crate::resolver::RoleResolver;
use crate::role::Role;
use crate::traits::{GrantStore, GroupMembership};

/// Entry point for the user interface and the ingest pipeline.
///
/// Bundles role resolution, sharing and the post-ingest permission handover over one grant
/// store and group directory. Store calls made on behalf of a viewer run with the system context
/// once the viewer was found eligible.
///
/// One instance per repository is enough, all methods take `&self`.
#[derive(Clone, Debug)]
pub struct AccessManager<S, M> {
    resolver: RoleResolver<S, M>,
    reconciler: GrantReconciler<S>,
    bootstrapper: IngestPermissionBootstrapper<S>,
}

impl<S, M> AccessManager<S, M>
where
    S: GrantStore + Clone,
    M: GroupMembership,
{
    pub fn new(store: S, membership: M, config: Config) -> Self {
        Self {
            resolver: RoleResolver::new(store.clone(), membership, config.clone()),
            reconciler: GrantReconciler::with_config(store.clone(), &config),
            bootstrapper: IngestPermissionBootstrapper::new(store, config),
        }
    }

    pub async fn effective_role(
        &self,
        resource: &ResourceId,
        principal: &Principal,
        ctx: &AuthorizationContext,
    ) -> Result<Role, LookupError> {
        self.resolver
            .resolve_effective_role(resource, principal, ctx)
            .await
    }

    pub async fn is_eligible(
        &self,
        resource: &ResourceId,
        viewer: &AuthorizationContext,
        action: Action,
    ) -> bool {
        self.resolver.is_eligible(resource, viewer, action).await
    }

    pub async fn context_for(&self, user: Option<&UserId>) -> AuthorizationContext {
        self.resolver.context_for(user).await
    }

    /// Users preselected in the sharing dialog of the resource.
    pub async fn sharing_selection(
        &self,
        resource: &ResourceId,
    ) -> Result<HashSet<UserId>, ReconcileError> {
        self.reconciler
            .current_selection(resource, &AuthorizationContext::system())
            .await
    }

    /// Applies a sharing selection submitted by the viewer behind `ctx`.
    ///
    /// The viewer needs the manager role on the resource or an administrator context.
    pub async fn share(
        &self,
        resource: &ResourceId,
        desired: &HashSet<UserId>,
        ctx: &AuthorizationContext,
    ) -> Result<ReconcileOutcome, ShareError> {
        let system = AuthorizationContext::system();

        if !ctx.is_administrator() {
            let role = self
                .resolver
                .effective_role_or_guest(resource, &Principal::User(ctx.user().clone()), &system)
                .await;
            if !Action::Share.is_permitted(role) {
                debug!(%resource, user = %ctx.user(), %role, "viewer may not share");
                return Err(ShareError::NotEligible {
                    resource: resource.clone(),
                    role,
                });
            }
        }

        Ok(self.reconciler.reconcile(resource, desired, &system).await?)
    }

    /// Hands the permissions of a freshly ingested resource over to its uploader.
    pub async fn ingest_completed(
        &self,
        resource: &ResourceId,
        owner: &UserId,
    ) -> Result<(), BootstrapError> {
        self.bootstrapper
            .bootstrap_default(resource, owner, &AuthorizationContext::system())
            .await
    }
}
