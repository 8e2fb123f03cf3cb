// SPDX-License-Identifier: MIT OR Apache-2.0

use tracing::{debug, info};

use crate::config::Config;
use crate::context::AuthorizationContext;
use crate::error::BootstrapError;
use crate::principal::{GroupId, ResourceId, UserId};
use crate::role::Role;
use crate::traits::GrantStore;

/// Hands the permissions of a freshly ingested resource over to its uploader.
///
/// Until ingest completes, a resource is readable by the group which ingested it. Bootstrapping
/// replaces that with a manager grant for the owner and one public read reference for the
/// inheriting group.
///
/// The steps run in order and the first failing step aborts the remaining ones. Running it a
/// second time on the same resource fails on the owner grant, which already exists.
#[derive(Clone, Debug)]
pub struct IngestPermissionBootstrapper<S> {
    store: S,
    config: Config,
}

impl<S> IngestPermissionBootstrapper<S>
where
    S: GrantStore,
{
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    pub async fn bootstrap(
        &self,
        resource: &ResourceId,
        owner: &UserId,
        inheriting_group: &GroupId,
        ctx: &AuthorizationContext,
    ) -> Result<(), BootstrapError> {
        self.store
            .allow_grants(ctx, resource, Role::Manager)
            .await
            .map_err(|source| BootstrapError::AllowGrants {
                resource: resource.clone(),
                source,
            })?;
        debug!(%resource, "allowed grants");

        self.store
            .create_grant(ctx, resource, owner, Role::Manager)
            .await
            .map_err(|source| BootstrapError::OwnerGrant {
                resource: resource.clone(),
                owner: owner.clone(),
                source,
            })?;
        debug!(%resource, %owner, "granted manager role to owner");

        let references = self
            .store
            .list_references(ctx, resource)
            .await
            .map_err(|source| BootstrapError::ListReferences {
                resource: resource.clone(),
                source,
            })?;

        for (group, role) in references {
            self.store
                .delete_reference(ctx, resource, &group)
                .await
                .map_err(|source| BootstrapError::DeleteReference {
                    resource: resource.clone(),
                    group: group.clone(),
                    source,
                })?;
            debug!(%resource, %group, %role, "deleted inherited reference");
        }

        let public_role = self.config.public_role();
        self.store
            .create_reference(ctx, resource, inheriting_group, public_role)
            .await
            .map_err(|source| BootstrapError::PublicReference {
                resource: resource.clone(),
                group: inheriting_group.clone(),
                source,
            })?;
        debug!(
            %resource,
            group = %inheriting_group,
            role = %public_role,
            "installed public reference"
        );

        info!(%resource, %owner, "bootstrapped permissions of ingested resource");
        Ok(())
    }

    /// Bootstraps with the configured users group as inheriting group.
    pub async fn bootstrap_default(
        &self,
        resource: &ResourceId,
        owner: &UserId,
        ctx: &AuthorizationContext,
    ) -> Result<(), BootstrapError> {
        self.bootstrap(resource, owner, self.config.users_group(), ctx)
            .await
    }
}
