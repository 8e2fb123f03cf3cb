// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

use crate::principal::{GroupId, Principal, ResourceId, UserId};
use crate::role::Role;

/// Coarse classification of store failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Resource, principal, grant or reference is absent.
    NotFound,

    /// A grant or reference for that principal exists already.
    AlreadyExists,

    /// The acting context lacks the privilege for this operation.
    Unauthorized,

    /// The store itself failed (connection lost, timeout, ..).
    Backend,
}

/// Errors reported by a grant store or group membership lookup.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("resource {0} not found")]
    ResourceNotFound(ResourceId),

    #[error("principal {0} not found")]
    PrincipalNotFound(Principal),

    #[error("no grant for user {user} on resource {resource}")]
    GrantNotFound { resource: ResourceId, user: UserId },

    #[error("no reference for group {group} on resource {resource}")]
    ReferenceNotFound {
        resource: ResourceId,
        group: GroupId,
    },

    #[error("{principal} already holds a role on resource {resource}")]
    AlreadyExists {
        resource: ResourceId,
        principal: Principal,
    },

    #[error("context of user {0} is not authorized for this operation")]
    Unauthorized(UserId),

    #[error("resource {resource} does not allow grants of role {role}")]
    GrantsNotAllowed { resource: ResourceId, role: Role },

    #[error("role {0} can not be granted on a single resource")]
    RoleNotGrantable(Role),

    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::ResourceNotFound(_)
            | StoreError::PrincipalNotFound(_)
            | StoreError::GrantNotFound { .. }
            | StoreError::ReferenceNotFound { .. } => ErrorKind::NotFound,
            StoreError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            StoreError::Unauthorized(_)
            | StoreError::GrantsNotAllowed { .. }
            | StoreError::RoleNotGrantable(_) => ErrorKind::Unauthorized,
            StoreError::Backend(_) => ErrorKind::Backend,
        }
    }
}

/// The effective role of a principal could not be determined.
///
/// Callers must treat the principal as `GUEST`, never escalate on this error.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("failed to look up role of {principal} on resource {resource}: {source}")]
    AuthorizationLookupFailed {
        resource: ResourceId,
        principal: Principal,
        source: StoreError,
    },
}

/// A single grant or revoke operation which failed during a reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedOperation {
    pub user: UserId,
    pub operation: GrantOperation,
    pub error: StoreError,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrantOperation {
    Grant,
    Revoke,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("failed to read current grants of resource {resource}: {source}")]
    Snapshot {
        resource: ResourceId,
        source: StoreError,
    },

    #[error("{} grant operation(s) on resource {resource} failed", .failures.len())]
    PartialApplicationFailure {
        resource: ResourceId,
        failures: Vec<FailedOperation>,
    },
}

/// Fatal error while handing over permissions of a freshly ingested resource.
///
/// Every variant names the step which failed, all remaining steps were skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BootstrapError {
    #[error("failed to allow grants on resource {resource}: {source}")]
    AllowGrants {
        resource: ResourceId,
        source: StoreError,
    },

    #[error("failed to grant ownership of resource {resource} to {owner}: {source}")]
    OwnerGrant {
        resource: ResourceId,
        owner: UserId,
        source: StoreError,
    },

    #[error("failed to list references of resource {resource}: {source}")]
    ListReferences {
        resource: ResourceId,
        source: StoreError,
    },

    #[error("failed to delete reference of group {group} on resource {resource}: {source}")]
    DeleteReference {
        resource: ResourceId,
        group: GroupId,
        source: StoreError,
    },

    #[error("failed to install public reference for group {group} on resource {resource}: {source}")]
    PublicReference {
        resource: ResourceId,
        group: GroupId,
        source: StoreError,
    },
}

impl BootstrapError {
    /// The store error which aborted the bootstrap.
    pub fn store_error(&self) -> &StoreError {
        match self {
            BootstrapError::AllowGrants { source, .. }
            | BootstrapError::OwnerGrant { source, .. }
            | BootstrapError::ListReferences { source, .. }
            | BootstrapError::DeleteReference { source, .. }
            | BootstrapError::PublicReference { source, .. } => source,
        }
    }
}

/// Errors of the sharing entry point of the access manager.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShareError {
    #[error("role {role} is not sufficient to change sharing of resource {resource}")]
    NotEligible { resource: ResourceId, role: Role },

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

#[cfg(test)]
mod tests {
    use crate::{GroupId, Principal, ResourceId, Role, UserId};

    use super::{ErrorKind, StoreError};

    #[test]
    fn store_error_kinds() {
        let resource = ResourceId::new("object-1");

        assert_eq!(
            StoreError::ResourceNotFound(resource.clone()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            StoreError::ReferenceNotFound {
                resource: resource.clone(),
                group: GroupId::new("staff"),
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            StoreError::AlreadyExists {
                resource: resource.clone(),
                principal: Principal::User(UserId::new("alice")),
            }
            .kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(
            StoreError::GrantsNotAllowed {
                resource,
                role: Role::Member,
            }
            .kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            StoreError::Backend("connection reset".into()).kind(),
            ErrorKind::Backend
        );
    }
}
