// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access-grant reconciliation for a digital-object repository.
//!
//! Every resource carries direct user grants and group references, each with one of the ordered
//! [`Role`]s. This crate decides and applies changes to them:
//!
//! - [`RoleResolver`] computes the effective role of a user or group on a resource.
//! - [`compute_diff`] turns a sharing selection into member grants to add and revoke, refusing
//!   selections which would leave a resource without an owner or without any user.
//! - [`GrantReconciler`] snapshots the current grants and applies such a diff best-effort.
//! - [`IngestPermissionBootstrapper`] hands a freshly ingested resource over to its uploader.
//!
//! The grant store and group directory are external collaborators behind the
//! [`traits::GrantStore`] and [`traits::GroupMembership`] traits. [`MemoryStore`] implements both
//! in memory. [`AccessManager`] bundles everything for callers.
mod action;
mod bootstrap;
mod config;
mod context;
mod diff;
mod error;
mod manager;
mod memory;
mod principal;
mod reconciler;
mod resolver;
mod role;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
#[cfg(test)]
mod tests;
pub mod traits;

pub use action::Action;
pub use bootstrap::IngestPermissionBootstrapper;
pub use config::{Config, GUEST_USER_ID, USERS_GROUP_ID};
pub use context::AuthorizationContext;
pub use diff::{DiffResult, GrantDiff, Rejection, compute_diff};
pub use error::{
    BootstrapError, ErrorKind, FailedOperation, GrantOperation, LookupError, ReconcileError,
    ShareError, StoreError,
};
pub use manager::AccessManager;
pub use memory::MemoryStore;
pub use principal::{Grant, GroupId, Principal, ResourceId, UserId};
pub use reconciler::{ApplyReport, GrantReconciler, ReconcileOutcome};
pub use resolver::RoleResolver;
pub use role::{Role, RoleParseError};
