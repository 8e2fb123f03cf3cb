// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities.
mod faulty_store;

use std::collections::HashSet;

pub use faulty_store::FaultyStore;

use crate::config::USERS_GROUP_ID;
use crate::memory::MemoryStore;
use crate::traits::GrantStore;
use crate::{AuthorizationContext, GroupId, ResourceId, Role, UserId};

/// Resource every fixture creates.
pub const RESOURCE_ID: &str = "object-1";

/// Group which ingested the fixture resource and holds a reference on it.
pub const INGEST_GROUP_ID: &str = "ingest";

pub fn setup_logging() {
    if std::env::var("RUST_LOG").is_ok() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }
}

pub fn user(name: &str) -> UserId {
    UserId::new(name)
}

pub fn users(names: &[&str]) -> HashSet<UserId> {
    names.iter().map(|name| user(name)).collect()
}

/// Creates a memory store with the given users, all of them members of the "USERS" group, and
/// one freshly ingested resource readable by the ingest group.
pub async fn resource_fixture(names: &[&str]) -> (MemoryStore, ResourceId) {
    let store = MemoryStore::new();
    let users_group = GroupId::new(USERS_GROUP_ID);
    let ingest_group = GroupId::new(INGEST_GROUP_ID);
    store.add_group(&users_group).await;
    store.add_group(&ingest_group).await;

    for name in names {
        store.add_user(&user(name)).await;
        store
            .add_group_member(&users_group, &user(name), Role::Member)
            .await
            .expect("users group exists");
    }

    let resource = ResourceId::new(RESOURCE_ID);
    store
        .add_resource(&resource, &ingest_group, Role::Member)
        .await
        .expect("resource is new");

    (store, resource)
}

/// Like `resource_fixture` but with grants allowed and the given member and manager grants in
/// place.
pub async fn shared_fixture(
    names: &[&str],
    members: &[&str],
    managers: &[&str],
) -> (MemoryStore, ResourceId) {
    let (store, resource) = resource_fixture(names).await;
    let ctx = AuthorizationContext::system();
    store
        .allow_grants(&ctx, &resource, Role::Manager)
        .await
        .expect("resource exists");

    for (names, role) in [(members, Role::Member), (managers, Role::Manager)] {
        for name in names {
            store
                .create_grant(&ctx, &resource, &user(name), role)
                .await
                .expect("user exists and holds no grant yet");
        }
    }

    (store, resource)
}
