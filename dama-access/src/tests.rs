// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashSet;

use assert_matches::assert_matches;

use crate::test_utils::{INGEST_GROUP_ID, resource_fixture, setup_logging, user, users};
use crate::{
    AccessManager, Action, AuthorizationContext, Config, Grant, GroupId, Principal,
    ReconcileOutcome, Rejection, Role, ShareError,
};

#[tokio::test]
async fn object_lifecycle() {
    setup_logging();

    let (store, resource) = resource_fixture(&["uploader", "alice", "bob", "erin"]).await;
    let manager = AccessManager::new(store.clone(), store.clone(), Config::default());

    // Ingest hands the object over to its uploader and publishes it read-only.
    manager
        .ingest_completed(&resource, &user("uploader"))
        .await
        .unwrap();
    assert_eq!(
        store.entries(&resource).await.unwrap(),
        HashSet::from([
            Grant::new(resource.clone(), user("uploader"), Role::Manager),
            Grant::new(resource.clone(), GroupId::new("USERS"), Role::Guest),
        ])
    );

    let uploader = manager.context_for(Some(&user("uploader"))).await;
    let alice = manager.context_for(Some(&user("alice"))).await;
    let erin = manager.context_for(Some(&user("erin"))).await;
    assert_eq!(erin.role(), Role::Member);

    assert!(manager.is_eligible(&resource, &uploader, Action::Share).await);
    assert!(manager.is_eligible(&resource, &erin, Action::View).await);
    assert!(!manager.is_eligible(&resource, &erin, Action::EditMetadata).await);

    // Only managers may change sharing.
    let result = manager.share(&resource, &users(&["erin"]), &erin).await;
    assert_matches!(
        result,
        Err(ShareError::NotEligible {
            role: Role::Guest,
            ..
        })
    );

    let outcome = manager
        .share(&resource, &users(&["alice", "bob"]), &uploader)
        .await
        .unwrap();
    let report = outcome.report().unwrap();
    assert!(report.is_complete());
    assert_eq!(report.added, users(&["alice", "bob"]));

    assert_eq!(
        manager.sharing_selection(&resource).await.unwrap(),
        users(&["uploader", "alice", "bob"])
    );
    assert!(manager.is_eligible(&resource, &alice, Action::EditMetadata).await);
    assert!(manager.is_eligible(&resource, &alice, Action::ToggleFavorite).await);
    assert!(!manager.is_eligible(&resource, &alice, Action::Share).await);

    // Nobody left is refused, the sharing stays as it was.
    let outcome = manager
        .share(&resource, &HashSet::new(), &uploader)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ReconcileOutcome::Rejected(Rejection::EmptySelectionRejected)
    );

    // Dropping alice from the selection revokes her grant, the public reference remains.
    let outcome = manager
        .share(&resource, &users(&["bob"]), &uploader)
        .await
        .unwrap();
    assert_eq!(outcome.report().unwrap().removed, users(&["alice"]));

    let alice_role = manager
        .effective_role(
            &resource,
            &Principal::User(user("alice")),
            &AuthorizationContext::system(),
        )
        .await
        .unwrap();
    assert_eq!(alice_role, Role::Guest);

    let uploader_role = manager
        .effective_role(
            &resource,
            &Principal::User(user("uploader")),
            &AuthorizationContext::system(),
        )
        .await
        .unwrap();
    assert_eq!(uploader_role, Role::Manager);
}

#[tokio::test]
async fn anonymous_and_administrative_viewers() {
    let (store, resource) = resource_fixture(&["uploader", "alice"]).await;
    let manager = AccessManager::new(store.clone(), store.clone(), Config::default());
    manager
        .ingest_completed(&resource, &user("uploader"))
        .await
        .unwrap();

    let guest = manager.context_for(None).await;
    assert_eq!(guest, AuthorizationContext::guest(&Config::default()));
    assert!(manager.is_eligible(&resource, &guest, Action::View).await);
    assert!(!manager.is_eligible(&resource, &guest, Action::ToggleFavorite).await);
    assert!(!manager.is_eligible(&resource, &guest, Action::Administer).await);

    // Administrators share without holding any grant.
    let admin = AuthorizationContext::new(user("root"), GroupId::new("USERS"), Role::Administrator);
    assert!(manager.is_eligible(&resource, &admin, Action::Administer).await);
    let outcome = manager
        .share(&resource, &users(&["alice"]), &admin)
        .await
        .unwrap();
    assert_eq!(outcome.report().unwrap().added, users(&["alice"]));
}

#[tokio::test]
async fn sharing_before_ingest_completed_is_refused() {
    let (store, resource) = resource_fixture(&["alice"]).await;
    let manager = AccessManager::new(store.clone(), store.clone(), Config::default());
    let admin = AuthorizationContext::system();

    let outcome = manager
        .share(&resource, &users(&["alice"]), &admin)
        .await
        .unwrap();
    assert_eq!(outcome.rejection(), Some(Rejection::NoOwnerRemains));
    assert!(store.grants(&resource).await.unwrap().is_empty());

    // Members of the ingesting group still read through its reference.
    let ingest_group = Principal::Group(GroupId::new(INGEST_GROUP_ID));
    let role = manager
        .effective_role(&resource, &ingest_group, &admin)
        .await
        .unwrap();
    assert_eq!(role, Role::Member);
}
