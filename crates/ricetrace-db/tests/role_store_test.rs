//! Integration tests for the role store implementation using in-memory
//! SurrealDB.

use ricetrace_core::RegistryError;
use ricetrace_core::models::Identity;
use ricetrace_core::repository::RoleStore;
use ricetrace_db::{DbManager, SurrealRoleStore};

/// Helper: boot an isolated embedded registry database.
async fn setup() -> SurrealRoleStore<surrealdb::engine::local::Db> {
    let manager = DbManager::embedded().await.unwrap();
    SurrealRoleStore::new(manager.client().clone())
}

#[tokio::test]
async fn fresh_store_has_no_members() {
    let store = setup().await;
    let alice = Identity::new("0xalice");

    assert!(!store.is_farmer(&alice).await.unwrap());
    assert!(!store.is_miller(&alice).await.unwrap());
    assert!(!store.is_pending(&alice).await.unwrap());
    assert!(store.list_farmers().await.unwrap().is_empty());
    assert!(store.list_pending_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn approve_and_revoke_farmer_are_idempotent() {
    let store = setup().await;
    let alice = Identity::new("0xalice");

    store.approve_farmer(&alice).await.unwrap();
    store.approve_farmer(&alice).await.unwrap();
    assert!(store.is_farmer(&alice).await.unwrap());
    assert_eq!(store.list_farmers().await.unwrap().len(), 1);

    store.revoke_farmer(&alice).await.unwrap();
    store.revoke_farmer(&alice).await.unwrap();
    assert!(!store.is_farmer(&alice).await.unwrap());
}

#[tokio::test]
async fn one_identity_may_hold_both_roles() {
    let store = setup().await;
    let bob = Identity::new("0xbob");

    store.approve_farmer(&bob).await.unwrap();
    store.approve_miller(&bob).await.unwrap();

    assert!(store.is_farmer(&bob).await.unwrap());
    assert!(store.is_miller(&bob).await.unwrap());
}

#[tokio::test]
async fn request_then_second_request_is_rejected() {
    let store = setup().await;
    let carol = Identity::new("0xcarol");

    store.request_farmer_role(&carol).await.unwrap();
    assert!(store.is_pending(&carol).await.unwrap());

    let err = store.request_farmer_role(&carol).await.unwrap_err();
    assert!(matches!(
        err,
        RegistryError::RequestAlreadyPending { identity } if identity == carol
    ));
}

#[tokio::test]
async fn approved_farmer_cannot_request() {
    let store = setup().await;
    let dave = Identity::new("0xdave");

    store.approve_farmer(&dave).await.unwrap();
    let err = store.request_farmer_role(&dave).await.unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyApproved { .. }));
}

#[tokio::test]
async fn approval_dequeues_pending_request() {
    let store = setup().await;
    let erin = Identity::new("0xerin");

    store.request_farmer_role(&erin).await.unwrap();
    store.approve_farmer(&erin).await.unwrap();

    assert!(store.is_farmer(&erin).await.unwrap());
    assert!(!store.is_pending(&erin).await.unwrap());
    assert!(store.list_pending_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn pending_queue_preserves_arrival_order() {
    let store = setup().await;
    let first = Identity::new("0x01");
    let second = Identity::new("0x02");
    let third = Identity::new("0x03");

    store.request_farmer_role(&first).await.unwrap();
    store.request_farmer_role(&second).await.unwrap();
    store.request_farmer_role(&third).await.unwrap();

    let queue = store.list_pending_requests().await.unwrap();
    assert_eq!(queue, vec![first.clone(), second.clone(), third.clone()]);

    // Approving the middle request keeps the rest ordered.
    store.approve_farmer(&second).await.unwrap();
    let queue = store.list_pending_requests().await.unwrap();
    assert_eq!(queue, vec![first, third]);
}

#[tokio::test]
async fn reject_drops_request_without_granting() {
    let store = setup().await;
    let frank = Identity::new("0xfrank");

    store.request_farmer_role(&frank).await.unwrap();
    store.reject_farmer_request(&frank).await.unwrap();

    assert!(!store.is_pending(&frank).await.unwrap());
    assert!(!store.is_farmer(&frank).await.unwrap());

    // Rejected identity may request again.
    store.request_farmer_role(&frank).await.unwrap();
    assert!(store.is_pending(&frank).await.unwrap());
}

#[tokio::test]
async fn reject_without_request_fails() {
    let store = setup().await;
    let grace = Identity::new("0xgrace");

    let err = store.reject_farmer_request(&grace).await.unwrap_err();
    assert!(matches!(err, RegistryError::RequestNotFound { .. }));
}
