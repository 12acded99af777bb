//! Integration tests for the batch store implementation using in-memory
//! SurrealDB.

use chrono::Utc;
use ricetrace_core::RegistryError;
use ricetrace_core::models::{Batch, BatchState, Identity};
use ricetrace_core::repository::BatchStore;
use ricetrace_db::{DbManager, SurrealBatchStore};

/// Helper: boot an isolated embedded registry database.
async fn setup() -> SurrealBatchStore<surrealdb::engine::local::Db> {
    let manager = DbManager::embedded().await.unwrap();
    SurrealBatchStore::new(manager.client().clone())
}

fn harvested(id: u64, farmer: &str) -> Batch {
    Batch {
        id,
        variety: "ST25".into(),
        origin: "Soc Trang".into(),
        is_organic: true,
        farmer: Identity::new(farmer),
        miller: None,
        harvest_date: Utc::now(),
        milling_date: None,
        image_ref: "ipfs://harvest".into(),
        state: BatchState::Harvested,
    }
}

#[tokio::test]
async fn ids_are_sequential_from_one() {
    let store = setup().await;

    assert_eq!(store.count().await.unwrap(), 0);
    assert_eq!(store.next_id().await.unwrap(), 1);
    assert_eq!(store.next_id().await.unwrap(), 2);
    assert_eq!(store.next_id().await.unwrap(), 3);
    assert_eq!(store.count().await.unwrap(), 3);
}

#[tokio::test]
async fn insert_then_get_round_trips() {
    let store = setup().await;

    let id = store.next_id().await.unwrap();
    let stored = store.insert(harvested(id, "0xfarmer")).await.unwrap();
    assert_eq!(stored.id, id);
    assert_eq!(stored.state, BatchState::Harvested);

    let fetched = store.get(id).await.unwrap().expect("batch should exist");
    assert_eq!(fetched.id, id);
    assert_eq!(fetched.variety, "ST25");
    assert_eq!(fetched.origin, "Soc Trang");
    assert!(fetched.is_organic);
    assert_eq!(fetched.farmer, Identity::new("0xfarmer"));
    assert_eq!(fetched.miller, None);
    assert_eq!(fetched.milling_date, None);
}

#[tokio::test]
async fn get_zero_and_unissued_ids_return_none() {
    let store = setup().await;

    assert!(store.get(0).await.unwrap().is_none());
    assert!(store.get(999).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_insert_is_rejected() {
    let store = setup().await;

    let id = store.next_id().await.unwrap();
    store.insert(harvested(id, "0xfarmer")).await.unwrap();

    let err = store.insert(harvested(id, "0xfarmer")).await.unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateId { id: dup } if dup == id));
}

#[tokio::test]
async fn mark_processed_sets_miller_and_date() {
    let store = setup().await;
    let miller = Identity::new("0xmiller");

    let id = store.next_id().await.unwrap();
    store.insert(harvested(id, "0xfarmer")).await.unwrap();

    let milled_at = Utc::now();
    let processed = store
        .mark_processed(id, &miller, "ipfs://milled", milled_at)
        .await
        .unwrap();

    assert_eq!(processed.state, BatchState::Processed);
    assert_eq!(processed.miller, Some(miller));
    assert_eq!(processed.image_ref, "ipfs://milled");
    assert!(processed.milling_date.is_some());
    // Creation-time fields are untouched.
    assert_eq!(processed.farmer, Identity::new("0xfarmer"));
    assert_eq!(processed.variety, "ST25");
}

#[tokio::test]
async fn mark_processed_twice_is_invalid() {
    let store = setup().await;
    let miller = Identity::new("0xmiller");

    let id = store.next_id().await.unwrap();
    store.insert(harvested(id, "0xfarmer")).await.unwrap();
    store
        .mark_processed(id, &miller, "ipfs://milled", Utc::now())
        .await
        .unwrap();

    let err = store
        .mark_processed(id, &miller, "ipfs://again", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InvalidTransition {
            from: BatchState::Processed,
            to: BatchState::Processed,
            ..
        }
    ));
}

#[tokio::test]
async fn mark_sold_requires_processed() {
    let store = setup().await;

    let id = store.next_id().await.unwrap();
    store.insert(harvested(id, "0xfarmer")).await.unwrap();

    let err = store.mark_sold(id).await.unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InvalidTransition {
            from: BatchState::Harvested,
            to: BatchState::Sold,
            ..
        }
    ));

    store
        .mark_processed(id, &Identity::new("0xmiller"), "ipfs://milled", Utc::now())
        .await
        .unwrap();
    let sold = store.mark_sold(id).await.unwrap();
    assert_eq!(sold.state, BatchState::Sold);
}

#[tokio::test]
async fn transitions_on_missing_batch_are_not_found() {
    let store = setup().await;

    let err = store
        .mark_processed(42, &Identity::new("0xmiller"), "x", Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { id: 42 }));

    let err = store.mark_sold(42).await.unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { id: 42 }));

    let err = store.mark_deleted(42).await.unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { id: 42 }));
}

#[tokio::test]
async fn delete_retains_record_and_is_one_way() {
    let store = setup().await;

    let id = store.next_id().await.unwrap();
    store.insert(harvested(id, "0xfarmer")).await.unwrap();

    let deleted = store.mark_deleted(id).await.unwrap();
    assert_eq!(deleted.state, BatchState::Deleted);

    // Still queryable for audit.
    let fetched = store.get(id).await.unwrap().expect("record is retained");
    assert_eq!(fetched.state, BatchState::Deleted);
    assert_eq!(fetched.variety, "ST25");

    // Second delete loses against the guard.
    let err = store.mark_deleted(id).await.unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InvalidTransition {
            from: BatchState::Deleted,
            to: BatchState::Deleted,
            ..
        }
    ));

    // Counter is unaffected by retirement.
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn delete_allowed_from_sold() {
    let store = setup().await;

    let id = store.next_id().await.unwrap();
    store.insert(harvested(id, "0xfarmer")).await.unwrap();
    store
        .mark_processed(id, &Identity::new("0xmiller"), "ipfs://milled", Utc::now())
        .await
        .unwrap();
    store.mark_sold(id).await.unwrap();

    let deleted = store.mark_deleted(id).await.unwrap();
    assert_eq!(deleted.state, BatchState::Deleted);
}

#[tokio::test]
async fn list_all_is_ascending_by_id() {
    let store = setup().await;

    for farmer in ["0xa", "0xb", "0xc"] {
        let id = store.next_id().await.unwrap();
        store.insert(harvested(id, farmer)).await.unwrap();
    }

    let all = store.list_all().await.unwrap();
    let ids: Vec<u64> = all.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn racing_transitions_on_one_batch_have_a_single_winner() {
    let store = std::sync::Arc::new(setup().await);
    let first_miller = Identity::new("0xm1");
    let second_miller = Identity::new("0xm2");

    let id = store.next_id().await.unwrap();
    store.insert(harvested(id, "0xfarmer")).await.unwrap();

    // Two millers race to process the same batch.
    let first = tokio::spawn({
        let store = store.clone();
        let miller = first_miller.clone();
        async move { store.mark_processed(id, &miller, "ipfs://m1", Utc::now()).await }
    });
    let second = tokio::spawn({
        let store = store.clone();
        let miller = second_miller.clone();
        async move { store.mark_processed(id, &miller, "ipfs://m2", Utc::now()).await }
    });

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    let winners: Vec<&Batch> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "exactly one transition may win");

    for loss in outcomes.iter().filter_map(|o| o.as_ref().err()) {
        assert!(matches!(
            loss,
            RegistryError::InvalidTransition {
                from: BatchState::Processed,
                to: BatchState::Processed,
                ..
            }
        ));
    }

    // The stored record carries the winner's fields, untouched by the
    // loser.
    let stored = store.get(id).await.unwrap().unwrap();
    assert_eq!(stored.state, BatchState::Processed);
    assert_eq!(stored.miller, winners[0].miller);
    assert_eq!(stored.image_ref, winners[0].image_ref);
}

#[tokio::test]
async fn concurrent_allocation_yields_distinct_gap_free_ids() {
    let store = std::sync::Arc::new(setup().await);

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move { store.next_id().await.unwrap() }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort_unstable();
    assert_eq!(ids, (1..=10).collect::<Vec<u64>>());
}
