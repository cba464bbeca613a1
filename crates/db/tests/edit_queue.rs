//! Integration tests for `EditQueue` over the in-memory store.
//!
//! A Redis-backed variant of the core checks runs when `REDIS_URL` points at
//! a disposable server (`cargo test -- --ignored`).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use suggestor_core::edit::{EditState, NewEdit};
use suggestor_db::repositories::{ApprovalTransition, EditQueue};
use suggestor_db::{CasOutcome, JoinedRow, KvStore, MemoryStore, StoreError, WriteOp};

const PREFIX: &str = "test:";

fn new_edit(summary: &str) -> NewEdit {
    NewEdit {
        endpoint: "https://en.wikipedia.org/w/api.php".into(),
        content: "Hello world".into(),
        summary: summary.into(),
        base_revision: Some(1001),
        page_id: Some(42),
        page_name: Some("Hello".into()),
    }
}

fn memory_queue() -> (Arc<MemoryStore>, EditQueue) {
    let store = Arc::new(MemoryStore::new());
    let queue = EditQueue::new(store.clone(), PREFIX);
    (store, queue)
}

// ---------------------------------------------------------------------------
// Submit / list
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submitted_ids_strictly_increase() {
    let (_store, queue) = memory_queue();

    let mut last = 0;
    for i in 0..5 {
        let id = queue.submit(&new_edit(&format!("edit {i}"))).await.unwrap();
        assert!(id > last, "id {id} must be greater than {last}");
        last = id;
    }
}

#[tokio::test]
async fn concurrent_submits_never_collide() {
    let (_store, queue) = memory_queue();

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let queue = queue.clone();
            tokio::spawn(async move { queue.submit(&new_edit(&format!("edit {i}"))).await })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        let id = handle.await.unwrap().unwrap();
        assert!(ids.insert(id), "duplicate id {id}");
    }
    assert_eq!(ids.len(), 32);
    assert_eq!(queue.list_pending().await.unwrap().len(), 32);
}

#[tokio::test]
async fn newest_submission_heads_the_list() {
    let (_store, queue) = memory_queue();

    queue.submit(&new_edit("first")).await.unwrap();
    let id = queue.submit(&new_edit("typo fix")).await.unwrap();

    let pending = queue.list_pending().await.unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].id, id);
    assert_eq!(pending[0].summary, "typo fix");
    assert_eq!(pending[0].state, EditState::Pending);
    assert_eq!(pending[1].summary, "first");
}

#[tokio::test]
async fn empty_queue_lists_nothing() {
    let (_store, queue) = memory_queue();
    assert!(queue.list_pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn deleted_record_is_a_consistency_error() {
    let (store, queue) = memory_queue();

    let id = queue.submit(&new_edit("doomed")).await.unwrap();
    store.delete(&format!("{PREFIX}edit:{id}")).await;

    let result = queue.list_pending().await;
    assert_matches!(result, Err(StoreError::Consistency { id: ref bad }) if *bad == id.to_string());
}

#[tokio::test]
async fn find_by_id_returns_all_fields() {
    let (_store, queue) = memory_queue();

    let id = queue.submit(&new_edit("typo fix")).await.unwrap();
    let record = queue.find_by_id(id).await.unwrap().expect("record exists");

    assert_eq!(record.id, id);
    assert_eq!(record.endpoint, "https://en.wikipedia.org/w/api.php");
    assert_eq!(record.content, "Hello world");
    assert_eq!(record.base_revision, Some(1001));
    assert_eq!(record.page_id, Some(42));
    assert_eq!(record.page_name.as_deref(), Some("Hello"));
    assert!(!record.is_approved());

    assert!(queue.find_by_id(id + 100).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Atomicity of submit
// ---------------------------------------------------------------------------

/// Delegates to a `MemoryStore` but fails every batch write.
struct FailingBatches(MemoryStore);

#[async_trait]
impl KvStore for FailingBatches {
    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.0.incr(key).await
    }
    async fn exec_atomic(&self, _ops: Vec<WriteOp>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        self.0.hash_get_all(key).await
    }
    async fn list_join(
        &self,
        list_key: &str,
        hash_prefix: &str,
        fields: &[&str],
    ) -> Result<Vec<JoinedRow>, StoreError> {
        self.0.list_join(list_key, hash_prefix, fields).await
    }
    async fn hash_set_existing(&self, key: &str, field: &str, value: &str) -> Result<bool, StoreError> {
        self.0.hash_set_existing(key, field, value).await
    }
    async fn hash_compare_and_set(
        &self,
        key: &str,
        field: &str,
        expected: &str,
        new: &str,
    ) -> Result<CasOutcome, StoreError> {
        self.0.hash_compare_and_set(key, field, expected, new).await
    }
    async fn ping(&self) -> Result<(), StoreError> {
        self.0.ping().await
    }
}

#[tokio::test]
async fn failed_submit_leaves_no_partial_state() {
    let store = Arc::new(FailingBatches(MemoryStore::new()));
    let queue = EditQueue::new(store.clone(), PREFIX);

    assert_matches!(queue.submit(&new_edit("lost")).await, Err(StoreError::Unavailable));

    assert!(queue.list_pending().await.unwrap().is_empty());
    assert!(queue.find_by_id(1).await.unwrap().is_none());
    // The id was consumed; the next one skips it.
    assert_eq!(store.incr(&format!("{PREFIX}uids")).await.unwrap(), 2);
}

// ---------------------------------------------------------------------------
// Approval flag
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mark_approved_unknown_id_is_not_found() {
    let (_store, queue) = memory_queue();
    assert_matches!(queue.mark_approved(99).await, Err(StoreError::NotFound(99)));
}

#[tokio::test]
async fn mark_approved_is_not_guarded() {
    let (_store, queue) = memory_queue();
    let id = queue.submit(&new_edit("x")).await.unwrap();

    queue.mark_approved(id).await.unwrap();
    queue.mark_approved(id).await.unwrap();

    let record = queue.find_by_id(id).await.unwrap().unwrap();
    assert!(record.is_approved());
}

#[tokio::test]
async fn approve_if_pending_flips_once() {
    let (_store, queue) = memory_queue();
    let id = queue.submit(&new_edit("x")).await.unwrap();

    assert_eq!(
        queue.approve_if_pending(id).await.unwrap(),
        ApprovalTransition::Approved
    );
    assert_eq!(
        queue.approve_if_pending(id).await.unwrap(),
        ApprovalTransition::AlreadyApproved
    );
    assert_matches!(
        queue.approve_if_pending(id + 1).await,
        Err(StoreError::NotFound(_))
    );
}

#[tokio::test]
async fn concurrent_guarded_approvals_have_one_winner() {
    let (_store, queue) = memory_queue();
    let id = queue.submit(&new_edit("x")).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let queue = queue.clone();
            tokio::spawn(async move { queue.approve_if_pending(id).await })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() == ApprovalTransition::Approved {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

// ---------------------------------------------------------------------------
// Redis
// ---------------------------------------------------------------------------

#[tokio::test]
#[ignore = "requires a disposable Redis server at REDIS_URL"]
async fn redis_queue_round_trip() {
    let url = std::env::var("REDIS_URL").expect("REDIS_URL must be set");
    let store = suggestor_db::connect(&url).await.unwrap();
    suggestor_db::health_check(store.as_ref()).await.unwrap();

    let prefix = format!("suggestor-test-{}:", std::process::id());
    let queue = EditQueue::new(store, prefix);

    let first = queue.submit(&new_edit("first")).await.unwrap();
    let second = queue.submit(&new_edit("second")).await.unwrap();
    assert!(second > first);

    let pending = queue.list_pending().await.unwrap();
    assert_eq!(pending[0].id, second);
    assert_eq!(pending[1].id, first);

    assert_eq!(
        queue.approve_if_pending(first).await.unwrap(),
        ApprovalTransition::Approved
    );
    assert_eq!(
        queue.approve_if_pending(first).await.unwrap(),
        ApprovalTransition::AlreadyApproved
    );
    assert_matches!(
        queue.mark_approved(second + 1000).await,
        Err(StoreError::NotFound(_))
    );
}
