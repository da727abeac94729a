//! Unit tests for the MutationCoordinator add/delete paths.
//!
//! A scripted in-memory durable store stands in for the database so failures
//! can be injected and calls counted.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use markline::managers::mutation_coordinator::MutationCoordinator;
use markline::managers::reconciliation_store::SharedStore;
use markline::services::durable_store::DurableStore;
use markline::types::bookmark::{Bookmark, OwnerId};
use markline::types::errors::{MutationError, StoreError, ValidationError};
use markline::types::feed::ChangeEvent;

#[derive(Default)]
struct ScriptedStore {
    records: Mutex<Vec<Bookmark>>,
    fail_create: AtomicBool,
    fail_delete: AtomicBool,
    creates: AtomicUsize,
    deletes: AtomicUsize,
    clock: AtomicI64,
}

#[async_trait]
impl DurableStore for ScriptedStore {
    async fn list_by_owner(&self, owner_id: &OwnerId) -> Result<Vec<Bookmark>, StoreError> {
        let mut records: Vec<Bookmark> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|b| &b.owner_id == owner_id)
            .cloned()
            .collect();
        records.sort_by(Bookmark::display_cmp);
        Ok(records)
    }

    async fn create(&self, owner_id: &OwnerId, title: &str, url: &str) -> Result<Bookmark, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("network rejected".to_string()));
        }
        let ts = self.clock.fetch_add(1, Ordering::SeqCst) + 100;
        let bookmark = Bookmark {
            id: format!("srv-{}", ts),
            owner_id: owner_id.clone(),
            title: title.to_string(),
            url: url.to_string(),
            created_at: ts,
        };
        self.records.lock().unwrap().push(bookmark.clone());
        Ok(bookmark)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StoreError::DatabaseError("permission denied".to_string()));
        }
        self.records.lock().unwrap().retain(|b| b.id != id);
        Ok(())
    }
}

fn owner() -> OwnerId {
    OwnerId::from("user-1")
}

fn existing(id: &str, created_at: i64) -> Bookmark {
    Bookmark {
        id: id.to_string(),
        owner_id: owner(),
        title: id.to_string(),
        url: format!("https://{}.example", id),
        created_at,
    }
}

fn setup() -> (Arc<ScriptedStore>, SharedStore, MutationCoordinator) {
    let durable = Arc::new(ScriptedStore::default());
    let store = SharedStore::new(owner());
    store.seed(vec![existing("A", 10), existing("B", 5)]);
    let coordinator = MutationCoordinator::new(owner(), store.clone(), durable.clone());
    (durable, store, coordinator)
}

// ─── Add ───

#[tokio::test]
async fn test_add_with_empty_title_never_reaches_durable_store() {
    let (durable, store, coordinator) = setup();
    let before = store.snapshot();

    let err = coordinator.add("", "https://x.com").await.unwrap_err();

    assert_eq!(err, MutationError::Validation(ValidationError::EmptyTitle));
    assert_eq!(store.snapshot(), before);
    assert_eq!(durable.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_add_with_invalid_url_never_reaches_durable_store() {
    let (durable, _store, coordinator) = setup();

    for url in ["", "   ", "not a url", "example.com/path"] {
        let err = coordinator.add("Title", url).await.unwrap_err();
        assert!(
            matches!(err, MutationError::Validation(_)),
            "{:?} should fail validation, got {:?}",
            url,
            err
        );
    }
    assert_eq!(durable.creates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_add_failure_leaves_store_untouched() {
    let (durable, store, coordinator) = setup();
    durable.fail_create.store(true, Ordering::SeqCst);
    let before = store.snapshot();

    let err = coordinator.add("Rust", "https://rust-lang.org").await.unwrap_err();

    assert!(matches!(err, MutationError::AddFailed(ref msg) if msg.contains("network rejected")));
    assert_eq!(store.snapshot(), before);
    assert_eq!(durable.creates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_add_success_inserts_trimmed_record_in_order() {
    let (durable, store, coordinator) = setup();

    let created = coordinator
        .add("  Rust  ", " https://rust-lang.org ")
        .await
        .unwrap();

    assert_eq!(created.title, "Rust");
    assert_eq!(created.url, "https://rust-lang.org");
    assert_eq!(store.snapshot()[0], created);
    assert_eq!(store.len(), 3);
    assert_eq!(durable.records.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_add_then_feed_echo_keeps_single_copy() {
    let (_durable, store, coordinator) = setup();

    let created = coordinator.add("Rust", "https://rust-lang.org").await.unwrap();
    let after_add = store.snapshot();

    assert!(!store.apply(&ChangeEvent::Created(created)));
    assert_eq!(store.snapshot(), after_add);
}

#[tokio::test]
async fn test_feed_echo_before_add_response_keeps_single_copy() {
    let (durable, store, _coordinator) = setup();
    let created = durable
        .create(&owner(), "Rust", "https://rust-lang.org")
        .await
        .unwrap();

    // The echo wins the race; the direct response arrives second.
    assert!(store.apply(&ChangeEvent::Created(created.clone())));
    assert!(!store.insert(created));
    assert_eq!(store.len(), 3);
}

// ─── Delete ───

#[tokio::test]
async fn test_delete_removes_before_durable_confirmation() {
    let (durable, store, coordinator) = setup();

    coordinator.delete("A").await.unwrap();

    assert!(!store.contains("A"));
    assert_eq!(durable.deletes.load(Ordering::SeqCst), 1);

    // Feed echo of the same delete.
    let before = store.snapshot();
    assert!(!store.apply(&ChangeEvent::Deleted {
        id: "A".to_string(),
        owner_id: owner(),
    }));
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn test_delete_failure_is_surfaced_and_not_rolled_back() {
    let (durable, store, coordinator) = setup();
    durable.fail_delete.store(true, Ordering::SeqCst);

    let err = coordinator.delete("A").await.unwrap_err();

    assert!(matches!(err, MutationError::DeleteFailed(ref msg) if msg.contains("permission denied")));
    assert!(!store.contains("A"), "optimistic removal stays in place");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_delete_unknown_id_is_harmless() {
    let (_durable, store, coordinator) = setup();
    let before = store.snapshot();

    coordinator.delete("missing").await.unwrap();
    assert_eq!(store.snapshot(), before);
}
