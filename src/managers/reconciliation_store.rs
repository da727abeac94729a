//! Reconciliation Store for Markline.
//!
//! Holds the session's ordered list of bookmarks. Three sources write to it:
//! the initial bulk load (`seed`), the mutation coordinator, and the change
//! feed listener. `insert` and `remove` are idempotent and commutative over
//! distinct ids, so whichever source wins a race the list converges.
//!
//! Ids are assigned by the durable store and never reused, so a removed id is
//! remembered: a `Created` that arrives after the matching delete (a queued
//! echo of the session's own add, or a feed reordering) is dropped instead of
//! bringing the bookmark back.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, warn};

use crate::types::bookmark::{Bookmark, OwnerId};
use crate::types::feed::ChangeEvent;

/// In-memory bookmark list for a single owner.
///
/// Kept sorted by [`Bookmark::display_cmp`]; `ids` mirrors `records` for
/// constant-time membership checks. `removed` holds deleted ids that no later
/// seed has brought back.
#[derive(Debug, Clone)]
pub struct ReconciliationStore {
    owner_id: OwnerId,
    records: Vec<Bookmark>,
    ids: HashSet<String>,
    removed: HashSet<String>,
    version: u64,
}

impl ReconciliationStore {
    /// Creates an empty store scoped to `owner_id`.
    pub fn new(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            records: Vec::new(),
            ids: HashSet::new(),
            removed: HashSet::new(),
            version: 0,
        }
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    /// Replaces the whole list with `records`. Last seed wins.
    ///
    /// Records for other owners are dropped and duplicate ids keep their first
    /// occurrence. The result is re-sorted, so callers need not pre-order it.
    /// Removed ids that the new list contains again are forgotten, so a
    /// resync restores a record whose durable delete failed.
    pub fn seed(&mut self, records: Vec<Bookmark>) {
        let mut ids = HashSet::with_capacity(records.len());
        let mut kept = Vec::with_capacity(records.len());
        for record in records {
            if record.owner_id != self.owner_id {
                warn!(
                    "[Store] Dropping seeded bookmark {} owned by {}",
                    record.id, record.owner_id
                );
                continue;
            }
            if ids.insert(record.id.clone()) {
                kept.push(record);
            }
        }
        kept.sort_by(Bookmark::display_cmp);

        debug!("[Store] Seeded {} bookmarks for {}", kept.len(), self.owner_id);
        self.removed.retain(|id| !ids.contains(id));
        self.records = kept;
        self.ids = ids;
        self.version += 1;
    }

    /// Adds `record` unless a bookmark with the same id is already present or
    /// was removed and not brought back by a later seed.
    ///
    /// Returns `true` if the list changed.
    pub fn insert(&mut self, record: Bookmark) -> bool {
        if record.owner_id != self.owner_id {
            warn!(
                "[Store] Ignoring bookmark {} owned by {}",
                record.id, record.owner_id
            );
            return false;
        }
        if self.ids.contains(&record.id) {
            return false;
        }
        if self.removed.contains(&record.id) {
            debug!("[Store] Ignoring stale create of removed bookmark {}", record.id);
            return false;
        }

        let pos = self
            .records
            .partition_point(|existing| existing.display_cmp(&record) == Ordering::Less);
        self.ids.insert(record.id.clone());
        self.records.insert(pos, record);
        self.version += 1;
        true
    }

    /// Removes the bookmark with `id` if present and remembers the id either
    /// way, so a later `Created` for it is ignored.
    ///
    /// Returns `true` if the list changed.
    pub fn remove(&mut self, id: &str) -> bool {
        self.removed.insert(id.to_string());
        if !self.ids.remove(id) {
            return false;
        }
        if let Some(pos) = self.records.iter().position(|b| b.id == id) {
            self.records.remove(pos);
        }
        self.version += 1;
        true
    }

    /// Applies one change feed event. Returns `true` if the list changed.
    pub fn apply(&mut self, event: &ChangeEvent) -> bool {
        match event {
            ChangeEvent::Created(bookmark) => self.insert(bookmark.clone()),
            ChangeEvent::Deleted { id, owner_id } => {
                if *owner_id != self.owner_id {
                    warn!("[Store] Ignoring delete of {} owned by {}", id, owner_id);
                    return false;
                }
                self.remove(id)
            }
        }
    }

    /// Ordered view of the current list.
    pub fn records(&self) -> &[Bookmark] {
        &self.records
    }

    /// Owned copy of the current list.
    pub fn snapshot(&self) -> Vec<Bookmark> {
        self.records.clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Incremented on every seed and on every insert/remove that changed the list.
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Cloneable handle to a [`ReconciliationStore`] shared by the coordinator
/// and the feed listener.
///
/// Each call takes the lock once, so a snapshot never observes a partially
/// applied mutation.
#[derive(Debug, Clone)]
pub struct SharedStore {
    inner: Arc<RwLock<ReconciliationStore>>,
}

impl SharedStore {
    pub fn new(owner_id: OwnerId) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ReconciliationStore::new(owner_id))),
        }
    }

    pub fn owner_id(&self) -> OwnerId {
        self.read(|store| store.owner_id().clone())
    }

    pub fn seed(&self, records: Vec<Bookmark>) {
        self.write(|store| store.seed(records))
    }

    pub fn insert(&self, record: Bookmark) -> bool {
        self.write(|store| store.insert(record))
    }

    pub fn remove(&self, id: &str) -> bool {
        self.write(|store| store.remove(id))
    }

    pub fn apply(&self, event: &ChangeEvent) -> bool {
        self.write(|store| store.apply(event))
    }

    pub fn snapshot(&self) -> Vec<Bookmark> {
        self.read(ReconciliationStore::snapshot)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read(|store| store.contains(id))
    }

    pub fn len(&self) -> usize {
        self.read(ReconciliationStore::len)
    }

    pub fn is_empty(&self) -> bool {
        self.read(ReconciliationStore::is_empty)
    }

    pub fn version(&self) -> u64 {
        self.read(ReconciliationStore::version)
    }

    // Store operations cannot leave the list half-updated, so a poisoned lock
    // still guards consistent data.
    fn read<R>(&self, f: impl FnOnce(&ReconciliationStore) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<R>(&self, f: impl FnOnce(&mut ReconciliationStore) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}
