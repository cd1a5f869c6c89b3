use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::*;

/// Server-assigned write time. `seq` is strictly increasing across the whole
/// store and breaks ties between writes in the same millisecond.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerTime {
    pub seq: u64,
    pub millis: i64,
}

/// Address of a single document.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocPath {
    pub collection: String,
    pub id: String,
}

impl DocPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoredDoc {
    pub id: String,
    /// Bumped by every write to this document.
    pub revision: u64,
    /// Refreshed by `set` and `create`, kept by `update_if`.
    pub written_at: ServerTime,
    pub data: Value,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotMetadata {
    pub has_pending_writes: bool,
    pub from_cache: bool,
}

impl SnapshotMetadata {
    /// Only snapshots confirmed by the server are acted upon.
    pub const fn is_confirmed(&self) -> bool {
        !self.has_pending_writes && !self.from_cache
    }
}

/// Result of a collection query, ordered by `written_at`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuerySnapshot {
    pub docs: Vec<StoredDoc>,
    pub metadata: SnapshotMetadata,
}

/// The hosted document database, reduced to what the game uses.
pub trait DocumentStore {
    fn get(&self, path: &DocPath) -> Result<Option<StoredDoc>>;

    /// Last-write-wins put.
    fn set(&self, path: &DocPath, data: Value) -> Result<StoredDoc>;

    /// Put that fails with [`StoreError::AlreadyExists`] if the document exists.
    fn create(&self, path: &DocPath, data: Value) -> Result<StoredDoc>;

    /// Merges `fields` into the document if its revision is still
    /// `expected_revision`, failing with [`StoreError::Conflict`] otherwise.
    fn update_if(&self, path: &DocPath, expected_revision: u64, fields: Map<String, Value>) -> Result<StoredDoc>;

    fn list(&self, collection: &str) -> Result<QuerySnapshot>;

    /// Changes whenever any document changes.
    fn revision(&self) -> u64;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Rc<S> {
    fn get(&self, path: &DocPath) -> Result<Option<StoredDoc>> {
        (**self).get(path)
    }

    fn set(&self, path: &DocPath, data: Value) -> Result<StoredDoc> {
        (**self).set(path, data)
    }

    fn create(&self, path: &DocPath, data: Value) -> Result<StoredDoc> {
        (**self).create(path, data)
    }

    fn update_if(&self, path: &DocPath, expected_revision: u64, fields: Map<String, Value>) -> Result<StoredDoc> {
        (**self).update_if(path, expected_revision, fields)
    }

    fn list(&self, collection: &str) -> Result<QuerySnapshot> {
        (**self).list(collection)
    }

    fn revision(&self) -> u64 {
        (**self).revision()
    }
}

/// Single-threaded in-memory store. Clients share it through `Rc`.
pub struct MemoryStore {
    clock: Rc<dyn Clock>,
    docs: RefCell<BTreeMap<String, BTreeMap<String, StoredDoc>>>,
    seq: Cell<u64>,
    metadata: Cell<SnapshotMetadata>,
    read_only: Cell<bool>,
}

impl MemoryStore {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            docs: RefCell::new(BTreeMap::new()),
            seq: Cell::new(0),
            metadata: Cell::new(SnapshotMetadata::default()),
            read_only: Cell::new(false),
        }
    }

    /// Flags returned with every query, to mimic a client still syncing.
    pub fn set_metadata(&self, metadata: SnapshotMetadata) {
        self.metadata.set(metadata);
    }

    /// Rejects every write while set, to mimic security-rule failures.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.set(read_only);
    }

    fn next_time(&self) -> ServerTime {
        let seq = self.seq.get() + 1;
        self.seq.set(seq);
        ServerTime {
            seq,
            millis: self.clock.now_ms(),
        }
    }

    fn check_writable(&self, path: &DocPath) -> Result<()> {
        if self.read_only.get() {
            Err(StoreError::Rejected(path.to_string()))
        } else {
            Ok(())
        }
    }

    fn put(&self, path: &DocPath, data: Value, must_be_new: bool) -> Result<StoredDoc> {
        self.check_writable(path)?;
        let mut docs = self.docs.borrow_mut();
        let collection = docs.entry(path.collection.clone()).or_default();

        let revision = match collection.get(&path.id) {
            Some(_) if must_be_new => return Err(StoreError::AlreadyExists(path.to_string())),
            Some(existing) => existing.revision + 1,
            None => 1,
        };
        let doc = StoredDoc {
            id: path.id.clone(),
            revision,
            written_at: self.next_time(),
            data,
        };
        collection.insert(path.id.clone(), doc.clone());
        log::trace!("{path} written at revision {revision}");
        Ok(doc)
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("seq", &self.seq.get())
            .field("collections", &self.docs.borrow().len())
            .finish()
    }
}

impl DocumentStore for MemoryStore {
    fn get(&self, path: &DocPath) -> Result<Option<StoredDoc>> {
        Ok(self
            .docs
            .borrow()
            .get(&path.collection)
            .and_then(|collection| collection.get(&path.id))
            .cloned())
    }

    fn set(&self, path: &DocPath, data: Value) -> Result<StoredDoc> {
        self.put(path, data, false)
    }

    fn create(&self, path: &DocPath, data: Value) -> Result<StoredDoc> {
        self.put(path, data, true)
    }

    fn update_if(&self, path: &DocPath, expected_revision: u64, fields: Map<String, Value>) -> Result<StoredDoc> {
        self.check_writable(path)?;
        let mut docs = self.docs.borrow_mut();
        let doc = docs
            .get_mut(&path.collection)
            .and_then(|collection| collection.get_mut(&path.id))
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;

        if doc.revision != expected_revision {
            return Err(StoreError::Conflict {
                path: path.to_string(),
                expected: expected_revision,
                actual: doc.revision,
            });
        }

        let Value::Object(object) = &mut doc.data else {
            return Err(StoreError::Rejected(format!("{path} is not an object")));
        };
        object.extend(fields);
        doc.revision += 1;

        let seq = self.seq.get() + 1;
        self.seq.set(seq);
        log::trace!("{path} updated to revision {}", doc.revision);
        Ok(doc.clone())
    }

    fn list(&self, collection: &str) -> Result<QuerySnapshot> {
        let mut docs: Vec<StoredDoc> = self
            .docs
            .borrow()
            .get(collection)
            .map(|collection| collection.values().cloned().collect())
            .unwrap_or_default();
        docs.sort_by_key(|doc| doc.written_at);

        Ok(QuerySnapshot {
            docs,
            metadata: self.metadata.get(),
        })
    }

    fn revision(&self) -> u64 {
        self.seq.get()
    }
}
