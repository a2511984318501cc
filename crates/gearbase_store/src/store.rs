//! The collection store.

use crate::dir::DataDir;
use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Generic CRUD over named collections of schemaless records.
///
/// Each collection is persisted as one `<name>.json` file holding an
/// insertion-ordered array of objects. Reads are served from a cache owned
/// by this instance; every mutation rewrites the whole backing file.
///
/// # Concurrency
///
/// Every read-modify-write runs under a per-collection mutex, so two
/// concurrent mutations of the same collection serialize instead of
/// clobbering each other. Mutations of different collections proceed in
/// parallel. Nothing spans two collections atomically.
///
/// # Example
///
/// ```rust,ignore
/// use gearbase_store::{CollectionStore, Record};
///
/// let store = CollectionStore::open(Path::new("data"))?;
/// let mut rec = Record::new();
/// rec.set("asset_id", "CAM001");
/// rec.set("status", "available");
/// let saved = store.insert("assets", rec)?;
/// assert!(saved.id().is_some());
/// ```
pub struct CollectionStore {
    /// Data directory (holds the advisory lock).
    dir: DataDir,
    /// One cell per materialized collection.
    collections: RwLock<HashMap<String, Arc<CollectionCell>>>,
}

/// Cache slot and lock for one collection.
struct CollectionCell {
    name: String,
    path: PathBuf,
    /// `None` until first load; `Some` mirrors the backing file.
    records: Mutex<Option<Vec<Record>>>,
}

impl CollectionCell {
    /// Loads the cached sequence, reading the backing file on first use.
    ///
    /// Caller must hold the cell mutex.
    fn materialize(&self, cache: &mut Option<Vec<Record>>) -> StoreResult<()> {
        if cache.is_some() {
            return Ok(());
        }

        let records = if self.path.exists() {
            let content = fs::read_to_string(&self.path)?;
            if content.trim().is_empty() {
                // A created-but-never-written file is benign.
                Vec::new()
            } else {
                serde_json::from_str::<Vec<Record>>(&content)
                    .map_err(|e| StoreError::corrupt(&self.name, e.to_string()))?
            }
        } else {
            Vec::new()
        };

        debug!(collection = %self.name, count = records.len(), "loaded collection");
        *cache = Some(records);
        Ok(())
    }

    /// Writes the full sequence to the backing file, then updates the cache.
    ///
    /// Caller must hold the cell mutex.
    fn persist(&self, cache: &mut Option<Vec<Record>>, records: Vec<Record>) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(&records)
            .map_err(|e| StoreError::corrupt(&self.name, e.to_string()))?;
        fs::write(&self.path, bytes)?;
        debug!(collection = %self.name, count = records.len(), "persisted collection");
        *cache = Some(records);
        Ok(())
    }
}

impl CollectionStore {
    /// Opens a store over the given data directory.
    ///
    /// Creates the directory if missing and acquires its exclusive lock.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryLocked` if another store owns the directory, or
    /// an I/O error if the directory cannot be created or locked.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let dir = DataDir::open(path)?;
        Ok(Self {
            dir,
            collections: RwLock::new(HashMap::new()),
        })
    }

    /// Returns the data directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns all records of a collection in insertion order.
    ///
    /// A missing backing file is not an error: it yields the empty
    /// sequence. A malformed backing file is a hard [`StoreError::Corrupt`].
    pub fn get_all(&self, collection: &str) -> StoreResult<Vec<Record>> {
        let cell = self.cell(collection);
        let mut cache = cell.records.lock();
        cell.materialize(&mut cache)?;
        Ok(cache.as_ref().map(|r| r.clone()).unwrap_or_default())
    }

    /// Replaces a collection's full record sequence.
    pub fn save_all(&self, collection: &str, records: Vec<Record>) -> StoreResult<()> {
        let cell = self.cell(collection);
        let mut cache = cell.records.lock();
        cell.persist(&mut cache, records)
    }

    /// Finds the first record whose field equals the given value.
    pub fn find(&self, collection: &str, field: &str, value: &Value) -> StoreResult<Option<Record>> {
        Ok(self
            .get_all(collection)?
            .into_iter()
            .find(|r| r.matches(field, value)))
    }

    /// Finds a record by its numeric `id`.
    pub fn find_by_id(&self, collection: &str, id: u64) -> StoreResult<Option<Record>> {
        self.find(collection, "id", &Value::from(id))
    }

    /// Inserts a record, assigning an `id` and stamping timestamps.
    ///
    /// If the record carries no `id` field, the next numeric id
    /// (`max + 1` over existing numeric ids) is assigned. `created_at` is
    /// stamped if absent; `updated_at` always. Returns the stored record.
    pub fn insert(&self, collection: &str, record: Record) -> StoreResult<Record> {
        let cell = self.cell(collection);
        let mut cache = cell.records.lock();
        cell.materialize(&mut cache)?;
        let mut records = cache.take().unwrap_or_default();

        let mut record = record;
        if record.get("id").is_none() {
            let max_id = records.iter().filter_map(Record::id).max().unwrap_or(0);
            record.set("id", max_id + 1);
        }
        record.stamp_inserted();

        records.push(record.clone());
        cell.persist(&mut cache, records)?;
        Ok(record)
    }

    /// Merge-updates the first record whose field equals the given value.
    ///
    /// Fields present in `patch` overwrite the record's fields;
    /// `updated_at` is refreshed. Returns the updated record, or `None`
    /// if no record matched.
    pub fn update(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
        patch: Record,
    ) -> StoreResult<Option<Record>> {
        let cell = self.cell(collection);
        let mut cache = cell.records.lock();
        cell.materialize(&mut cache)?;
        let mut records = cache.take().unwrap_or_default();

        let mut updated = None;
        for record in &mut records {
            if record.matches(field, value) {
                record.merge(&patch);
                record.stamp_updated();
                updated = Some(record.clone());
                break;
            }
        }

        if updated.is_some() {
            cell.persist(&mut cache, records)?;
        } else {
            *cache = Some(records);
        }
        Ok(updated)
    }

    /// Merge-updates a record by its numeric `id`.
    pub fn update_by_id(
        &self,
        collection: &str,
        id: u64,
        patch: Record,
    ) -> StoreResult<Option<Record>> {
        self.update(collection, "id", &Value::from(id), patch)
    }

    /// Deletes all records whose field equals the given value.
    ///
    /// Returns true if anything was deleted.
    pub fn delete(&self, collection: &str, field: &str, value: &Value) -> StoreResult<bool> {
        let cell = self.cell(collection);
        let mut cache = cell.records.lock();
        cell.materialize(&mut cache)?;
        let mut records = cache.take().unwrap_or_default();

        let before = records.len();
        records.retain(|r| !r.matches(field, value));

        if records.len() < before {
            cell.persist(&mut cache, records)?;
            Ok(true)
        } else {
            *cache = Some(records);
            Ok(false)
        }
    }

    /// Deletes a record by its numeric `id`.
    pub fn delete_by_id(&self, collection: &str, id: u64) -> StoreResult<bool> {
        self.delete(collection, "id", &Value::from(id))
    }

    /// Returns the number of records in a collection.
    pub fn count(&self, collection: &str) -> StoreResult<usize> {
        Ok(self.get_all(collection)?.len())
    }

    /// Drops a collection's cache entry so the next read hits the file.
    ///
    /// Only needed when the backing file was modified out-of-band.
    pub fn invalidate(&self, collection: &str) {
        if let Some(cell) = self.collections.read().get(collection) {
            *cell.records.lock() = None;
        }
    }

    /// Returns the cell for a collection, creating it on first use.
    fn cell(&self, collection: &str) -> Arc<CollectionCell> {
        if let Some(cell) = self.collections.read().get(collection) {
            return Arc::clone(cell);
        }

        let mut map = self.collections.write();
        Arc::clone(map.entry(collection.to_string()).or_insert_with(|| {
            Arc::new(CollectionCell {
                name: collection.to_string(),
                path: self.dir.collection_path(collection),
                records: Mutex::new(None),
            })
        }))
    }
}

impl std::fmt::Debug for CollectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionStore")
            .field("path", &self.dir.path())
            .field("materialized", &self.collections.read().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::{tempdir, TempDir};

    fn create_store() -> (CollectionStore, TempDir) {
        let temp = tempdir().unwrap();
        let store = CollectionStore::open(temp.path()).unwrap();
        (store, temp)
    }

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn missing_file_yields_empty() {
        let (store, _temp) = create_store();
        assert!(store.get_all("assets").unwrap().is_empty());
    }

    #[test]
    fn idempotent_read() {
        let (store, _temp) = create_store();
        store
            .insert("assets", record(&[("name", json!("Camera"))]))
            .unwrap();

        let first = store.get_all("assets").unwrap();
        let second = store.get_all("assets").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn insert_round_trip() {
        let (store, _temp) = create_store();

        let input = record(&[("name", json!("Tripod")), ("category", json!("Tripod"))]);
        let saved = store.insert("assets", input).unwrap();

        // Input fields plus exactly id, created_at, updated_at.
        assert_eq!(saved.len(), 5);
        assert_eq!(saved.id(), Some(1));
        assert!(saved.get_str("created_at").is_some());
        assert!(saved.get_str("updated_at").is_some());

        let read_back = store.get_all("assets").unwrap();
        assert_eq!(read_back, vec![saved]);
    }

    #[test]
    fn insert_assigns_max_plus_one() {
        let (store, _temp) = create_store();

        let a = store.insert("items", Record::new()).unwrap();
        let b = store.insert("items", Record::new()).unwrap();
        assert_eq!(a.id(), Some(1));
        assert_eq!(b.id(), Some(2));

        store.delete_by_id("items", 1).unwrap();
        let c = store.insert("items", Record::new()).unwrap();
        assert_eq!(c.id(), Some(3));
    }

    #[test]
    fn insert_keeps_supplied_key() {
        let (store, _temp) = create_store();

        let saved = store
            .insert("reservations", record(&[("id", json!("REQ-AB12CD34"))]))
            .unwrap();
        assert_eq!(saved.get_str("id"), Some("REQ-AB12CD34"));
        assert!(saved.id().is_none());
    }

    #[test]
    fn update_merges_fields() {
        let (store, _temp) = create_store();
        store
            .insert(
                "assets",
                record(&[("asset_id", json!("CAM001")), ("status", json!("available"))]),
            )
            .unwrap();

        let updated = store
            .update(
                "assets",
                "asset_id",
                &json!("CAM001"),
                record(&[("status", json!("checked_out"))]),
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.get_str("status"), Some("checked_out"));
        assert_eq!(updated.get_str("asset_id"), Some("CAM001"));
    }

    #[test]
    fn update_missing_returns_none() {
        let (store, _temp) = create_store();
        let result = store
            .update("assets", "asset_id", &json!("NOPE"), Record::new())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn delete_removes_record() {
        let (store, _temp) = create_store();
        store
            .insert("assets", record(&[("asset_id", json!("CAM001"))]))
            .unwrap();

        assert!(store.delete("assets", "asset_id", &json!("CAM001")).unwrap());
        assert!(!store.delete("assets", "asset_id", &json!("CAM001")).unwrap());
        assert!(store.get_all("assets").unwrap().is_empty());
    }

    #[test]
    fn typing_preserved_across_persistence() {
        let temp = tempdir().unwrap();

        {
            let store = CollectionStore::open(temp.path()).unwrap();
            store
                .insert(
                    "assets",
                    record(&[("serial_number", json!("007")), ("shelf", json!(7))]),
                )
                .unwrap();
        }

        let store = CollectionStore::open(temp.path()).unwrap();
        let records = store.get_all("assets").unwrap();
        assert_eq!(records[0].get_str("serial_number"), Some("007"));
        assert_eq!(records[0].get_u64("shelf"), Some(7));
    }

    #[test]
    fn corrupt_file_is_a_hard_error() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("assets.json"), b"{ not an array").unwrap();

        let store = CollectionStore::open(temp.path()).unwrap();
        let result = store.get_all("assets");
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn empty_file_is_empty_collection() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("assets.json"), b"").unwrap();

        let store = CollectionStore::open(temp.path()).unwrap();
        assert!(store.get_all("assets").unwrap().is_empty());
    }

    #[test]
    fn find_is_exact_on_type() {
        let (store, _temp) = create_store();
        store.insert("items", record(&[("code", json!(5))])).unwrap();

        assert!(store.find("items", "code", &json!(5)).unwrap().is_some());
        assert!(store.find("items", "code", &json!("5")).unwrap().is_none());
    }

    #[test]
    fn concurrent_inserts_get_distinct_ids() {
        let (store, _temp) = create_store();
        let store = std::sync::Arc::new(store);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        store.insert("items", Record::new()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut ids: Vec<u64> = store
            .get_all("items")
            .unwrap()
            .iter()
            .filter_map(Record::id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 40);
    }

    #[test]
    fn invalidate_reloads_from_disk() {
        let (store, temp) = create_store();
        store.insert("items", Record::new()).unwrap();

        // Out-of-band edit.
        std::fs::write(temp.path().join("items.json"), b"[]").unwrap();
        assert_eq!(store.count("items").unwrap(), 1);

        store.invalidate("items");
        assert_eq!(store.count("items").unwrap(), 0);
    }
}
