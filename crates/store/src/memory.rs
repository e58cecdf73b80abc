use crate::error::StoreError;
use crate::store::DocumentStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
struct Collection {
    order: Vec<String>,
    documents: HashMap<String, Vec<u8>>,
}

/// In-process store for tests and for running without a database.
///
/// Keeps insertion order per collection. [`MemoryStore::set_unavailable`]
/// makes every call fail as if the backend were unreachable.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Collection>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Number of documents in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .await
            .get(collection)
            .map_or(0, |c| c.order.len())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("no reachable servers".to_string()));
        }
        Ok(())
    }
}

fn not_found(collection: &str, key: &str) -> StoreError {
    StoreError::NotFound {
        collection: collection.to_string(),
        key: key.to_string(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn append(
        &self,
        collection: &str,
        key: &str,
        document: &[u8],
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut collections = self.collections.lock().await;
        let coll = collections.entry(collection.to_string()).or_default();

        if coll.documents.contains_key(key) {
            return Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                key: key.to_string(),
            });
        }
        coll.order.push(key.to_string());
        coll.documents.insert(key.to_string(), document.to_vec());
        Ok(())
    }

    async fn read_all(&self, collection: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        self.check_available()?;
        let collections = self.collections.lock().await;
        let Some(coll) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(coll
            .order
            .iter()
            .filter_map(|key| coll.documents.get(key).cloned())
            .collect())
    }

    async fn update(
        &self,
        collection: &str,
        key: &str,
        document: &[u8],
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut collections = self.collections.lock().await;
        let slot = collections
            .get_mut(collection)
            .and_then(|c| c.documents.get_mut(key))
            .ok_or_else(|| not_found(collection, key))?;
        *slot = document.to_vec();
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let mut collections = self.collections.lock().await;
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| not_found(collection, key))?;
        if coll.documents.remove(key).is_none() {
            return Err(not_found(collection, key));
        }
        coll.order.retain(|k| k != key);
        Ok(())
    }
}
