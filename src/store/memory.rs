use crate::models::Dataset;
use crate::store::traits::DocumentStore;
use crate::store::types::{DocumentUpdate, StoreError, WriteOutcome};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct MemoryCollection {
    keyed: BTreeMap<String, Value>,
    unkeyed: Vec<Value>,
}

/// In-process document store with the same write semantics as the MongoDB backend
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Dataset, MemoryCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Dataset, MemoryCollection>>, StoreError> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    /// Fetch the document stored under `id`
    #[cfg(test)]
    pub fn get(&self, dataset: Dataset, id: &str) -> Option<Value> {
        let collections = self.lock().ok()?;
        collections.get(&dataset)?.keyed.get(id).cloned()
    }

    /// Number of documents in a collection, keyed or not
    pub fn count(&self, dataset: Dataset) -> usize {
        self.lock()
            .ok()
            .and_then(|collections| {
                collections
                    .get(&dataset)
                    .map(|c| c.keyed.len() + c.unkeyed.len())
            })
            .unwrap_or(0)
    }

    /// All documents of a collection: keyed ones in key order, then unkeyed ones in insert order
    pub fn documents(&self, dataset: Dataset) -> Vec<Value> {
        let Ok(collections) = self.lock() else {
            return Vec::new();
        };
        collections
            .get(&dataset)
            .map(|c| c.keyed.values().chain(c.unkeyed.iter()).cloned().collect())
            .unwrap_or_default()
    }
}

fn as_object(document: Value) -> Result<Map<String, Value>, StoreError> {
    match document {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Backend(format!(
            "documents must be JSON objects, got {}",
            other
        ))),
    }
}

fn apply_update(document: &mut Map<String, Value>, update: &DocumentUpdate) -> Result<bool, StoreError> {
    let mut changed = false;

    for (field, value) in &update.set {
        if document.get(field) != Some(value) {
            document.insert(field.clone(), value.clone());
            changed = true;
        }
    }

    for (field, value) in &update.add_to_set {
        let slot = document
            .entry(field.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        let Value::Array(items) = slot else {
            return Err(StoreError::Backend(format!(
                "cannot add to non-array field '{}'",
                field
            )));
        };
        if !items.contains(value) {
            items.push(value.clone());
            changed = true;
        }
    }

    Ok(changed)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    async fn insert_one(&self, dataset: Dataset, document: Value) -> Result<WriteOutcome, StoreError> {
        let document = as_object(document)?;
        let mut collections = self.lock()?;
        let collection = collections.entry(dataset).or_default();

        let id = document.get("_id").and_then(Value::as_str).map(str::to_string);
        match id {
            Some(id) if collection.keyed.contains_key(&id) => Err(StoreError::Backend(format!(
                "duplicate key '{}' in {}",
                id, dataset
            ))),
            Some(id) => {
                collection.keyed.insert(id, Value::Object(document));
                Ok(WriteOutcome::Inserted)
            }
            None => {
                collection.unkeyed.push(Value::Object(document));
                Ok(WriteOutcome::Inserted)
            }
        }
    }

    async fn set_on_insert(
        &self,
        dataset: Dataset,
        id: &str,
        document: Value,
    ) -> Result<WriteOutcome, StoreError> {
        let mut document = as_object(document)?;
        let mut collections = self.lock()?;
        let collection = collections.entry(dataset).or_default();

        if collection.keyed.contains_key(id) {
            debug!("{} document {} already present", dataset, id);
            return Ok(WriteOutcome::Unchanged);
        }

        document.insert("_id".to_string(), Value::String(id.to_string()));
        collection.keyed.insert(id.to_string(), Value::Object(document));
        Ok(WriteOutcome::Inserted)
    }

    async fn update_one(
        &self,
        dataset: Dataset,
        id: &str,
        update: &DocumentUpdate,
    ) -> Result<WriteOutcome, StoreError> {
        let mut collections = self.lock()?;
        let Some(Value::Object(document)) = collections
            .get_mut(&dataset)
            .and_then(|c| c.keyed.get_mut(id))
        else {
            return Ok(WriteOutcome::NotMatched);
        };

        if apply_update(document, update)? {
            Ok(WriteOutcome::Modified)
        } else {
            Ok(WriteOutcome::Unchanged)
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
