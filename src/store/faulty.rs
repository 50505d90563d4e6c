use crate::models::Dataset;
use crate::store::memory::MemoryStore;
use crate::store::traits::DocumentStore;
use crate::store::types::{DocumentUpdate, StoreError, WriteOutcome};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;

/// Memory store that rejects writes to chosen collections or keys
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    failing_datasets: HashSet<Dataset>,
    failing_ids: HashSet<String>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every write to `dataset`
    pub fn failing_dataset(mut self, dataset: Dataset) -> Self {
        self.failing_datasets.insert(dataset);
        self
    }

    /// Reject every keyed write for `id`
    pub fn failing_id(mut self, id: &str) -> Self {
        self.failing_ids.insert(id.to_string());
        self
    }

    /// The backing store, for seeding and inspecting documents
    pub fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    fn check(&self, dataset: Dataset, id: Option<&str>) -> Result<(), StoreError> {
        let id_fails = id.is_some_and(|id| self.failing_ids.contains(id));
        if self.failing_datasets.contains(&dataset) || id_fails {
            return Err(StoreError::Unavailable(format!(
                "{} write for {} rejected",
                dataset,
                id.unwrap_or("<unkeyed>")
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }

    async fn insert_one(&self, dataset: Dataset, document: Value) -> Result<WriteOutcome, StoreError> {
        self.check(dataset, None)?;
        self.inner.insert_one(dataset, document).await
    }

    async fn set_on_insert(
        &self,
        dataset: Dataset,
        id: &str,
        document: Value,
    ) -> Result<WriteOutcome, StoreError> {
        self.check(dataset, Some(id))?;
        self.inner.set_on_insert(dataset, id, document).await
    }

    async fn update_one(
        &self,
        dataset: Dataset,
        id: &str,
        update: &DocumentUpdate,
    ) -> Result<WriteOutcome, StoreError> {
        self.check(dataset, Some(id))?;
        self.inner.update_one(dataset, id, update).await
    }

    fn backend_name(&self) -> &'static str {
        "faulty"
    }
}
