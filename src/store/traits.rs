use crate::models::Dataset;
use crate::store::types::{DocumentUpdate, StoreError, WriteOutcome};
use async_trait::async_trait;
use serde_json::Value;

/// Common trait for document store backends
/// Each dataset maps onto one collection; documents are JSON objects keyed by `_id`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Check that the store is reachable
    async fn ping(&self) -> Result<(), StoreError>;

    /// Insert a document unconditionally, letting the store assign its identity
    async fn insert_one(&self, dataset: Dataset, document: Value) -> Result<WriteOutcome, StoreError>;

    /// Insert `document` under `id` only if nothing is stored under that key yet
    async fn set_on_insert(
        &self,
        dataset: Dataset,
        id: &str,
        document: Value,
    ) -> Result<WriteOutcome, StoreError>;

    /// Apply `update` to the document stored under `id`; never inserts
    async fn update_one(
        &self,
        dataset: Dataset,
        id: &str,
        update: &DocumentUpdate,
    ) -> Result<WriteOutcome, StoreError>;

    /// Get the name of the backend
    fn backend_name(&self) -> &'static str;
}
