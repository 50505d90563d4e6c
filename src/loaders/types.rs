use crate::models::Dataset;
use crate::store::{DocumentStore, StoreError, WriteOutcome};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Options shared by all loaders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Directory holding one sub-directory of CSV files per city
    pub data_root: PathBuf,
    /// Flush the calendar period still open when the input runs out
    pub flush_trailing_period: bool,
    /// Close a calendar period when dates skip a day, even if availability is unchanged
    pub split_on_date_gap: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("../AirBnB-Datasets"),
            flush_trailing_period: false,
            split_on_date_gap: false,
        }
    }
}

/// Per-run write accounting, bounded by a limit on attempted writes.
///
/// Every write counts as attempted; the outcome then lands in exactly one of
/// `succeeded`, `unmatched` or `failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationTally {
    limit: u64,
    attempted: u64,
    succeeded: u64,
    unmatched: u64,
    failed: u64,
}

impl OperationTally {
    pub fn with_limit(limit: u64) -> Self {
        Self {
            limit,
            attempted: 0,
            succeeded: 0,
            unmatched: 0,
            failed: 0,
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn attempted(&self) -> u64 {
        self.attempted
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded
    }

    /// Identity-only updates that found no document to apply to
    pub fn unmatched(&self) -> u64 {
        self.unmatched
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// True once the attempted count has reached the limit
    pub fn exhausted(&self) -> bool {
        self.attempted >= self.limit
    }

    /// Count one attempted write and classify its result
    pub fn record(&mut self, dataset: Dataset, id: &str, result: Result<WriteOutcome, StoreError>) {
        self.attempted += 1;
        match result {
            Ok(WriteOutcome::NotMatched) => {
                debug!("{} update for {} matched no document", dataset, id);
                self.unmatched += 1;
            }
            Ok(outcome) => {
                debug!("{} write for {}: {:?}", dataset, id, outcome);
                self.succeeded += 1;
            }
            Err(err) => {
                warn!("{} write for {} failed: {}", dataset, id, err);
                self.failed += 1;
            }
        }
    }
}

/// Serialize `document` and insert it under `id` unless already present, recording the attempt
pub async fn set_on_insert<T: Serialize + Sync>(
    store: &dyn DocumentStore,
    tally: &mut OperationTally,
    dataset: Dataset,
    id: &str,
    document: &T,
) {
    let result = match serde_json::to_value(document) {
        Ok(value) => store.set_on_insert(dataset, id, value).await,
        Err(err) => Err(err.into()),
    };
    tally.record(dataset, id, result);
}
