use crate::loaders::source::CsvSource;
use crate::loaders::types::OperationTally;
use crate::models::Dataset;
use crate::store::DocumentStore;
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for all dataset loaders
/// Each loader streams one CSV file row by row and stops once the tally's limit is reached.
#[async_trait]
pub trait LoaderTrait: Send + Sync {
    /// Load every row of `source` into `store`, recording each write in `tally`
    async fn load(
        &self,
        source: &mut CsvSource,
        store: &dyn DocumentStore,
        tally: &mut OperationTally,
    ) -> Result<()>;

    /// Get the dataset this loader reads
    fn dataset(&self) -> Dataset;
}
