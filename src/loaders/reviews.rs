use crate::loaders::source::CsvSource;
use crate::loaders::traits::LoaderTrait;
use crate::loaders::types::OperationTally;
use crate::models::{Dataset, ReviewComment};
use crate::store::{DocumentStore, DocumentUpdate};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct ReviewRecord {
    listing_id: String,
    date: NaiveDate,
    reviewer_id: String,
    reviewer_name: String,
    #[serde(default)]
    comments: String,
}

/// Loads `reviews.csv`, appending comments to reviews documents created by the listing load
#[derive(Default)]
pub struct ReviewLoader;

impl ReviewLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LoaderTrait for ReviewLoader {
    async fn load(
        &self,
        source: &mut CsvSource,
        store: &dyn DocumentStore,
        tally: &mut OperationTally,
    ) -> Result<()> {
        info!("Loading reviews from {}", source.name());
        let mut rows = 0u64;

        while !tally.exhausted() {
            let Some(record) = source.next_row::<ReviewRecord>()? else {
                break;
            };
            rows += 1;

            let comment = ReviewComment {
                reviewer_id: record.reviewer_id,
                reviewer_name: record.reviewer_name,
                date: record.date,
                text: record.comments,
            };
            let result = match DocumentUpdate::new().add_to_set("comments", &comment) {
                Ok(update) => store.update_one(Dataset::Reviews, &record.listing_id, &update).await,
                Err(err) => Err(err),
            };
            tally.record(Dataset::Reviews, &record.listing_id, result);
        }

        info!("Read {} review rows", rows);
        Ok(())
    }

    fn dataset(&self) -> Dataset {
        Dataset::Reviews
    }
}
