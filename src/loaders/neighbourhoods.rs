use crate::loaders::source::CsvSource;
use crate::loaders::traits::LoaderTrait;
use crate::loaders::types::OperationTally;
use crate::models::{City, Dataset, NeighbourhoodDocument};
use crate::store::DocumentStore;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct NeighbourhoodRecord {
    #[serde(default)]
    neighbourhood_group: String,
    neighbourhood: String,
}

/// Loads `neighbourhoods.csv`; rows carry no identity, so every run appends
pub struct NeighbourhoodLoader {
    city: City,
}

impl NeighbourhoodLoader {
    pub fn new(city: City) -> Self {
        Self { city }
    }
}

#[async_trait]
impl LoaderTrait for NeighbourhoodLoader {
    async fn load(
        &self,
        source: &mut CsvSource,
        store: &dyn DocumentStore,
        tally: &mut OperationTally,
    ) -> Result<()> {
        info!("Loading {} neighbourhoods from {}", self.city, source.name());
        let mut rows = 0u64;

        while !tally.exhausted() {
            let Some(record) = source.next_row::<NeighbourhoodRecord>()? else {
                break;
            };
            rows += 1;

            let document = NeighbourhoodDocument {
                city: self.city,
                neighbourhood_group: record.neighbourhood_group,
                neighbourhood: record.neighbourhood,
            };
            let label = document.label();
            let result = match serde_json::to_value(&document) {
                Ok(value) => store.insert_one(Dataset::Neighbourhoods, value).await,
                Err(err) => Err(err.into()),
            };
            tally.record(Dataset::Neighbourhoods, &label, result);
        }

        info!("Read {} neighbourhood rows", rows);
        Ok(())
    }

    fn dataset(&self) -> Dataset {
        Dataset::Neighbourhoods
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::faulty::FaultyStore;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::io::Cursor;

    fn source() -> CsvSource {
        CsvSource::from_reader(
            "neighbourhoods.csv",
            Cursor::new("neighbourhood_group,neighbourhood\nCentral,Downtown\n,Pearl\n"),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn rows_become_city_scoped_documents() {
        let store = MemoryStore::new();
        let mut tally = OperationTally::with_limit(10);

        NeighbourhoodLoader::new(City::Portland)
            .load(&mut source(), &store, &mut tally)
            .await
            .unwrap();

        assert_eq!(
            store.documents(Dataset::Neighbourhoods),
            vec![
                json!({"city": "portland", "neighbourhood_group": "Central", "neighbourhood": "Downtown"}),
                json!({"city": "portland", "neighbourhood_group": "", "neighbourhood": "Pearl"}),
            ]
        );
        assert_eq!(tally.attempted(), 2);
    }

    #[tokio::test]
    async fn rerunning_appends_duplicates() {
        let store = MemoryStore::new();
        let loader = NeighbourhoodLoader::new(City::Salem);

        for _ in 0..2 {
            let mut tally = OperationTally::with_limit(10);
            loader.load(&mut source(), &store, &mut tally).await.unwrap();
        }

        assert_eq!(store.count(Dataset::Neighbourhoods), 4);
    }

    #[tokio::test]
    async fn limit_bounds_inserts() {
        let store = MemoryStore::new();
        let mut tally = OperationTally::with_limit(1);

        NeighbourhoodLoader::new(City::Salem)
            .load(&mut source(), &store, &mut tally)
            .await
            .unwrap();

        assert_eq!(store.count(Dataset::Neighbourhoods), 1);
        assert_eq!(tally.attempted(), 1);
    }

    #[tokio::test]
    async fn failed_inserts_still_count_toward_the_limit() {
        let store = FaultyStore::new().failing_dataset(Dataset::Neighbourhoods);
        let mut tally = OperationTally::with_limit(10);

        NeighbourhoodLoader::new(City::Portland)
            .load(&mut source(), &store, &mut tally)
            .await
            .unwrap();

        assert_eq!(tally.attempted(), 2);
        assert_eq!(tally.failed(), 2);
        assert_eq!(store.memory().count(Dataset::Neighbourhoods), 0);
    }
}
