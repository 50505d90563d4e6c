use crate::loaders::source::CsvSource;
use crate::loaders::traits::LoaderTrait;
use crate::loaders::types::{set_on_insert, OperationTally};
use crate::models::{CalendarDocument, City, Dataset, HostInfo, ListingDocument, ReviewsDocument};
use crate::store::DocumentStore;
use anyhow::Result;
use async_trait::async_trait;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use tracing::{debug, info};

/// Columns of `listings.csv` that end up in the store
#[derive(Debug, Clone, Deserialize)]
struct ListingRecord {
    id: String,
    listing_url: String,
    name: String,
    picture_url: String,
    price: String,
    description: String,
    neighbourhood_cleansed: String,
    property_type: String,
    room_type: String,
    accommodates: i64,
    #[serde(deserialize_with = "amenity_list")]
    amenities: Vec<String>,
    #[serde(default, deserialize_with = "lenient_rating")]
    review_scores_rating: f64,
    number_of_reviews: i64,
    host_id: String,
    host_url: String,
    host_name: String,
    host_picture_url: String,
}

/// Amenities arrive as a JSON array embedded in one CSV field
fn amenity_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    serde_json::from_str(&raw).map_err(D::Error::custom)
}

/// Missing or unparseable ratings become 0.0
fn lenient_rating<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|rating| rating.is_finite())
        .unwrap_or(0.0))
}

impl ListingRecord {
    fn into_listing(self, city: City) -> ListingDocument {
        ListingDocument {
            listing_id: self.id,
            url: self.listing_url,
            name: self.name,
            image: self.picture_url,
            price: self.price,
            description: self.description,
            neighborhood: self.neighbourhood_cleansed,
            city,
            property_type: self.property_type,
            room_type: self.room_type,
            accommodates: self.accommodates,
            amenities: self.amenities,
            avg_rating: self.review_scores_rating,
            total_reviews: self.number_of_reviews,
            host: HostInfo {
                id: self.host_id,
                url: self.host_url,
                name: self.host_name,
                image: self.host_picture_url,
            },
        }
    }
}

/// Loads `listings.csv`, creating each listing with its empty calendar and reviews documents
pub struct ListingLoader {
    city: City,
}

impl ListingLoader {
    pub fn new(city: City) -> Self {
        Self { city }
    }
}

#[async_trait]
impl LoaderTrait for ListingLoader {
    async fn load(
        &self,
        source: &mut CsvSource,
        store: &dyn DocumentStore,
        tally: &mut OperationTally,
    ) -> Result<()> {
        info!("Loading {} listings from {}", self.city, source.name());
        let mut rows = 0u64;

        while !tally.exhausted() {
            let Some(record) = source.next_row::<ListingRecord>()? else {
                break;
            };
            rows += 1;

            let listing = record.into_listing(self.city);
            let id = listing.listing_id.clone();
            debug!("Listing {}: {}", id, listing.name);

            set_on_insert(store, tally, Dataset::Listings, &id, &listing).await;
            set_on_insert(store, tally, Dataset::Calendar, &id, &CalendarDocument::empty(&id)).await;
            set_on_insert(store, tally, Dataset::Reviews, &id, &ReviewsDocument::empty(&id)).await;
        }

        info!("Read {} listing rows", rows);
        Ok(())
    }

    fn dataset(&self) -> Dataset {
        Dataset::Listings
    }
}
