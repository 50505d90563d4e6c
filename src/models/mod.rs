use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Cities with a published dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum City {
    LosAngeles,
    Portland,
    Salem,
    SanDiego,
}

impl City {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::LosAngeles => "los-angeles",
            Self::Portland => "portland",
            Self::Salem => "salem",
            Self::SanDiego => "san-diego",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// A CSV dataset, loaded into the collection of the same name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Calendar,
    Listings,
    Neighbourhoods,
    Reviews,
}

impl Dataset {
    /// Collection name in the document store
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Listings => "listings",
            Self::Neighbourhoods => "neighbourhoods",
            Self::Reviews => "reviews",
        }
    }

    /// Location of this dataset's CSV file for a city, e.g. `<root>/salem/reviews.csv`
    pub fn csv_path(&self, data_root: &Path, city: City) -> PathBuf {
        data_root
            .join(city.slug())
            .join(format!("{}.csv", self.collection()))
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}

/// One calendar row: a listing's availability on a single day.
///
/// The stay bounds stay raw text; they are only read for the row that closes a period.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AvailabilityRow {
    pub listing_id: String,
    pub date: NaiveDate,
    #[serde(deserialize_with = "availability_flag")]
    pub available: bool,
    #[serde(default)]
    pub minimum_nights: String,
    #[serde(default)]
    pub maximum_nights: String,
}

/// The source marks available days with `t`; every other value counts as unavailable.
fn availability_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw == "t")
}

/// A run of consecutive days for one listing sharing the same availability.
///
/// Dates are stored as `YYYY-MM-DD` strings in every backend, not as BSON datetimes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub available: bool,
    pub total_nights: u32,
}

impl AvailabilityPeriod {
    /// A one-night period starting and ending on `date`
    pub fn starting(date: NaiveDate, available: bool) -> Self {
        Self {
            start_date: date,
            end_date: date,
            available,
            total_nights: 1,
        }
    }

    /// Move the end of the period to `date`, counting one more night.
    pub fn extend_to(&mut self, date: NaiveDate) {
        self.end_date = date;
        self.total_nights += 1;
    }
}

/// Per-listing calendar document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarDocument {
    #[serde(rename = "_id")]
    pub listing_id: String,
    pub min_nights: i64,
    pub max_nights: i64,
    pub availability_periods: Vec<AvailabilityPeriod>,
}

impl CalendarDocument {
    pub fn empty(listing_id: impl Into<String>) -> Self {
        Self {
            listing_id: listing_id.into(),
            min_nights: 0,
            max_nights: 0,
            availability_periods: Vec::new(),
        }
    }
}

/// Host details embedded in a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostInfo {
    #[serde(rename = "host_id")]
    pub id: String,
    #[serde(rename = "host_url")]
    pub url: String,
    #[serde(rename = "host_name")]
    pub name: String,
    #[serde(rename = "host_image")]
    pub image: String,
}

/// Core listing document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDocument {
    #[serde(rename = "_id")]
    pub listing_id: String,
    #[serde(rename = "listing_url")]
    pub url: String,
    #[serde(rename = "listing_name")]
    pub name: String,
    #[serde(rename = "listing_image")]
    pub image: String,
    pub price: String,
    pub description: String,
    pub neighborhood: String,
    pub city: City,
    pub property_type: String,
    pub room_type: String,
    pub accommodates: i64,
    pub amenities: Vec<String>,
    pub avg_rating: f64,
    pub total_reviews: i64,
    #[serde(rename = "host_info")]
    pub host: HostInfo,
}

/// Neighbourhood document; carries no identity key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighbourhoodDocument {
    pub city: City,
    pub neighbourhood_group: String,
    pub neighbourhood: String,
}

impl NeighbourhoodDocument {
    /// `<city>/<neighbourhood>`, used to name the document in logs
    pub fn label(&self) -> String {
        format!("{}/{}", self.city, self.neighbourhood)
    }
}

/// A single guest review; `date` is stored as a `YYYY-MM-DD` string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    pub reviewer_id: String,
    pub reviewer_name: String,
    pub date: NaiveDate,
    #[serde(rename = "comments")]
    pub text: String,
}

/// Per-listing reviews document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewsDocument {
    #[serde(rename = "_id")]
    pub listing_id: String,
    pub comments: Vec<ReviewComment>,
}

impl ReviewsDocument {
    pub fn empty(listing_id: impl Into<String>) -> Self {
        Self {
            listing_id: listing_id.into(),
            comments: Vec::new(),
        }
    }
}
