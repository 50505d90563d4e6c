pub mod calendar;
pub mod compactor;
pub mod listings;
pub mod neighbourhoods;
pub mod reviews;
pub mod source;
pub mod traits;
pub mod types;

pub use calendar::CalendarLoader;
pub use listings::ListingLoader;
pub use neighbourhoods::NeighbourhoodLoader;
pub use reviews::ReviewLoader;
pub use source::CsvSource;
pub use traits::LoaderTrait;
pub use types::{LoadOptions, OperationTally};

use crate::models::{City, Dataset};

/// Pick the loader for a dataset
pub fn loader_for(dataset: Dataset, city: City, options: &LoadOptions) -> Box<dyn LoaderTrait> {
    match dataset {
        Dataset::Calendar => Box::new(CalendarLoader::new(options)),
        Dataset::Listings => Box::new(ListingLoader::new(city)),
        Dataset::Neighbourhoods => Box::new(NeighbourhoodLoader::new(city)),
        Dataset::Reviews => Box::new(ReviewLoader::new()),
    }
}
