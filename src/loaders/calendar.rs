use crate::loaders::compactor::{ClosedPeriod, PeriodCompactor};
use crate::loaders::source::CsvSource;
use crate::loaders::traits::LoaderTrait;
use crate::loaders::types::{LoadOptions, OperationTally};
use crate::models::{AvailabilityRow, Dataset};
use crate::store::{DocumentStore, DocumentUpdate, StoreError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

/// Loads `calendar.csv`, merging availability periods into each listing's calendar document
pub struct CalendarLoader {
    split_on_date_gap: bool,
    flush_trailing_period: bool,
}

impl CalendarLoader {
    pub fn new(options: &LoadOptions) -> Self {
        Self {
            split_on_date_gap: options.split_on_date_gap,
            flush_trailing_period: options.flush_trailing_period,
        }
    }

    fn period_update(closed: &ClosedPeriod) -> Result<DocumentUpdate, StoreError> {
        let (min_nights, max_nights) = closed.stay_bounds().map_err(|err| {
            StoreError::InvalidDocument(format!(
                "stay bounds '{}'/'{}': {}",
                closed.min_nights, closed.max_nights, err
            ))
        })?;
        DocumentUpdate::new()
            .set("min_nights", min_nights)?
            .set("max_nights", max_nights)?
            .add_to_set("availability_periods", &closed.period)
    }

    async fn flush(store: &dyn DocumentStore, tally: &mut OperationTally, closed: ClosedPeriod) {
        debug!(
            "Closing period {} -> {} ({} nights) for listing {}",
            closed.period.start_date,
            closed.period.end_date,
            closed.period.total_nights,
            closed.listing_id
        );
        let result = match Self::period_update(&closed) {
            Ok(update) => store.update_one(Dataset::Calendar, &closed.listing_id, &update).await,
            Err(err) => Err(err),
        };
        tally.record(Dataset::Calendar, &closed.listing_id, result);
    }
}

#[async_trait]
impl LoaderTrait for CalendarLoader {
    async fn load(
        &self,
        source: &mut CsvSource,
        store: &dyn DocumentStore,
        tally: &mut OperationTally,
    ) -> Result<()> {
        info!("Compacting calendar rows from {}", source.name());

        let mut compactor = PeriodCompactor::new(self.split_on_date_gap);
        let mut rows = 0u64;

        while !tally.exhausted() {
            let Some(row) = source.next_row::<AvailabilityRow>()? else {
                if self.flush_trailing_period {
                    if let Some(closed) = compactor.finish() {
                        Self::flush(store, tally, closed).await;
                    }
                } else if let Some(open) = compactor.open_period() {
                    debug!(
                        "End of input, leaving period starting {} unflushed",
                        open.start_date
                    );
                }
                info!("Read {} calendar rows", rows);
                return Ok(());
            };
            rows += 1;

            let closed = compactor
                .push(row)
                .with_context(|| format!("{} is not sorted by listing and date", source.name()))?;
            if let Some(closed) = closed {
                Self::flush(store, tally, closed).await;
            }
        }

        info!(
            "Operation limit {} reached after {} calendar rows; open period dropped",
            tally.limit(),
            rows
        );
        Ok(())
    }

    fn dataset(&self) -> Dataset {
        Dataset::Calendar
    }
}
