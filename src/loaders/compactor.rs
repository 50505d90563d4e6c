use crate::models::{AvailabilityPeriod, AvailabilityRow};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::num::ParseIntError;
use thiserror::Error;

/// A finished availability period, ready to be merged into its listing's calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedPeriod {
    pub listing_id: String,
    /// Stated bounds of the last row inside the period, as read from the CSV
    pub min_nights: String,
    pub max_nights: String,
    pub period: AvailabilityPeriod,
}

impl ClosedPeriod {
    /// Parse the minimum and maximum nights
    pub fn stay_bounds(&self) -> Result<(i64, i64), ParseIntError> {
        Ok((
            self.min_nights.trim().parse()?,
            self.max_nights.trim().parse()?,
        ))
    }
}

/// Input that is not grouped by listing with ascending dates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderViolation {
    #[error("listing {listing_id}: date {date} does not come after {previous}")]
    DateNotAscending {
        listing_id: String,
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("listing {0} reappears after other listings")]
    ListingRevisited(String),
}

/// Run-length encodes per-day availability rows into periods.
///
/// Rows must arrive grouped by listing with strictly ascending dates. A period
/// stays open while the listing and the availability flag repeat; it is closed
/// and returned by [`push`](Self::push) on the first row that differs. The last
/// open period is only returned by [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct PeriodCompactor {
    split_on_date_gap: bool,
    current: Option<AvailabilityPeriod>,
    previous: Option<AvailabilityRow>,
    finished_listings: HashSet<String>,
}

impl PeriodCompactor {
    /// With `split_on_date_gap` unset, a skipped day with an unchanged flag still extends the period.
    pub fn new(split_on_date_gap: bool) -> Self {
        Self {
            split_on_date_gap,
            ..Self::default()
        }
    }

    /// The period being built, if any
    pub fn open_period(&self) -> Option<&AvailabilityPeriod> {
        self.current.as_ref()
    }

    /// Feed the next row, returning the period it closes, if any
    pub fn push(&mut self, row: AvailabilityRow) -> Result<Option<ClosedPeriod>, OrderViolation> {
        let (Some(previous), Some(current)) = (self.previous.as_ref(), self.current.as_mut()) else {
            self.open(row);
            return Ok(None);
        };

        let same_listing = row.listing_id == previous.listing_id;
        if same_listing && row.date <= previous.date {
            return Err(OrderViolation::DateNotAscending {
                listing_id: row.listing_id,
                previous: previous.date,
                date: row.date,
            });
        }
        if !same_listing && self.finished_listings.contains(&row.listing_id) {
            return Err(OrderViolation::ListingRevisited(row.listing_id));
        }

        let contiguous = !self.split_on_date_gap || previous.date.succ_opt() == Some(row.date);
        if same_listing && row.available == previous.available && contiguous {
            current.extend_to(row.date);
            self.previous = Some(row);
            return Ok(None);
        }

        let closed = self.close();
        if !same_listing {
            if let Some(closed) = &closed {
                self.finished_listings.insert(closed.listing_id.clone());
            }
        }
        self.open(row);
        Ok(closed)
    }

    /// Close and return the period left open at end of input
    pub fn finish(mut self) -> Option<ClosedPeriod> {
        self.close()
    }

    fn open(&mut self, row: AvailabilityRow) {
        self.current = Some(AvailabilityPeriod::starting(row.date, row.available));
        self.previous = Some(row);
    }

    fn close(&mut self) -> Option<ClosedPeriod> {
        let previous = self.previous.take()?;
        let period = self.current.take()?;
        Some(ClosedPeriod {
            listing_id: previous.listing_id,
            min_nights: previous.minimum_nights,
            max_nights: previous.maximum_nights,
            period,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn row(listing_id: &str, date: &str, available: bool) -> AvailabilityRow {
        AvailabilityRow {
            listing_id: listing_id.to_string(),
            date: day(date),
            available,
            minimum_nights: "1".to_string(),
            maximum_nights: "30".to_string(),
        }
    }

    fn run(compactor: &mut PeriodCompactor, rows: Vec<AvailabilityRow>) -> Vec<ClosedPeriod> {
        rows.into_iter()
            .filter_map(|r| compactor.push(r).unwrap())
            .collect()
    }

    #[test]
    fn distinct_listings_close_one_period_per_row_except_last() {
        let mut compactor = PeriodCompactor::new(false);
        let closed = run(
            &mut compactor,
            vec![
                row("1", "2023-01-01", true),
                row("2", "2023-01-01", true),
                row("3", "2023-01-01", true),
                row("4", "2023-01-01", false),
            ],
        );

        assert_eq!(closed.len(), 3);
        for (period, id) in closed.iter().zip(["1", "2", "3"]) {
            assert_eq!(period.listing_id, id);
            assert_eq!(period.period.total_nights, 1);
            assert_eq!(period.period.start_date, period.period.end_date);
        }
        assert_eq!(compactor.open_period().map(|p| p.available), Some(false));
    }

    #[test]
    fn flag_change_closes_run_and_leaves_tail_open() {
        let mut compactor = PeriodCompactor::new(false);
        let closed = run(
            &mut compactor,
            vec![
                row("L1", "2023-01-01", true),
                row("L1", "2023-01-02", true),
                row("L1", "2023-01-03", false),
            ],
        );

        assert_eq!(
            closed,
            vec![ClosedPeriod {
                listing_id: "L1".to_string(),
                min_nights: "1".to_string(),
                max_nights: "30".to_string(),
                period: AvailabilityPeriod {
                    start_date: day("2023-01-01"),
                    end_date: day("2023-01-02"),
                    available: true,
                    total_nights: 2,
                },
            }]
        );
        assert_eq!(
            compactor.open_period(),
            Some(&AvailabilityPeriod::starting(day("2023-01-03"), false))
        );
    }

    #[test]
    fn consecutive_equal_rows_merge_into_one_period() {
        let mut compactor = PeriodCompactor::new(false);
        let rows = (1..=5)
            .map(|d| row("7", &format!("2023-03-0{}", d), true))
            .collect();

        assert!(run(&mut compactor, rows).is_empty());

        let tail = compactor.finish().unwrap();
        assert_eq!(tail.period.total_nights, 5);
        assert_eq!(tail.period.start_date, day("2023-03-01"));
        assert_eq!(tail.period.end_date, day("2023-03-05"));
    }

    #[test]
    fn bounds_come_from_last_row_of_period() {
        let mut compactor = PeriodCompactor::new(false);
        let mut first = row("1", "2023-01-01", true);
        first.minimum_nights = "2".to_string();
        let mut second = row("1", "2023-01-02", true);
        second.minimum_nights = "5".to_string();
        second.maximum_nights = " 14".to_string();

        compactor.push(first).unwrap();
        compactor.push(second).unwrap();
        let closed = compactor.push(row("2", "2023-01-01", true)).unwrap().unwrap();

        assert_eq!(closed.stay_bounds(), Ok((5, 14)));
    }

    #[test]
    fn bounds_inside_a_period_are_never_read() {
        let mut compactor = PeriodCompactor::new(false);
        let mut blank = row("1", "2023-01-02", true);
        blank.minimum_nights = String::new();
        blank.maximum_nights = String::new();

        compactor.push(row("1", "2023-01-01", true)).unwrap();
        compactor.push(blank).unwrap();
        compactor.push(row("1", "2023-01-03", true)).unwrap();
        let closed = compactor.push(row("1", "2023-01-04", false)).unwrap().unwrap();

        assert_eq!(closed.period.total_nights, 3);
        assert_eq!(closed.stay_bounds(), Ok((1, 30)));
    }

    #[test]
    fn blank_bounds_on_closing_row_fail_to_parse() {
        let mut compactor = PeriodCompactor::new(false);
        let mut blank = row("1", "2023-01-01", true);
        blank.minimum_nights = String::new();

        compactor.push(blank).unwrap();
        let closed = compactor.push(row("2", "2023-01-01", true)).unwrap().unwrap();

        assert!(closed.stay_bounds().is_err());
    }

    #[test]
    fn date_gap_extends_period_by_default() {
        let mut compactor = PeriodCompactor::new(false);
        run(
            &mut compactor,
            vec![row("1", "2023-01-01", true), row("1", "2023-01-05", true)],
        );

        let open = compactor.open_period().unwrap();
        assert_eq!(open.total_nights, 2);
        assert_eq!(open.end_date, day("2023-01-05"));
    }

    #[test]
    fn date_gap_splits_period_when_enabled() {
        let mut compactor = PeriodCompactor::new(true);
        let closed = run(
            &mut compactor,
            vec![
                row("1", "2023-01-01", true),
                row("1", "2023-01-02", true),
                row("1", "2023-01-05", true),
            ],
        );

        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].period.end_date, day("2023-01-02"));
        assert_eq!(
            compactor.open_period(),
            Some(&AvailabilityPeriod::starting(day("2023-01-05"), true))
        );
    }

    #[test]
    fn repeated_date_is_rejected() {
        let mut compactor = PeriodCompactor::new(false);
        compactor.push(row("1", "2023-01-02", true)).unwrap();

        let err = compactor.push(row("1", "2023-01-02", true)).unwrap_err();

        assert!(matches!(err, OrderViolation::DateNotAscending { .. }));
    }

    #[test]
    fn revisited_listing_is_rejected() {
        let mut compactor = PeriodCompactor::new(false);
        compactor.push(row("1", "2023-01-01", true)).unwrap();
        compactor.push(row("2", "2023-01-01", true)).unwrap();

        let err = compactor.push(row("1", "2023-01-02", true)).unwrap_err();

        assert_eq!(err, OrderViolation::ListingRevisited("1".to_string()));
    }

    #[test]
    fn finish_on_empty_input_returns_nothing() {
        assert_eq!(PeriodCompactor::new(false).finish(), None);
    }
}
