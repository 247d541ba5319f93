//! Read-only summaries over the cleaned tables.
//!
//! Consumption queries assume the input slice is sorted by timestamp, which
//! is what the loading pipeline produces.

mod capacity_queries;
mod consumption_queries;
mod quality;

pub use capacity_queries::{
    green_capacity, max_green_capacity, peak_vs_capacity, renewable_percentage,
    yearly_peak_vs_capacity, GreenCapacity, PeakVsCapacity,
};
pub use consumption_queries::{
    daily_means, filter_range, hourly_average, totals, yearly_peaks, DailyMean, HourlyAverage,
    Totals, YearlyPeak,
};
pub use quality::{data_quality, Column, DataQualityReport};

use time::{Date, PrimitiveDateTime};

use crate::domain::ConsumptionRecord;

/// First year considered by the peak-versus-capacity comparison.
pub const DEFAULT_PEAK_FROM_YEAR: i32 = 2012;

/// Inclusive calendar range. Both the start and the end day are fully covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    /// Smallest range covering every record, or `None` for an empty table.
    pub fn spanning(records: &[ConsumptionRecord]) -> Option<Self> {
        let start = records.iter().map(|r| r.ts.date()).min()?;
        let end = records.iter().map(|r| r.ts.date()).max()?;
        Some(Self { start, end })
    }

    pub fn contains(&self, ts: PrimitiveDateTime) -> bool {
        let day = ts.date();
        day >= self.start && day <= self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn record(ts: PrimitiveDateTime) -> ConsumptionRecord {
        ConsumptionRecord {
            ts,
            electricity_mw: 0.0,
            gas_mw: 0.0,
            total_mw: 0.0,
        }
    }

    #[test]
    fn range_includes_whole_end_day() {
        let range = DateRange::new(date!(2012-01-01), date!(2012-01-01));
        assert!(range.contains(datetime!(2012-01-01 00:00)));
        assert!(range.contains(datetime!(2012-01-01 23:30)));
        assert!(!range.contains(datetime!(2012-01-02 00:00)));
        assert!(!range.contains(datetime!(2011-12-31 23:30)));
    }

    #[test]
    fn spanning_covers_first_and_last_day() {
        let records = vec![
            record(datetime!(2013-05-02 10:00)),
            record(datetime!(2013-05-01 00:00)),
            record(datetime!(2013-06-30 23:30)),
        ];
        let range = DateRange::spanning(&records).unwrap();
        assert_eq!(range.start, date!(2013-05-01));
        assert_eq!(range.end, date!(2013-06-30));
        assert!(DateRange::spanning(&[]).is_none());
    }
}
