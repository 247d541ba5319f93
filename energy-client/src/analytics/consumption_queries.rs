use std::collections::BTreeMap;

use time::Date;

use super::DateRange;
use crate::domain::{ConsumptionRecord, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    pub electricity_mw: f64,
    pub gas_mw: f64,
    pub total_mw: f64,
}

/// Mean of the selected variables for one hour of the day.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyAverage {
    pub hour: u8,
    pub count: usize,
    pub means: Vec<(Variable, f64)>,
}

impl HourlyAverage {
    pub fn mean(&self, variable: Variable) -> Option<f64> {
        self.means
            .iter()
            .find(|(v, _)| *v == variable)
            .map(|(_, mean)| *mean)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearlyPeak {
    pub year: i32,
    pub peak_electricity_mw: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyMean {
    pub date: Date,
    pub electricity_mw: f64,
    pub gas_mw: f64,
    pub total_mw: f64,
}

/// Rows whose timestamp falls inside `range`.
///
/// `records` must be sorted by timestamp. An inverted range yields an empty slice.
pub fn filter_range<'a>(records: &'a [ConsumptionRecord], range: &DateRange) -> &'a [ConsumptionRecord] {
    let lo = records.partition_point(|r| r.ts.date() < range.start);
    let hi = records.partition_point(|r| r.ts.date() <= range.end);
    if hi <= lo {
        return &[];
    }
    &records[lo..hi]
}

pub fn totals(records: &[ConsumptionRecord]) -> Totals {
    records.iter().fold(Totals::default(), |acc, r| Totals {
        electricity_mw: acc.electricity_mw + r.electricity_mw,
        gas_mw: acc.gas_mw + r.gas_mw,
        total_mw: acc.total_mw + r.total_mw,
    })
}

/// Groups rows by hour of day and averages each selected variable.
///
/// Only hours that have at least one row are returned, in ascending order.
pub fn hourly_average(records: &[ConsumptionRecord], variables: &[Variable]) -> Vec<HourlyAverage> {
    let mut buckets: [(usize, [f64; 3]); 24] = [(0, [0.0; 3]); 24];

    for r in records {
        let (count, sums) = &mut buckets[usize::from(r.ts.hour())];
        *count += 1;
        for (slot, variable) in sums.iter_mut().zip(Variable::ALL) {
            *slot += r.value(variable);
        }
    }

    buckets
        .iter()
        .enumerate()
        .filter(|(_, (count, _))| *count > 0)
        .map(|(hour, (count, sums))| HourlyAverage {
            hour: hour as u8,
            count: *count,
            means: variables
                .iter()
                .map(|v| (*v, sums[slot_of(*v)] / *count as f64))
                .collect(),
        })
        .collect()
}

/// Maximum electricity per calendar year, for years `>= from_year`.
pub fn yearly_peaks(records: &[ConsumptionRecord], from_year: i32) -> Vec<YearlyPeak> {
    let mut peaks: BTreeMap<i32, f64> = BTreeMap::new();

    for r in records.iter().filter(|r| r.ts.year() >= from_year) {
        peaks
            .entry(r.ts.year())
            .and_modify(|peak| *peak = peak.max(r.electricity_mw))
            .or_insert(r.electricity_mw);
    }

    peaks
        .into_iter()
        .map(|(year, peak_electricity_mw)| YearlyPeak {
            year,
            peak_electricity_mw,
        })
        .collect()
}

/// Per-day means of every measurement. Days without rows are omitted.
pub fn daily_means(records: &[ConsumptionRecord]) -> Vec<DailyMean> {
    let mut days: BTreeMap<Date, (usize, [f64; 3])> = BTreeMap::new();

    for r in records {
        let (count, sums) = days.entry(r.ts.date()).or_insert((0, [0.0; 3]));
        *count += 1;
        sums[0] += r.electricity_mw;
        sums[1] += r.gas_mw;
        sums[2] += r.total_mw;
    }

    days.into_iter()
        .map(|(date, (count, sums))| {
            let n = count as f64;
            DailyMean {
                date,
                electricity_mw: sums[0] / n,
                gas_mw: sums[1] / n,
                total_mw: sums[2] / n,
            }
        })
        .collect()
}

fn slot_of(variable: Variable) -> usize {
    match variable {
        Variable::Electricity => 0,
        Variable::Gas => 1,
        Variable::Total => 2,
    }
}
