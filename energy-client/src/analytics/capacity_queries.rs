use super::consumption_queries::{yearly_peaks, YearlyPeak};
use crate::domain::{CapacityRecord, ConsumptionRecord};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GreenCapacity {
    pub year: i32,
    pub green_capacity_mw: Option<f64>,
}

/// Annual electricity peak next to the installed renewable fleet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakVsCapacity {
    pub year: i32,
    pub peak_electricity_mw: f64,
    pub green_capacity_mw: Option<f64>,
}

/// Wind plus solar per year, for years `>= from_year`, in input order.
pub fn green_capacity(capacity: &[CapacityRecord], from_year: i32) -> Vec<GreenCapacity> {
    capacity
        .iter()
        .filter(|c| c.year >= from_year)
        .map(|c| GreenCapacity {
            year: c.year,
            green_capacity_mw: c.green_capacity_mw(),
        })
        .collect()
}

/// Largest green capacity across all years. Years with a missing value are skipped.
pub fn max_green_capacity(capacity: &[CapacityRecord]) -> Option<f64> {
    capacity
        .iter()
        .filter_map(CapacityRecord::green_capacity_mw)
        .reduce(f64::max)
}

/// Peak installed green capacity as a share of the electricity summed over a
/// period, in percent, capped to `[0, 100]`.
///
/// This compares an instantaneous capacity (MW) to an accumulated sum of MW
/// samples, so it is an indicator rather than a physical ratio. The figure is
/// kept as the dashboard has always displayed it.
pub fn renewable_percentage(capacity: &[CapacityRecord], electricity_total_mw: f64) -> f64 {
    if electricity_total_mw <= 0.0 {
        return 0.0;
    }

    match max_green_capacity(capacity) {
        Some(max) => (max / electricity_total_mw * 100.0).clamp(0.0, 100.0),
        None => 0.0,
    }
}

/// Inner join of yearly peaks and green capacity on year.
///
/// Output follows the order of `peaks`; a year listed twice in `green`
/// produces two rows.
pub fn peak_vs_capacity(peaks: &[YearlyPeak], green: &[GreenCapacity]) -> Vec<PeakVsCapacity> {
    peaks
        .iter()
        .flat_map(|p| {
            green
                .iter()
                .filter(move |g| g.year == p.year)
                .map(move |g| PeakVsCapacity {
                    year: p.year,
                    peak_electricity_mw: p.peak_electricity_mw,
                    green_capacity_mw: g.green_capacity_mw,
                })
        })
        .collect()
}

pub fn yearly_peak_vs_capacity(
    consumption: &[ConsumptionRecord],
    capacity: &[CapacityRecord],
    from_year: i32,
) -> Vec<PeakVsCapacity> {
    let peaks = yearly_peaks(consumption, from_year);
    let green = green_capacity(capacity, from_year);
    peak_vs_capacity(&peaks, &green)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::PrimitiveDateTime;

    fn cap(year: i32, wind: f64, solar: f64) -> CapacityRecord {
        CapacityRecord {
            year,
            wind_capacity_mw: Some(wind),
            solar_capacity_mw: Some(solar),
        }
    }

    fn elec(ts: PrimitiveDateTime, electricity_mw: f64) -> ConsumptionRecord {
        ConsumptionRecord {
            ts,
            electricity_mw,
            gas_mw: 0.0,
            total_mw: electricity_mw,
        }
    }

    #[test]
    fn green_capacity_sums_wind_and_solar() {
        let capacity = vec![cap(2012, 100.0, 50.0), cap(2013, 150.0, 80.0)];
        let green = green_capacity(&capacity, i32::MIN);

        assert_eq!(green[0].green_capacity_mw, Some(150.0));
        assert_eq!(green[1].green_capacity_mw, Some(230.0));
        assert_eq!(max_green_capacity(&capacity), Some(230.0));
    }

    #[test]
    fn max_green_capacity_skips_missing_values() {
        let capacity = vec![
            cap(2012, 100.0, 50.0),
            CapacityRecord {
                year: 2013,
                wind_capacity_mw: Some(10_000.0),
                solar_capacity_mw: None,
            },
        ];
        assert_eq!(max_green_capacity(&capacity), Some(150.0));
    }

    #[test]
    fn renewable_percentage_is_bounded() {
        let capacity = vec![cap(2012, 100.0, 50.0), cap(2013, 150.0, 80.0)];

        assert_eq!(renewable_percentage(&capacity, 0.0), 0.0);
        assert_eq!(renewable_percentage(&capacity, 100.0), 100.0);
        assert!((renewable_percentage(&capacity, 2300.0) - 10.0).abs() < 1e-9);
        assert_eq!(renewable_percentage(&[], 2300.0), 0.0);

        for total in [0.0, 1.0, 229.0, 230.0, 1e9] {
            let pct = renewable_percentage(&capacity, total);
            assert!((0.0..=100.0).contains(&pct), "{pct} out of range for {total}");
        }
    }

    #[test]
    fn peak_join_keeps_only_shared_years() {
        let consumption = vec![
            elec(datetime!(2012-01-10 19:00), 90_000.0),
            elec(datetime!(2013-01-10 19:00), 91_000.0),
            elec(datetime!(2014-01-10 19:00), 85_000.0),
        ];
        let capacity = vec![
            cap(2013, 8_000.0, 4_000.0),
            cap(2014, 9_000.0, 5_000.0),
            cap(2015, 10_000.0, 6_000.0),
        ];

        let joined = yearly_peak_vs_capacity(&consumption, &capacity, 2012);
        let years: Vec<i32> = joined.iter().map(|j| j.year).collect();
        assert_eq!(years, vec![2013, 2014]);
        assert_eq!(joined[0].peak_electricity_mw, 91_000.0);
        assert_eq!(joined[0].green_capacity_mw, Some(12_000.0));
    }

    #[test]
    fn peak_join_ignores_years_before_threshold() {
        let consumption = vec![
            elec(datetime!(2010-01-10 19:00), 95_000.0),
            elec(datetime!(2012-01-10 19:00), 90_000.0),
        ];
        let capacity = vec![cap(2010, 5_000.0, 1_000.0), cap(2012, 7_000.0, 3_000.0)];

        let joined = yearly_peak_vs_capacity(&consumption, &capacity, 2012);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].year, 2012);
    }
}
