/// Installed wind and solar capacity for one year, in MW.
///
/// Capacity values are `None` when the source cell could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityRecord {
    pub year: i32,
    pub wind_capacity_mw: Option<f64>,
    pub solar_capacity_mw: Option<f64>,
}

impl CapacityRecord {
    /// Wind plus solar. Missing if either side is missing.
    pub fn green_capacity_mw(&self) -> Option<f64> {
        let sum = self.wind_capacity_mw? + self.solar_capacity_mw?;
        (!sum.is_nan()).then_some(sum)
    }
}
