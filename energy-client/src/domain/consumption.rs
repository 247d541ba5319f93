use std::{fmt, str::FromStr};

use time::PrimitiveDateTime;

/// One cleaned consumption sample. All measurements are in MW.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsumptionRecord {
    pub ts: PrimitiveDateTime,
    pub electricity_mw: f64,
    pub gas_mw: f64,
    pub total_mw: f64,
}

impl ConsumptionRecord {
    pub fn value(&self, variable: Variable) -> f64 {
        match variable {
            Variable::Electricity => self.electricity_mw,
            Variable::Gas => self.gas_mw,
            Variable::Total => self.total_mw,
        }
    }
}

/// A consumption row as read from disk, before cleaning.
///
/// A field is `None` when the raw text was empty or could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawConsumption {
    pub ts: Option<PrimitiveDateTime>,
    pub electricity_mw: Option<f64>,
    pub gas_mw: Option<f64>,
    pub total_mw: Option<f64>,
}

impl RawConsumption {
    /// Returns the cleaned record, or `None` if the timestamp or any
    /// measurement is missing. NaN counts as missing.
    pub fn complete(&self) -> Option<ConsumptionRecord> {
        let present = |v: Option<f64>| v.filter(|x| !x.is_nan());

        Some(ConsumptionRecord {
            ts: self.ts?,
            electricity_mw: present(self.electricity_mw)?,
            gas_mw: present(self.gas_mw)?,
            total_mw: present(self.total_mw)?,
        })
    }
}

/// Measurement columns a user can select for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variable {
    Electricity,
    Gas,
    Total,
}

impl Variable {
    pub const ALL: [Variable; 3] = [Variable::Electricity, Variable::Gas, Variable::Total];

    pub fn label(self) -> &'static str {
        match self {
            Variable::Electricity => "Electricity (MW)",
            Variable::Gas => "Gas (MW PCS)",
            Variable::Total => "Total consumption (MW)",
        }
    }

    /// Stable identifier used in query strings and form fields.
    pub fn key(self) -> &'static str {
        match self {
            Variable::Electricity => "electricity",
            Variable::Gas => "gas",
            Variable::Total => "total",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown variable '{0}'")]
pub struct UnknownVariable(pub String);

impl FromStr for Variable {
    type Err = UnknownVariable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variable::ALL
            .into_iter()
            .find(|v| v.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariable(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn complete_requires_every_measurement() {
        let raw = RawConsumption {
            ts: Some(datetime!(2012-01-01 00:00)),
            electricity_mw: Some(1000.0),
            gas_mw: None,
            total_mw: Some(1500.0),
        };
        assert!(raw.complete().is_none());

        let raw = RawConsumption {
            gas_mw: Some(500.0),
            ..raw
        };
        let record = raw.complete().unwrap();
        assert_eq!(record.value(Variable::Gas), 500.0);
        assert_eq!(record.value(Variable::Total), 1500.0);
    }

    #[test]
    fn complete_rejects_missing_timestamp_and_nan() {
        let raw = RawConsumption {
            ts: None,
            electricity_mw: Some(1.0),
            gas_mw: Some(1.0),
            total_mw: Some(2.0),
        };
        assert!(raw.complete().is_none());

        let raw = RawConsumption {
            ts: Some(datetime!(2012-01-01 00:30)),
            electricity_mw: Some(f64::NAN),
            ..raw
        };
        assert!(raw.complete().is_none());
    }

    #[test]
    fn variable_parses_from_key() {
        assert_eq!("electricity".parse::<Variable>(), Ok(Variable::Electricity));
        assert_eq!(" GAS ".parse::<Variable>(), Ok(Variable::Gas));
        assert_eq!(
            "wind".parse::<Variable>(),
            Err(UnknownVariable("wind".to_string()))
        );
    }
}
