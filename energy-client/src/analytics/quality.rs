use std::collections::HashSet;

use crate::domain::{ConsumptionRecord, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Timestamp,
    Measurement(Variable),
}

impl Column {
    pub const ALL: [Column; 4] = [
        Column::Timestamp,
        Column::Measurement(Variable::Electricity),
        Column::Measurement(Variable::Gas),
        Column::Measurement(Variable::Total),
    ];

    pub fn label(self) -> &'static str {
        match self {
            Column::Timestamp => "Timestamp",
            Column::Measurement(v) => v.label(),
        }
    }
}

/// Sanity counts over a set of rows.
///
/// Rows reaching this point have already been cleaned, so `missing` is
/// expected to be all zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct DataQualityReport {
    pub rows: usize,
    pub missing: Vec<(Column, usize)>,
    pub duplicate_rows: usize,
    pub negative: Vec<(Variable, usize)>,
}

impl DataQualityReport {
    pub fn missing_in(&self, column: Column) -> usize {
        self.missing
            .iter()
            .find(|(c, _)| *c == column)
            .map_or(0, |(_, n)| *n)
    }

    pub fn negative_in(&self, variable: Variable) -> Option<usize> {
        self.negative
            .iter()
            .find(|(v, _)| *v == variable)
            .map(|(_, n)| *n)
    }

    pub fn is_clean(&self) -> bool {
        self.duplicate_rows == 0
            && self.missing.iter().all(|(_, n)| *n == 0)
            && self.negative.iter().all(|(_, n)| *n == 0)
    }
}

pub fn data_quality(records: &[ConsumptionRecord], variables: &[Variable]) -> DataQualityReport {
    let missing = Column::ALL
        .into_iter()
        .map(|column| {
            let n = match column {
                Column::Timestamp => 0,
                Column::Measurement(v) => records.iter().filter(|r| r.value(v).is_nan()).count(),
            };
            (column, n)
        })
        .collect();

    // A duplicate is a row identical to an earlier one; the first occurrence is not counted.
    let mut seen = HashSet::with_capacity(records.len());
    let duplicate_rows = records
        .iter()
        .filter(|r| !seen.insert(row_fingerprint(r)))
        .count();

    let negative = variables
        .iter()
        .map(|v| (*v, records.iter().filter(|r| r.value(*v) < 0.0).count()))
        .collect();

    DataQualityReport {
        rows: records.len(),
        missing,
        duplicate_rows,
        negative,
    }
}

fn row_fingerprint(r: &ConsumptionRecord) -> [u8; 32] {
    let mut h = blake3::Hasher::new();
    h.update(&r.ts.assume_utc().unix_timestamp_nanos().to_le_bytes());
    for v in Variable::ALL {
        // -0.0 == 0.0, so both must hash alike.
        let value = r.value(v);
        let value = if value == 0.0 { 0.0 } else { value };
        h.update(&value.to_bits().to_le_bytes());
    }
    *h.finalize().as_bytes()
}
