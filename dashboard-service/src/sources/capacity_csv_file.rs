use std::path::{Path, PathBuf};

use csv::{StringRecord, Trim};
use energy_client::domain::CapacityRecord;

use super::{column_index, is_unparsable, open_semicolon_file, parse_optional_f64};
use crate::pipeline::{Envelope, PipelineError, RecordStream, Source};

pub const YEAR_COLUMN: &str = "Annee";
pub const WIND_COLUMN: &str = "Parc installé éolien (MW)";
pub const SOLAR_COLUMN: &str = "Parc installé solaire (MW)";

/// Annual installed wind/solar capacity file
/// (`parc-national-annuel-prod-eolien-solaire.csv`).
///
/// Header names are trimmed before lookup. Capacity cells that do not parse
/// become `None`; a year that does not parse fails the load.
pub struct CapacityCsvFileSource {
    path: PathBuf,
}

impl CapacityCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

struct CapacityColumns {
    year: usize,
    wind: usize,
    solar: usize,
}

impl CapacityColumns {
    fn locate(headers: &StringRecord, path: &Path) -> Result<Self, PipelineError> {
        Ok(Self {
            year: column_index(headers, YEAR_COLUMN, path)?,
            wind: column_index(headers, WIND_COLUMN, path)?,
            solar: column_index(headers, SOLAR_COLUMN, path)?,
        })
    }
}

fn record_to_capacity(
    record: &StringRecord,
    cols: &CapacityColumns,
    line: u64,
) -> Result<(CapacityRecord, u64), PipelineError> {
    let field = |idx: usize| record.get(idx).unwrap_or("");

    let year_str = field(cols.year);
    let year: i32 = year_str
        .trim()
        .parse()
        .map_err(|e| PipelineError::Source(format!("line {line}: invalid year '{year_str}': {e}")))?;

    let wind_capacity_mw = parse_optional_f64(field(cols.wind));
    let solar_capacity_mw = parse_optional_f64(field(cols.solar));
    let unparsable = u64::from(is_unparsable(field(cols.wind), wind_capacity_mw))
        + u64::from(is_unparsable(field(cols.solar), solar_capacity_mw));

    Ok((
        CapacityRecord {
            year,
            wind_capacity_mw,
            solar_capacity_mw,
        },
        unparsable,
    ))
}

#[async_trait::async_trait]
impl Source<CapacityRecord> for CapacityCsvFileSource {
    async fn stream(&self) -> RecordStream<CapacityRecord> {
        let path = self.path.clone();
        let s = async_stream::try_stream! {
            let mut rdr = open_semicolon_file(&path, Trim::Headers)?;
            let headers = rdr
                .headers()
                .map_err(|e| PipelineError::Source(format!("failed to read headers of {}: {e}", path.display())))?
                .clone();
            let cols = CapacityColumns::locate(&headers, &path)?;

            for result in rdr.records() {
                let record = result.map_err(|e| PipelineError::Source(format!(
                    "failed to read record in {}: {e}",
                    path.display()
                )))?;
                let line = record.position().map_or(0, |p| p.line());

                let (capacity, unparsable) = match record_to_capacity(&record, &cols, line) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        metrics::counter!("dashboard_parse_errors_total", "table" => "capacity").increment(1);
                        Err(e)?
                    }
                };
                if unparsable > 0 {
                    metrics::counter!("dashboard_parse_errors_total", "table" => "capacity").increment(unparsable);
                }

                yield Envelope { payload: capacity, line };
            }
        };

        Box::pin(s)
    }
}
