use std::path::{Path, PathBuf};

use csv::{StringRecord, Trim};
use energy_client::domain::RawConsumption;
use time::{format_description::BorrowedFormatItem, macros::format_description, Date, PrimitiveDateTime, Time};

use super::{column_index, is_unparsable, open_semicolon_file, parse_optional_f64};
use crate::pipeline::{Envelope, PipelineError, RecordStream, Source};

pub const DATE_COLUMN: &str = "Date";
pub const TIME_COLUMN: &str = "Heure";
pub const GAS_COLUMN: &str = "Consommation brute gaz totale (MW PCS 0°C)";
pub const ELECTRICITY_COLUMN: &str = "Consommation brute électricité (MW) - RTE";
pub const TOTAL_COLUMN: &str = "Consommation brute totale (MW)";

/// Day-first layouts are tried before ISO.
const DATE_FORMATS: [&[BorrowedFormatItem<'static>]; 3] = [
    format_description!("[day]/[month]/[year]"),
    format_description!("[day]-[month]-[year]"),
    format_description!("[year]-[month]-[day]"),
];

const TIME_FORMATS: [&[BorrowedFormatItem<'static>]; 2] = [
    format_description!("[hour]:[minute]:[second]"),
    format_description!("[hour]:[minute]"),
];

/// Daily consumption file (`consommation-quotidienne-brute.csv`).
///
/// Required header columns (by name):
/// - Date
/// - Heure
/// - Consommation brute gaz totale (MW PCS 0°C)
/// - Consommation brute électricité (MW) - RTE
/// - Consommation brute totale (MW)
///
/// The combined `Date - Heure` column and any other column are ignored.
pub struct ConsumptionCsvFileSource {
    path: PathBuf,
}

impl ConsumptionCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

struct ConsumptionColumns {
    date: usize,
    time: usize,
    gas: usize,
    electricity: usize,
    total: usize,
}

impl ConsumptionColumns {
    fn locate(headers: &StringRecord, path: &Path) -> Result<Self, PipelineError> {
        Ok(Self {
            date: column_index(headers, DATE_COLUMN, path)?,
            time: column_index(headers, TIME_COLUMN, path)?,
            gas: column_index(headers, GAS_COLUMN, path)?,
            electricity: column_index(headers, ELECTRICITY_COLUMN, path)?,
            total: column_index(headers, TOTAL_COLUMN, path)?,
        })
    }
}

/// Combines separate date and time texts into one timestamp.
///
/// Returns `None` for anything that does not parse; the row is then dropped
/// during cleaning rather than failing the load.
pub fn parse_day_first(date: &str, time: &str) -> Option<PrimitiveDateTime> {
    let (date, time) = (date.trim(), time.trim());
    let date = DATE_FORMATS.iter().find_map(|f| Date::parse(date, f).ok())?;
    let time = TIME_FORMATS.iter().find_map(|f| Time::parse(time, f).ok())?;
    Some(PrimitiveDateTime::new(date, time))
}

fn record_to_raw(record: &StringRecord, cols: &ConsumptionColumns) -> (RawConsumption, u64) {
    let field = |idx: usize| record.get(idx).unwrap_or("");

    let raw = RawConsumption {
        ts: parse_day_first(field(cols.date), field(cols.time)),
        gas_mw: parse_optional_f64(field(cols.gas)),
        electricity_mw: parse_optional_f64(field(cols.electricity)),
        total_mw: parse_optional_f64(field(cols.total)),
    };

    let mut unparsable = 0;
    if raw.ts.is_none() && !(field(cols.date).trim().is_empty() && field(cols.time).trim().is_empty()) {
        unparsable += 1;
    }
    for (idx, parsed) in [
        (cols.gas, raw.gas_mw),
        (cols.electricity, raw.electricity_mw),
        (cols.total, raw.total_mw),
    ] {
        if is_unparsable(field(idx), parsed) {
            unparsable += 1;
        }
    }

    (raw, unparsable)
}

#[async_trait::async_trait]
impl Source<RawConsumption> for ConsumptionCsvFileSource {
    async fn stream(&self) -> RecordStream<RawConsumption> {
        // Blocking CSV reads inside a single async task; the files are small
        // enough to be read once at startup.
        let path = self.path.clone();
        let s = async_stream::try_stream! {
            let mut rdr = open_semicolon_file(&path, Trim::None)?;
            let headers = rdr
                .headers()
                .map_err(|e| PipelineError::Source(format!("failed to read headers of {}: {e}", path.display())))?
                .clone();
            let cols = ConsumptionColumns::locate(&headers, &path)?;

            for result in rdr.records() {
                let record = result.map_err(|e| PipelineError::Source(format!(
                    "failed to read record in {}: {e}",
                    path.display()
                )))?;
                let line = record.position().map_or(0, |p| p.line());

                let (raw, unparsable) = record_to_raw(&record, &cols);
                if unparsable > 0 {
                    metrics::counter!("dashboard_parse_errors_total", "table" => "consumption").increment(unparsable);
                }

                yield Envelope { payload: raw, line };
            }
        };

        Box::pin(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Write;
    use time::macros::datetime;

    const HEADER: &str = "Date - Heure;Date;Heure;Consommation brute gaz totale (MW PCS 0°C);Statut - GRTgaz;Consommation brute électricité (MW) - RTE;Consommation brute totale (MW)";

    fn write_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    async fn collect(path: &Path) -> Vec<Result<Envelope<RawConsumption>, PipelineError>> {
        ConsumptionCsvFileSource::new(path).stream().await.collect().await
    }

    #[test]
    fn parses_day_first_and_iso_dates() {
        assert_eq!(parse_day_first("02/01/2012", "00:30"), Some(datetime!(2012-01-02 00:30)));
        assert_eq!(parse_day_first(" 02-01-2012 ", "23:30:00"), Some(datetime!(2012-01-02 23:30)));
        assert_eq!(parse_day_first("2012-01-02", "12:00"), Some(datetime!(2012-01-02 12:00)));
    }

    #[test]
    fn malformed_timestamp_is_none() {
        assert_eq!(parse_day_first("31/02/2012", "00:00"), None);
        assert_eq!(parse_day_first("02/01/2012", "25:00"), None);
        assert_eq!(parse_day_first("", ""), None);
        assert_eq!(parse_day_first("yesterday", "noon"), None);
    }

    #[tokio::test]
    async fn streams_typed_rows() {
        let file = write_file(&format!(
            "{HEADER}\n\
             2012-01-01T00:00:00+01:00;01/01/2012;00:00;52000;Définitive;61000;113000\n\
             2012-01-01T00:30:00+01:00;01/01/2012;00:30;;Définitive;60500;\n\
             bad;99/99/2012;00:00;1;Définitive;n/a;3\n"
        ));

        let rows = collect(file.path()).await;
        assert_eq!(rows.len(), 3);

        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.line, 2);
        assert_eq!(first.payload.ts, Some(datetime!(2012-01-01 00:00)));
        assert_eq!(first.payload.gas_mw, Some(52000.0));
        assert_eq!(first.payload.electricity_mw, Some(61000.0));
        assert_eq!(first.payload.total_mw, Some(113000.0));

        let second = &rows[1].as_ref().unwrap().payload;
        assert_eq!(second.gas_mw, None);
        assert_eq!(second.total_mw, None);

        let third = &rows[2].as_ref().unwrap().payload;
        assert_eq!(third.ts, None);
        assert_eq!(third.electricity_mw, None);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let rows = collect(&dir.path().join("absent.csv")).await;

        assert_eq!(rows.len(), 1);
        assert!(matches!(rows[0], Err(PipelineError::NotFound(_))));
    }

    #[tokio::test]
    async fn wrong_delimiter_is_a_schema_error() {
        let file = write_file(
            "Date,Heure,Consommation brute gaz totale (MW PCS 0°C)\n01/01/2012,00:00,1\n",
        );
        let rows = collect(file.path()).await;

        assert_eq!(rows.len(), 1);
        assert!(matches!(rows[0], Err(PipelineError::Schema(_))));
    }

    #[tokio::test]
    async fn ragged_record_surfaces_as_source_error() {
        let file = write_file(&format!("{HEADER}\n2012;01/01/2012;00:00;1\n"));
        let rows = collect(file.path()).await;

        assert!(matches!(rows.last(), Some(Err(PipelineError::Source(_)))));
    }
}
