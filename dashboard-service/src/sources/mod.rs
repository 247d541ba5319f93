pub mod capacity_csv_file;
pub mod consumption_csv_file;

pub use capacity_csv_file::CapacityCsvFileSource;
pub use consumption_csv_file::ConsumptionCsvFileSource;

use std::{fs::File, io, path::Path};

use csv::{Reader, ReaderBuilder, StringRecord, Trim};

use crate::pipeline::PipelineError;

/// Both datasets are published as `;`-separated text.
pub const DELIMITER: u8 = b';';

fn open_semicolon_file(path: &Path, trim: Trim) -> Result<Reader<File>, PipelineError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PipelineError::NotFound(path.to_path_buf()),
        _ => PipelineError::Source(format!("failed to open {}: {e}", path.display())),
    })?;

    Ok(ReaderBuilder::new().delimiter(DELIMITER).trim(trim).from_reader(file))
}

fn column_index(headers: &StringRecord, name: &str, path: &Path) -> Result<usize, PipelineError> {
    headers.iter().position(|h| h == name).ok_or_else(|| {
        PipelineError::Schema(format!(
            "missing column '{name}' in {} (found {} column(s))",
            path.display(),
            headers.len()
        ))
    })
}

/// Empty text is missing; anything unparsable is missing too.
fn parse_optional_f64(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        trimmed.parse().ok()
    }
}

fn is_unparsable(s: &str, parsed: Option<f64>) -> bool {
    parsed.is_none() && !s.trim().is_empty()
}
