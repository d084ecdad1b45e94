//! CSV reading for employee datasets.

use super::{Dataset, DatasetSchema};
use crate::error::DataLoadError;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Read a CSV file with a header row into a validated [`Dataset`].
pub fn load_csv(path: &Path, schema: &DatasetSchema) -> Result<Dataset, DataLoadError> {
    debug!("Reading dataset from {}", path.display());

    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let csv_error = |source: csv::Error| DataLoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(String::from)
        .collect();

    // A lone empty header field means the file had no header line at all.
    if headers.iter().all(|h| h.is_empty()) {
        return Err(DataLoadError::Header {
            path: path.to_path_buf(),
            reason: "no columns".to_string(),
        });
    }

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        records.push(record.iter().map(String::from).collect());
    }

    let dataset = Dataset::from_records(path, headers, records, schema)?;

    info!(
        "Loaded {} employee records ({} columns) from {}",
        dataset.len(),
        dataset.columns().len(),
        path.display()
    );

    Ok(dataset)
}
