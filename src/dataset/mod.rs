//! In-memory employee table.
//!
//! A [`Dataset`] is built once from CSV records, validated against a
//! [`DatasetSchema`], and shared read-only (behind `Arc`) for the rest of
//! the process.

pub mod cache;
pub mod loader;

pub use cache::DatasetCache;
pub use loader::load_csv;

use crate::config::{BandConfig, DataConfig};
use crate::error::{DataLoadError, InvalidFeatureError};
use crate::models::{parse_flag, ColumnKind, Value};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What the loader expects from a dataset.
#[derive(Debug, Clone)]
pub struct DatasetSchema {
    /// Binary outcome column.
    pub outcome: String,
    /// Fixed feature list; empty means infer.
    pub features: Vec<String>,
    /// Columns never inferred as features.
    pub exclude: Vec<String>,
    /// Upper bound on distinct values for inferred features.
    pub max_categories: usize,
    /// Derived banded columns.
    pub bands: Vec<BandConfig>,
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self::from(&DataConfig::default())
    }
}

impl From<&DataConfig> for DatasetSchema {
    fn from(config: &DataConfig) -> Self {
        Self {
            outcome: config.outcome_column.clone(),
            features: config.features.clone(),
            exclude: config.exclude_columns.clone(),
            max_categories: config.max_categories,
            bands: config.bands.clone(),
        }
    }
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Immutable table of employee records.
#[derive(Debug)]
pub struct Dataset {
    source: PathBuf,
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    /// Row-major cells; every row has `columns.len()` entries.
    rows: Vec<Vec<Option<Value>>>,
    outcome: String,
    features: Vec<String>,
}

impl Dataset {
    /// Build and validate a dataset from raw header and record fields.
    pub fn from_records(
        source: &Path,
        headers: Vec<String>,
        records: Vec<Vec<String>>,
        schema: &DatasetSchema,
    ) -> Result<Self, DataLoadError> {
        validate_headers(source, &headers)?;

        if records.is_empty() {
            return Err(DataLoadError::Empty {
                path: source.to_path_buf(),
            });
        }
        if let Some((row, record)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != headers.len())
        {
            return Err(DataLoadError::RaggedRow {
                path: source.to_path_buf(),
                row: row + 1,
                expected: headers.len(),
                found: record.len(),
            });
        }

        let rows: Vec<Vec<Option<Value>>> = records
            .iter()
            .map(|record| record.iter().map(|field| Value::parse(field)).collect())
            .collect();

        let mut columns: Vec<Column> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| Column {
                name: name.clone(),
                kind: infer_kind(rows.iter().map(|row| row[i].as_ref())),
            })
            .collect();

        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        let mut dataset = Self {
            source: source.to_path_buf(),
            columns: Vec::new(),
            index,
            rows,
            outcome: schema.outcome.clone(),
            features: Vec::new(),
        };

        dataset.validate_outcome(&schema.outcome)?;
        if let Some(&i) = dataset.index.get(&schema.outcome) {
            columns[i].kind = ColumnKind::Binary;
        }
        dataset.columns = columns;

        for band in &schema.bands {
            dataset.add_band(band)?;
        }

        dataset.features = dataset.resolve_features(schema)?;

        debug!(
            "Dataset {}: {} rows, {} columns, features: {:?}",
            dataset.source.display(),
            dataset.rows.len(),
            dataset.columns.len(),
            dataset.features
        );

        Ok(dataset)
    }

    /// File the dataset was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows (never true for a loaded dataset).
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All columns, including derived bands.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column metadata by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    /// Configured outcome column.
    pub fn outcome_column(&self) -> &str {
        &self.outcome
    }

    /// Selectable features, in display order.
    pub fn feature_columns(&self) -> &[String] {
        &self.features
    }

    /// Position of a column, or `InvalidFeatureError` if absent.
    pub fn column_index(&self, name: &str) -> Result<usize, InvalidFeatureError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| InvalidFeatureError::UnknownColumn(name.to_string()))
    }

    /// Cells of one column in row order.
    pub fn values(&self, column: usize) -> impl Iterator<Item = Option<&Value>> + '_ {
        self.rows.iter().map(move |row| row[column].as_ref())
    }

    /// Outcome of every row as a flag.
    pub fn outcome_flags(&self, name: &str) -> Result<Vec<bool>, InvalidFeatureError> {
        let i = self.column_index(name)?;
        self.values(i)
            .map(|cell| cell.and_then(Value::as_flag))
            .collect::<Option<Vec<bool>>>()
            .ok_or_else(|| InvalidFeatureError::NotBinary(name.to_string()))
    }

    /// Distinct non-null values of a column in natural order.
    pub fn distinct_values(&self, name: &str) -> Result<Vec<Value>, InvalidFeatureError> {
        let i = self.column_index(name)?;
        let mut seen = HashSet::new();
        let mut values: Vec<Value> = self
            .values(i)
            .flatten()
            .filter(|v| seen.insert(v.to_string()))
            .cloned()
            .collect();
        values.sort_by(|a, b| a.natural_cmp(b));
        Ok(values)
    }

    /// Overall share of positive outcomes.
    pub fn outcome_rate(&self) -> Result<f64, InvalidFeatureError> {
        let flags = self.outcome_flags(&self.outcome)?;
        let positives = flags.iter().filter(|&&f| f).count();
        Ok(positives as f64 / flags.len().max(1) as f64)
    }

    fn validate_outcome(&self, outcome: &str) -> Result<(), DataLoadError> {
        let i = self
            .index
            .get(outcome)
            .copied()
            .ok_or_else(|| DataLoadError::MissingColumn {
                path: self.source.clone(),
                column: outcome.to_string(),
            })?;

        for (row, cell) in self.values(i).enumerate() {
            let raw = cell.map(|v| v.to_string()).unwrap_or_default();
            if parse_flag(&raw).is_none() {
                return Err(DataLoadError::NonBinaryOutcome {
                    path: self.source.clone(),
                    column: outcome.to_string(),
                    row: row + 1,
                    value: raw,
                });
            }
        }

        Ok(())
    }

    fn add_band(&mut self, band: &BandConfig) -> Result<(), DataLoadError> {
        let invalid = |reason: String| DataLoadError::InvalidBand {
            column: band.column.clone(),
            reason,
        };

        let name = band.output_name();
        if self.index.contains_key(&name) {
            return Err(invalid(format!("column '{}' already exists", name)));
        }

        let Some(&source) = self.index.get(&band.column) else {
            warn!("Skipping band '{}': column '{}' not in dataset", name, band.column);
            return Ok(());
        };
        if self.columns[source].kind != ColumnKind::Numeric {
            return Err(invalid(format!(
                "column is {}, not numeric",
                self.columns[source].kind
            )));
        }

        let labels = band_labels(&band.edges);
        for row in &mut self.rows {
            let banded = row[source].as_ref().and_then(Value::as_number).map(|n| {
                let rank = band
                    .edges
                    .iter()
                    .position(|edge| n < *edge)
                    .unwrap_or(band.edges.len());
                Value::Band {
                    rank,
                    label: labels[rank].clone(),
                }
            });
            row.push(banded);
        }

        self.index.insert(name.clone(), self.columns.len());
        self.columns.push(Column {
            name,
            kind: ColumnKind::Banded,
        });

        Ok(())
    }

    fn resolve_features(&self, schema: &DatasetSchema) -> Result<Vec<String>, DataLoadError> {
        if !schema.features.is_empty() {
            let mut features = Vec::new();
            for feature in &schema.features {
                if !self.index.contains_key(feature) {
                    return Err(DataLoadError::MissingColumn {
                        path: self.source.clone(),
                        column: feature.clone(),
                    });
                }
                if !features.contains(feature) {
                    features.push(feature.clone());
                }
            }
            return Ok(features);
        }

        let mut features: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.name != schema.outcome && !schema.exclude.contains(&c.name))
            .filter(|(i, c)| {
                if c.kind == ColumnKind::Banded {
                    return true;
                }
                let distinct: HashSet<String> =
                    self.values(*i).flatten().map(|v| v.to_string()).collect();
                (2..=schema.max_categories).contains(&distinct.len())
            })
            .map(|(_, c)| c.name.clone())
            .collect();
        features.sort();

        Ok(features)
    }
}

/// Labels for bands cut at `edges`: `< e0`, `e0-e1`, ..., `>= eN`.
pub fn band_labels(edges: &[f64]) -> Vec<String> {
    let fmt = |e: f64| Value::Number(e).to_string();
    let mut labels = Vec::with_capacity(edges.len() + 1);

    if let Some(&first) = edges.first() {
        labels.push(format!("< {}", fmt(first)));
    }
    for pair in edges.windows(2) {
        labels.push(format!("{}-{}", fmt(pair[0]), fmt(pair[1])));
    }
    if let Some(&last) = edges.last() {
        labels.push(format!(">= {}", fmt(last)));
    }

    labels
}

fn validate_headers(source: &Path, headers: &[String]) -> Result<(), DataLoadError> {
    let header_error = |reason: String| DataLoadError::Header {
        path: source.to_path_buf(),
        reason,
    };

    if headers.is_empty() {
        return Err(header_error("no columns".to_string()));
    }

    let mut seen = HashSet::new();
    for (i, name) in headers.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(header_error(format!("column {} has no name", i + 1)));
        }
        if !seen.insert(name.as_str()) {
            return Err(header_error(format!("duplicate column '{}'", name)));
        }
    }

    Ok(())
}

fn infer_kind<'a>(cells: impl Iterator<Item = Option<&'a Value>>) -> ColumnKind {
    let mut binary = true;
    let mut numeric = true;

    for value in cells.flatten() {
        binary &= value.as_flag().is_some();
        numeric &= value.as_number().is_some();
        if !binary && !numeric {
            break;
        }
    }

    if binary {
        ColumnKind::Binary
    } else if numeric {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}
