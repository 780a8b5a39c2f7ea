#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Immutable in-memory crash dataset.
//!
//! The CSV is read exactly once into a [`CrashDataset`], which keeps both
//! the typed [`CrashRecord`]s used by filtering and ranking and the raw rows
//! used by the sample endpoint. The dataset is never mutated after loading;
//! callers share it behind an `Arc` and derive their own filtered views.

pub mod columns;
pub mod parsing;
pub mod paths;
pub mod progress;

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crash_map_crash_models::CrashRecord;
use thiserror::Error;

use crate::columns::ColumnLayout;
use crate::progress::ProgressCallback;

/// Rows between progress updates while loading.
const PROGRESS_INTERVAL: u64 = 10_000;

/// Errors that can occur while loading the dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset file does not exist.
    #[error("Dataset not found at {}", path.display())]
    NotFound {
        /// Path that was tried.
        path: PathBuf,
    },

    /// Reading the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV could not be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The file has no header row.
    #[error("CSV file contains no header row")]
    MissingHeader,
}

/// The loaded crash table.
pub struct CrashDataset {
    columns: Vec<String>,
    rows: Vec<csv::StringRecord>,
    records: Vec<CrashRecord>,
    layout: ColumnLayout,
}

impl CrashDataset {
    /// Loads the dataset from a CSV file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the file is missing, unreadable, or not
    /// valid CSV.
    pub fn load(path: &Path, progress: &Arc<dyn ProgressCallback>) -> Result<Self, DatasetError> {
        if !path.exists() {
            return Err(DatasetError::NotFound {
                path: paths::display_path(path),
            });
        }

        log::info!("Loading crash dataset from {}", path.display());
        let file = File::open(path)?;
        let dataset = Self::from_reader(file, progress)?;
        log::info!(
            "Loaded {} crashes ({} columns)",
            dataset.len(),
            dataset.columns.len()
        );
        Ok(dataset)
    }

    /// Loads the dataset from any CSV byte source.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the input is not valid CSV or has no
    /// header row.
    pub fn from_reader<R: Read>(
        reader: R,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_owned())
            .collect();

        if columns.iter().all(String::is_empty) {
            return Err(DatasetError::MissingHeader);
        }

        let layout = ColumnLayout::resolve(&columns);
        match layout.cause_column() {
            Some(name) => log::debug!("Using cause column {name}"),
            None => log::warn!("No cause column found; cause filters will be ignored"),
        }
        let missing = layout.missing();
        if !missing.is_empty() {
            log::warn!("Dataset is missing columns: {}", missing.join(", "));
        }

        progress.set_message("Reading crashes".to_string());

        let mut rows = Vec::new();
        let mut records = Vec::new();
        let mut pending: u64 = 0;

        for result in reader.records() {
            let row = result?;
            records.push(layout.parse_record(&row));
            rows.push(row);

            pending += 1;
            if pending == PROGRESS_INTERVAL {
                progress.inc(pending);
                pending = 0;
            }
        }
        progress.inc(pending);
        progress.finish(format!("Read {} crashes", records.len()));

        Ok(Self {
            columns,
            rows,
            records,
            layout,
        })
    }

    /// All crash records, in file order.
    #[must_use]
    pub fn records(&self) -> &[CrashRecord] {
        &self.records
    }

    /// CSV header names, in file order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Name of the resolved cause column, or `None` if the file has none.
    #[must_use]
    pub fn cause_column(&self) -> Option<&str> {
        self.layout.cause_column()
    }

    /// Whether cause-class filters can be applied to this dataset.
    #[must_use]
    pub fn has_cause_column(&self) -> bool {
        self.layout.cause_column().is_some()
    }

    /// Number of crashes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset holds no crashes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the first `limit` raw rows as JSON objects keyed by column.
    #[must_use]
    pub fn sample(&self, limit: usize) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .take(limit)
            .map(|row| {
                self.columns
                    .iter()
                    .enumerate()
                    .map(|(i, column)| {
                        let value = row.get(i).map_or(serde_json::Value::Null, parsing::cell_to_json);
                        (column.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}
