// ============================================================
// Layer 4 — FER CSV Loader
// ============================================================
// Reads a FER2013-style CSV file into a FerDataset.
//
// Expected layout (header row required, extra columns ignored):
//
//   emotion,pixels,Usage
//   0,70 80 82 72 58 ...,Training
//   2,151 150 147 155 ...,PublicTest
//
//   emotion — integer class index in 0..num_classes
//   pixels  — image_size² space-separated intensities, 0..=255
//   Usage   — optional split tag shipped with FER2013
//
// Every pixel is divided by 255 while parsing, so samples leave
// this module already normalised to [0, 1].
//
// The file is read in one sequential pass; the caller gets the
// full dataset or an error, never a partial result.
//
// Reference: csv crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    io::Read,
    path::PathBuf,
};

use crate::data::error::{DataError, RowError};
use crate::domain::sample::{FerDataset, FerSample};
use crate::domain::traits::SampleSource;

const LABEL_COLUMN: &str = "emotion";
const PIXELS_COLUMN: &str = "pixels";
const USAGE_COLUMN: &str = "Usage";

/// What to do with a row that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRowPolicy {
    /// Stop the load at the first bad row
    #[default]
    Abort,
    /// Log a warning naming the row and keep going
    Skip,
}

/// Loads FER samples from a CSV file on disk.
/// Implements the SampleSource trait from Layer 3.
pub struct CsvLoader {
    path:        PathBuf,
    image_size:  usize,
    num_classes: usize,
    policy:      MalformedRowPolicy,
    usage:       Option<String>,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>, image_size: usize, num_classes: usize) -> Self {
        Self {
            path: path.into(),
            image_size,
            num_classes,
            policy: MalformedRowPolicy::default(),
            usage: None,
        }
    }

    pub fn with_policy(mut self, policy: MalformedRowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Keep only rows whose `Usage` column equals `usage`
    pub fn with_usage(mut self, usage: Option<String>) -> Self {
        self.usage = usage;
        self
    }

    /// Open the file and parse it. Fails with `DataError::Open`
    /// before any row is looked at if the file cannot be opened.
    pub fn load(&self) -> Result<FerDataset, DataError> {
        // Flexible so short rows reach the malformed-row policy
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(|source| DataError::Open { path: self.path.clone(), source })?;
        let dataset = self.read_records(reader)?;

        println!("CSV loaded");
        tracing::info!(
            "Loaded {} samples from '{}'",
            dataset.len(),
            self.path.display()
        );
        Ok(dataset)
    }

    /// Parse every record of an already-open CSV reader.
    pub fn read_records<R: Read>(&self, mut reader: csv::Reader<R>) -> Result<FerDataset, DataError> {
        // Resolve column positions from the header once
        let headers = reader
            .headers()
            .map_err(|source| DataError::Csv { row: 0, source })?
            .clone();
        let label_idx  = column_index(&headers, LABEL_COLUMN);
        let pixels_idx = column_index(&headers, PIXELS_COLUMN);
        let usage_idx  = column_index(&headers, USAGE_COLUMN);

        let mut samples = Vec::new();
        let mut skipped = 0usize;
        let mut filtered = 0usize;

        for (i, record) in reader.records().enumerate() {
            let row    = i + 1;
            let record = record.map_err(|source| DataError::Csv { row, source })?;

            let usage = usage_idx.and_then(|idx| record.get(idx)).map(str::to_string);

            if let Some(wanted) = &self.usage {
                if usage.as_deref() != Some(wanted.as_str()) {
                    filtered += 1;
                    continue;
                }
            }

            let label_cell  = label_idx.and_then(|idx| record.get(idx));
            let pixels_cell = pixels_idx.and_then(|idx| record.get(idx));

            let parsed = match (label_cell, pixels_cell) {
                (None, _) => Err(RowError::MissingColumn(LABEL_COLUMN)),
                (_, None) => Err(RowError::MissingColumn(PIXELS_COLUMN)),
                (Some(label), Some(pixels)) => {
                    parse_label(label, self.num_classes).and_then(|label| {
                        parse_pixels(pixels, self.image_size).map(|pixels| (pixels, label))
                    })
                }
            };

            match parsed {
                Ok((pixels, label)) => samples.push(FerSample { usage, ..FerSample::new(pixels, label) }),
                Err(reason) => match self.policy {
                    MalformedRowPolicy::Abort => return Err(DataError::Row { row, reason }),
                    MalformedRowPolicy::Skip => {
                        tracing::warn!("Skipping row {}: {}", row, reason);
                        skipped += 1;
                    }
                },
            }
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} malformed rows", skipped);
        }
        if filtered > 0 {
            tracing::debug!("Dropped {} rows not matching the usage filter", filtered);
        }

        Ok(FerDataset::new(samples))
    }
}

impl SampleSource for CsvLoader {
    fn load_all(&self) -> Result<FerDataset> {
        Ok(self.load()?)
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

/// Parse an integer class label and check it against the class count.
pub fn parse_label(cell: &str, num_classes: usize) -> Result<usize, RowError> {
    let cell  = cell.trim();
    let label = cell
        .parse::<i64>()
        .map_err(|_| RowError::LabelNotInteger(cell.to_string()))?;

    if label < 0 || label as u64 >= num_classes as u64 {
        return Err(RowError::LabelOutOfRange { label, num_classes });
    }
    Ok(label as usize)
}

/// Parse a whitespace-separated pixel cell into normalised intensities.
/// The token count must be exactly `image_size²`; nothing is padded or truncated.
pub fn parse_pixels(cell: &str, image_size: usize) -> Result<Vec<f32>, RowError> {
    let expected = image_size * image_size;
    let tokens: Vec<&str> = cell.split_whitespace().collect();

    if tokens.len() != expected {
        return Err(RowError::PixelCount { expected, found: tokens.len() });
    }

    tokens
        .iter()
        .enumerate()
        .map(|(position, token)| {
            let value = token.parse::<f32>().map_err(|_| RowError::PixelNotNumeric {
                position,
                token: token.to_string(),
            })?;
            if !(0.0..=255.0).contains(&value) {
                return Err(RowError::PixelOutOfRange { position, value });
            }
            Ok(value / 255.0)
        })
        .collect()
}
