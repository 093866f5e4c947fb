// ============================================================
// Layer 4 — Data Errors
// ============================================================
// Every way loading or assembling can fail, as a typed enum so
// callers (and tests) can tell an empty file from a bad row.
// Upper layers wrap these in anyhow with stage context.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    /// The input file could not be opened; nothing was read.
    #[error("cannot open dataset '{path}': {source}")]
    Open {
        path:   PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The CSV framing itself is broken (bad quoting, I/O mid-read).
    #[error("CSV error at row {row}: {source}")]
    Csv {
        row:    usize,
        #[source]
        source: csv::Error,
    },

    /// A row parsed as CSV but its cells are not a valid sample.
    /// `row` is the 1-based data row (the header is not counted).
    #[error("malformed row {row}: {reason}")]
    Row { row: usize, reason: RowError },

    #[error("dataset is empty: no samples to assemble")]
    EmptyDataset,

    /// A sample handed to the assembler does not fit the configured shape.
    #[error("sample {index} does not match the configured shape: {reason}")]
    Shape { index: usize, reason: RowError },
}

/// Why a single row was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("expected {expected} pixel values, found {found}")]
    PixelCount { expected: usize, found: usize },

    #[error("pixel {position} ('{token}') is not a number")]
    PixelNotNumeric { position: usize, token: String },

    #[error("pixel {position} value {value} is outside 0..=255")]
    PixelOutOfRange { position: usize, value: f32 },

    #[error("label '{0}' is not an integer")]
    LabelNotInteger(String),

    #[error("label {label} is outside 0..{num_classes}")]
    LabelOutOfRange { label: i64, num_classes: usize },
}
