// ============================================================
// Layer 6 — Progress Reporting
// ============================================================
// Two ProgressObserver implementations:
//
//   ConsoleProgress — one line per epoch on stdout:
//                       Epoch 3: loss=1.2345, acc=52.10%
//                     training metrics only; validation numbers
//                     go to the debug log, not the console.
//
//   MetricsLogger   — appends every epoch, validation included,
//                     to a CSV file for plotting learning curves:
//                       epoch,train_loss,train_acc,val_loss,val_acc
//                       1,1.812300,0.251000,1.790100,0.262000
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

use crate::domain::traits::{EpochMetrics, ProgressObserver};

/// The console line for one epoch.
pub fn format_epoch_line(m: &EpochMetrics) -> String {
    format!(
        "Epoch {}: loss={:.4}, acc={:.2}%",
        m.epoch,
        m.train_loss,
        m.train_acc * 100.0,
    )
}

#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl ProgressObserver for ConsoleProgress {
    fn on_epoch_end(&mut self, metrics: &EpochMetrics) -> Result<()> {
        println!("{}", format_epoch_line(metrics));
        Ok(())
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger, writing the header if the file is new.
    /// An existing file is appended to, so several runs can share one log.
    pub fn new(csv_path: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = csv_path.into();

        if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create metrics CSV '{}'", csv_path.display()))?;
            writeln!(f, "epoch,train_loss,train_acc,val_loss,val_acc")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }
}

impl ProgressObserver for MetricsLogger {
    fn on_epoch_end(&mut self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        // Empty cells when there was no validation split
        let opt = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();

        writeln!(
            f,
            "{},{:.6},{:.6},{},{}",
            m.epoch,
            m.train_loss,
            m.train_acc,
            opt(m.val_loss),
            opt(m.val_acc),
        )?;
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_line_format() {
        let m = EpochMetrics::new(1, 1.234_56, 0.521).with_validation(9.0, 0.9);
        assert_eq!(format_epoch_line(&m), "Epoch 1: loss=1.2346, acc=52.10%");
    }

    #[test]
    fn test_csv_rows_are_appended() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/metrics.csv");

        let mut logger = MetricsLogger::new(&path).unwrap();
        logger.on_epoch_end(&EpochMetrics::new(1, 2.0, 0.25).with_validation(1.5, 0.5)).unwrap();
        logger.on_epoch_end(&EpochMetrics::new(2, 1.0, 0.5)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "epoch,train_loss,train_acc,val_loss,val_acc");
        assert_eq!(lines[1], "1,2.000000,0.250000,1.500000,0.500000");
        assert_eq!(lines[2], "2,1.000000,0.500000,,");
    }

    #[test]
    fn test_existing_file_keeps_single_header() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        MetricsLogger::new(&path).unwrap();
        MetricsLogger::new(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
