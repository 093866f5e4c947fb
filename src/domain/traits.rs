// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The pipeline is written against these traits, not against
// concrete loaders or printers:
//   - CsvLoader implements SampleSource
//   - ConsoleProgress, MetricsLogger and test recorders
//     implement ProgressObserver
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::domain::sample::FerDataset;

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Anything that can produce a full dataset in one call.
/// The call returns only once every row has been read.
pub trait SampleSource {
    fn load_all(&self) -> Result<FerDataset>;
}

// ─── EpochMetrics ─────────────────────────────────────────────────────────────
/// Summary of one training pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 1-based epoch index
    pub epoch: usize,

    /// Sample-weighted mean categorical cross-entropy over the epoch
    pub train_loss: f64,

    /// Fraction of training samples classified correctly, in [0, 1]
    pub train_acc: f64,

    /// Held-out metrics; None when the split holds out nothing
    pub val_loss: Option<f64>,
    pub val_acc:  Option<f64>,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, train_acc: f64) -> Self {
        Self { epoch, train_loss, train_acc, val_loss: None, val_acc: None }
    }

    pub fn with_validation(mut self, val_loss: f64, val_acc: f64) -> Self {
        self.val_loss = Some(val_loss);
        self.val_acc  = Some(val_acc);
        self
    }
}

// ─── ProgressObserver ─────────────────────────────────────────────────────────
/// Receives one call per finished epoch.
pub trait ProgressObserver {
    fn on_epoch_end(&mut self, metrics: &EpochMetrics) -> Result<()>;
}

/// Fan out to several observers in registration order.
impl ProgressObserver for Vec<Box<dyn ProgressObserver>> {
    fn on_epoch_end(&mut self, metrics: &EpochMetrics) -> Result<()> {
        for observer in self.iter_mut() {
            observer.on_epoch_end(metrics)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    #[test]
    fn test_validation_is_optional() {
        let m = EpochMetrics::new(1, 1.0, 0.5);
        assert_eq!((m.val_loss, m.val_acc), (None, None));
        let m = m.with_validation(2.3, 0.25);
        assert_eq!((m.val_loss, m.val_acc), (Some(2.3), Some(0.25)));
    }

    struct Counter(Rc<Cell<usize>>);

    impl ProgressObserver for Counter {
        fn on_epoch_end(&mut self, _m: &EpochMetrics) -> Result<()> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn test_fan_out_reaches_every_observer() {
        let a = Rc::new(Cell::new(0));
        let b = Rc::new(Cell::new(0));
        let mut observers: Vec<Box<dyn ProgressObserver>> =
            vec![Box::new(Counter(a.clone())), Box::new(Counter(b.clone()))];
        observers.on_epoch_end(&EpochMetrics::new(1, 0.5, 0.5)).unwrap();
        observers.on_epoch_end(&EpochMetrics::new(2, 0.4, 0.6)).unwrap();
        assert_eq!(a.get(), 2);
        assert_eq!(b.get(), 2);
    }
}
