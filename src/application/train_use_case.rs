// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Idle
//    → Loading       read and validate every CSV row   (Layer 4)
//    → Assembling    image + one-hot label tensors      (Layer 4)
//    → Building      CNN topology check                 (Layer 5)
//    → Training(n)   epochs 1..=epochs                  (Layer 5)
//    → Saving        model directory + run config       (Layer 6)
//    → Done
//
// Any error moves the pipeline to Failed and aborts the run.
// Nothing is retried and nothing partial is saved.
//
// Reference: Burn Book §5 (Training)

use anyhow::{ensure, Context, Result};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::{
    assembler::TensorAssembler,
    dataset::FerTensorDataset,
    loader::{CsvLoader, MalformedRowPolicy},
    splitter::{split_indices, SplitStrategy},
};
use crate::domain::traits::{EpochMetrics, ProgressObserver, SampleSource};
use crate::infra::{
    metrics::{ConsoleProgress, MetricsLogger},
    model_store::ModelStore,
};
use crate::ml::{model::EmotionCnnConfig, trainer::run_training, TrainBackend};

// ─── Training Configuration ──────────────────────────────────────────────────
// Every knob of a run. The defaults are the values the web model
// has always been trained with. Saved as train_config.json next to
// the model so a run can be reproduced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub csv_path:            String,
    pub output_dir:          String,
    pub image_size:          usize,
    pub num_classes:         usize,
    pub batch_size:          usize,
    pub epochs:              usize,
    pub validation_fraction: f64,
    pub split:               SplitStrategy,
    pub seed:                u64,
    pub learning_rate:       f64,
    pub malformed_rows:      MalformedRowPolicy,
    pub usage:               Option<String>,
    pub metrics_csv:         Option<String>,
}

/// Upper bound on image_size² so per-row buffers stay addressable
const MAX_IMAGE_PIXELS: usize = 1 << 24;

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            csv_path:            "fer2013.csv".to_string(),
            output_dir:          "../web/model".to_string(),
            image_size:          48,
            num_classes:         7,
            batch_size:          64,
            epochs:              20,
            validation_fraction: 0.2,
            split:               SplitStrategy::Trailing,
            seed:                42,
            learning_rate:       1e-3,
            malformed_rows:      MalformedRowPolicy::Abort,
            usage:               None,
            metrics_csv:         None,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch_size > 0, "batch_size must be at least 1");
        ensure!(self.epochs > 0, "epochs must be at least 1");
        ensure!(
            self.image_size
                .checked_mul(self.image_size)
                .is_some_and(|n| n <= MAX_IMAGE_PIXELS),
            "image_size {} is too large (at most {} pixels per image)",
            self.image_size,
            MAX_IMAGE_PIXELS
        );
        ensure!(
            (0.0..1.0).contains(&self.validation_fraction),
            "validation_fraction must be in [0, 1), got {}",
            self.validation_fraction
        );
        ensure!(
            self.learning_rate.is_finite() && self.learning_rate > 0.0,
            "learning_rate must be positive"
        );
        Ok(())
    }

    pub fn model_config(&self) -> EmotionCnnConfig {
        EmotionCnnConfig::new(self.image_size, self.num_classes)
    }
}

// ─── Pipeline Stages ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Loading,
    Assembling,
    Building,
    Training(usize),
    Saving,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Training(epoch) => write!(f, "Training(epoch {epoch})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Remembers every stage the run has passed through.
#[derive(Debug)]
struct StageTracker {
    history: Vec<PipelineStage>,
}

impl StageTracker {
    fn new() -> Self {
        Self { history: vec![PipelineStage::Idle] }
    }

    fn current(&self) -> PipelineStage {
        *self.history.last().unwrap_or(&PipelineStage::Idle)
    }

    fn advance(&mut self, next: PipelineStage) {
        tracing::info!("Pipeline: {} → {}", self.current(), next);
        self.history.push(next);
    }
}

/// Forwards epoch metrics to the caller's observer while keeping a copy
/// and moving the stage tracker to the next epoch.
struct EpochTap<'a> {
    inner:   &'a mut dyn ProgressObserver,
    tracker: &'a mut StageTracker,
    epochs:  usize,
    seen:    Vec<EpochMetrics>,
}

impl ProgressObserver for EpochTap<'_> {
    fn on_epoch_end(&mut self, metrics: &EpochMetrics) -> Result<()> {
        self.seen.push(metrics.clone());
        self.inner.on_epoch_end(metrics)?;
        if metrics.epoch < self.epochs {
            self.tracker.advance(PipelineStage::Training(metrics.epoch + 1));
        }
        Ok(())
    }
}

/// What a finished run did.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub samples:    usize,
    pub train_rows: usize,
    pub val_rows:   usize,
    pub metrics:    Vec<EpochMetrics>,
    pub stages:     Vec<PipelineStage>,
    pub output_dir: String,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run against the configured CSV on the default training backend,
    /// reporting to the console and, if configured, the metrics CSV.
    pub fn execute(&self) -> Result<TrainReport> {
        let cfg    = &self.config;
        let loader = CsvLoader::new(&cfg.csv_path, cfg.image_size, cfg.num_classes)
            .with_policy(cfg.malformed_rows)
            .with_usage(cfg.usage.clone());

        let mut observers: Vec<Box<dyn ProgressObserver>> = vec![Box::new(ConsoleProgress)];
        if let Some(path) = &cfg.metrics_csv {
            observers.push(Box::new(MetricsLogger::new(path)?));
        }

        let device = burn::backend::wgpu::WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);
        self.run::<TrainBackend>(&loader, &mut observers, device)
    }

    /// Run the whole pipeline with an explicit source, observer and backend.
    pub fn run<B: AutodiffBackend>(
        &self,
        source:   &dyn SampleSource,
        observer: &mut dyn ProgressObserver,
        device:   B::Device,
    ) -> Result<TrainReport> {
        let mut tracker = StageTracker::new();

        match self.run_stages::<B>(source, observer, device, &mut tracker) {
            Ok(mut report) => {
                tracker.advance(PipelineStage::Done);
                report.stages = tracker.history;
                Ok(report)
            }
            Err(e) => {
                let failed_in = tracker.current();
                tracker.advance(PipelineStage::Failed);
                tracing::error!("Pipeline failed during {}: {:#}", failed_in, e);
                Err(e.context(format!("training pipeline failed during {failed_in}")))
            }
        }
    }

    fn run_stages<B: AutodiffBackend>(
        &self,
        source:   &dyn SampleSource,
        observer: &mut dyn ProgressObserver,
        device:   B::Device,
        tracker:  &mut StageTracker,
    ) -> Result<TrainReport> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Load every row ────────────────────────────────────────────────────
        tracker.advance(PipelineStage::Loading);
        let dataset = source.load_all().context("Cannot load dataset")?;
        let samples = dataset.len();

        // ── Images + one-hot labels ───────────────────────────────────────────
        tracker.advance(PipelineStage::Assembling);
        let tensors = TensorAssembler::new(cfg.image_size, cfg.num_classes)
            .assemble(&dataset)
            .context("Cannot assemble tensors")?;
        tracing::info!(
            "Images {:?}, labels {:?}, class counts {:?}",
            tensors.images.shape(),
            tensors.labels.shape(),
            dataset.class_counts(cfg.num_classes),
        );
        drop(dataset);

        let (train_idx, val_idx) =
            split_indices(tensors.len(), cfg.validation_fraction, cfg.split, cfg.seed);
        let train_rows = train_idx.len();
        let val_rows   = val_idx.len();
        let train_set  = FerTensorDataset::new(tensors.select(&train_idx));
        let val_set    = FerTensorDataset::new(tensors.select(&val_idx));
        drop(tensors);
        tracing::info!("Split: {} train, {} validation", train_rows, val_rows);

        // ── Model topology ────────────────────────────────────────────────────
        tracker.advance(PipelineStage::Building);
        let model_cfg = cfg.model_config();
        model_cfg.check()?;

        // ── Epoch loop ────────────────────────────────────────────────────────
        tracker.advance(PipelineStage::Training(1));
        tracing::info!("Training model for {} epochs", cfg.epochs);
        let (model, metrics) = {
            let mut tap = EpochTap {
                inner:   observer,
                tracker: &mut *tracker,
                epochs:  cfg.epochs,
                seen:    Vec::new(),
            };
            let model = run_training::<B>(cfg, &model_cfg, train_set, val_set, device, &mut tap)?;
            (model, tap.seen)
        };

        // ── Persist ───────────────────────────────────────────────────────────
        tracker.advance(PipelineStage::Saving);
        let store = ModelStore::new(&cfg.output_dir);
        store.save_model(&model, &model_cfg)?;
        store.save_config(cfg)?;

        Ok(TrainReport {
            samples,
            train_rows,
            val_rows,
            metrics,
            stages: Vec::new(),
            output_dir: cfg.output_dir.clone(),
        })
    }
}
