// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Minibatch training with Adam and a held-out validation pass.
//
// Per epoch:
//   1. Iterate shuffled training batches (seeded)
//   2. Forward, categorical cross-entropy, backward, Adam step
//   3. Accumulate sample-weighted loss and correct predictions
//   4. model.valid() → evaluate held-out rows with dropout off
//   5. Hand EpochMetrics to the progress observer
//
// Runs every epoch; there is no early stopping.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::sync::Arc;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    batcher::{FerBatch, FerBatcher},
    dataset::FerTensorDataset,
};
use crate::domain::traits::{EpochMetrics, ProgressObserver};
use crate::ml::model::{categorical_cross_entropy, correct_predictions, EmotionCnn, EmotionCnnConfig};

/// Adam with β1 = 0.9, β2 = 0.999, ε = 1e-7
pub fn optimizer_config() -> AdamConfig {
    AdamConfig::new()
        .with_beta_1(0.9)
        .with_beta_2(0.999)
        .with_epsilon(1e-7)
}

/// Train a fresh model and return it with its final parameters.
pub fn run_training<B: AutodiffBackend>(
    cfg:           &TrainConfig,
    model_cfg:     &EmotionCnnConfig,
    train_dataset: FerTensorDataset,
    val_dataset:   FerTensorDataset,
    device:        B::Device,
    observer:      &mut dyn ProgressObserver,
) -> Result<EmotionCnn<B>> {
    use burn::data::dataset::Dataset;

    if train_dataset.len() == 0 {
        bail!("validation split leaves no training samples");
    }
    if cfg.batch_size == 0 {
        bail!("batch_size must be at least 1");
    }

    B::seed(cfg.seed);

    let mut model: EmotionCnn<B> = model_cfg.init(&device);
    let mut optim = optimizer_config().init();
    tracing::info!(
        "Model ready: {}x{} input, {} classes, flattened width {}",
        model_cfg.image_size, model_cfg.image_size,
        model_cfg.num_classes, model_cfg.flattened_size(),
    );

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_batcher = FerBatcher::<B>::new(device.clone(), model_cfg.image_size);
    let train_loader  = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed)
        .build(train_dataset);

    // ── Validation data loader (InnerBackend — no autodiff overhead) ──────────
    let has_validation = val_dataset.len() > 0;
    let val_batcher = FerBatcher::<B::InnerBackend>::new(device.clone(), model_cfg.image_size);
    let val_loader  = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .build(val_dataset);

    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut correct  = 0usize;
        let mut seen     = 0usize;

        for batch in train_loader.iter() {
            let n = batch.len();
            let (loss, logits) = model.forward_loss(batch.images, batch.targets.clone());

            loss_sum += loss.clone().into_scalar().elem::<f64>() * n as f64;
            correct  += correct_predictions(logits.detach(), batch.targets);
            seen     += n;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }

        let train_loss = loss_sum / seen.max(1) as f64;
        let train_acc  = correct as f64 / seen.max(1) as f64;
        let mut metrics = EpochMetrics::new(epoch, train_loss, train_acc);

        // ── Validation phase ──────────────────────────────────────────────────
        if has_validation {
            let (val_loss, val_acc) = evaluate(&model.valid(), &val_loader);
            tracing::debug!(
                "Epoch {}: val_loss={:.4}, val_acc={:.2}%",
                epoch, val_loss, val_acc * 100.0,
            );
            metrics = metrics.with_validation(val_loss, val_acc);
        }

        observer.on_epoch_end(&metrics)?;
    }

    tracing::info!("Training complete after {} epochs", cfg.epochs);
    Ok(model)
}

/// Mean loss and accuracy of `model` over every batch of `loader`.
pub fn evaluate<B: Backend>(
    model:  &EmotionCnn<B>,
    loader: &Arc<dyn DataLoader<FerBatch<B>>>,
) -> (f64, f64) {
    let mut loss_sum = 0.0f64;
    let mut correct  = 0usize;
    let mut seen     = 0usize;

    for batch in loader.iter() {
        let n      = batch.len();
        let logits = model.forward_logits(batch.images);

        loss_sum += categorical_cross_entropy(logits.clone(), batch.targets.clone())
            .into_scalar()
            .elem::<f64>() * n as f64;
        correct  += correct_predictions(logits, batch.targets);
        seen     += n;
    }

    if seen == 0 {
        return (f64::NAN, 0.0);
    }
    (loss_sum / seen as f64, correct as f64 / seen as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::assembler::TensorAssembler;
    use crate::domain::sample::{FerDataset, FerSample};
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    struct Recorder(Vec<EpochMetrics>);

    impl ProgressObserver for Recorder {
        fn on_epoch_end(&mut self, metrics: &EpochMetrics) -> Result<()> {
            self.0.push(metrics.clone());
            Ok(())
        }
    }

    fn tensors(n: usize, size: usize) -> FerTensorDataset {
        // Assemble at least one row, then select n of them so n = 0 works too
        let ds: FerDataset = (0..n.max(1))
            .map(|i| FerSample::new(vec![(i % 3) as f32 / 2.0; size * size], i % 3))
            .collect();
        let all  = TensorAssembler::new(size, 3).assemble(&ds).unwrap();
        let rows = (0..n).collect::<Vec<_>>();
        FerTensorDataset::new(all.select(&rows))
    }

    fn small_config(epochs: usize) -> TrainConfig {
        TrainConfig {
            image_size:  10,
            num_classes: 3,
            batch_size:  4,
            epochs,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_one_metric_per_epoch() {
        let cfg       = small_config(3);
        let model_cfg = EmotionCnnConfig::new(10, 3);
        let mut rec   = Recorder(Vec::new());

        run_training::<TestBackend>(
            &cfg, &model_cfg, tensors(8, 10), tensors(2, 10), Default::default(), &mut rec,
        )
        .unwrap();

        let epochs: Vec<usize> = rec.0.iter().map(|m| m.epoch).collect();
        assert_eq!(epochs, vec![1, 2, 3]);
        for m in &rec.0 {
            assert!(m.train_loss.is_finite() && m.train_loss >= 0.0);
            assert!((0.0..=1.0).contains(&m.train_acc));
            assert!(m.val_loss.is_some());
            assert!((0.0..=1.0).contains(&m.val_acc.unwrap()));
        }
    }

    #[test]
    fn test_no_validation_rows() {
        let mut rec = Recorder(Vec::new());
        run_training::<TestBackend>(
            &small_config(1), &EmotionCnnConfig::new(10, 3),
            tensors(5, 10), tensors(0, 10), Default::default(), &mut rec,
        )
        .unwrap();
        assert_eq!(rec.0.len(), 1);
        assert!(rec.0[0].val_loss.is_none());
    }

    #[test]
    fn test_empty_training_set_is_an_error() {
        let mut rec = Recorder(Vec::new());
        let result = run_training::<TestBackend>(
            &small_config(1), &EmotionCnnConfig::new(10, 3),
            tensors(0, 10), tensors(1, 10), Default::default(), &mut rec,
        );
        assert!(result.is_err());
        assert!(rec.0.is_empty());
    }
}
