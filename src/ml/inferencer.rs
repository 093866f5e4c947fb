// ============================================================
// Layer 5 — Inferencer
// ============================================================
use anyhow::{ensure, Result};
use burn::prelude::*;

use crate::domain::emotion::Emotion;
use crate::infra::model_store::ModelStore;
use crate::ml::model::{EmotionCnn, EmotionCnnConfig};

/// Images per forward pass; bounds activation memory on large CSVs
pub const PREDICT_BATCH_SIZE: usize = 64;

/// Most likely class for one image and its probability.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label:         usize,
    pub confidence:    f32,
    pub probabilities: Vec<f32>,
}

impl Prediction {
    pub fn emotion(&self) -> Option<Emotion> {
        Emotion::from_label(self.label)
    }
}

pub struct Inferencer<B: Backend> {
    model:  EmotionCnn<B>,
    config: EmotionCnnConfig,
    device: B::Device,
}

impl<B: Backend> Inferencer<B> {
    pub fn new(model: EmotionCnn<B>, config: EmotionCnnConfig, device: B::Device) -> Self {
        Self { model, config, device }
    }

    pub fn from_store(store: &ModelStore, device: B::Device) -> Result<Self> {
        let (model, config) = store.load_model::<B>(&device)?;
        tracing::info!("Model loaded from '{}'", store.dir().display());
        Ok(Self::new(model, config, device))
    }

    pub fn config(&self) -> &EmotionCnnConfig {
        &self.config
    }

    /// Classify a batch of flat, normalised images.
    pub fn predict(&self, images: &[Vec<f32>]) -> Result<Vec<Prediction>> {
        let side     = self.config.image_size;
        let expected = side * side;

        for (i, img) in images.iter().enumerate() {
            ensure!(
                img.len() == expected,
                "image {} has {} pixels, model expects {}", i, img.len(), expected
            );
        }
        let mut predictions = Vec::with_capacity(images.len());
        for chunk in images.chunks(PREDICT_BATCH_SIZE) {
            predictions.extend(self.predict_chunk(chunk)?);
        }
        Ok(predictions)
    }

    /// One forward pass over at most PREDICT_BATCH_SIZE images.
    fn predict_chunk(&self, images: &[Vec<f32>]) -> Result<Vec<Prediction>> {
        let side = self.config.image_size;
        let flat: Vec<f32> = images.iter().flatten().copied().collect();
        let input = Tensor::<B, 1>::from_floats(flat.as_slice(), &self.device)
            .reshape([images.len(), 1, side, side]);

        let probs: Vec<f32> = self
            .model
            .forward(input)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read model output: {e:?}"))?;

        let predictions = probs
            .chunks(self.config.num_classes)
            .map(|row| {
                let (label, confidence) = row
                    .iter()
                    .copied()
                    .enumerate()
                    .fold((0, f32::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best });
                Prediction { label, confidence, probabilities: row.to_vec() }
            })
            .collect();

        Ok(predictions)
    }
}
