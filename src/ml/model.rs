// ============================================================
// Layer 5 — Emotion CNN
// ============================================================
// Fixed topology, sized only by image_size and num_classes:
//
//   input      [B, 1, S, S]
//   conv 3x3   32 filters, ReLU     → [B, 32, S-2, S-2]
//   max-pool 2                      → [B, 32, s1, s1]   s1 = (S-2)/2
//   conv 3x3   64 filters, ReLU     → [B, 64, s1-2, s1-2]
//   max-pool 2                      → [B, 64, s2, s2]   s2 = (s1-2)/2
//   flatten                         → [B, 64*s2*s2]
//   dense 128, ReLU
//   dropout 0.3 (training only)
//   dense C, softmax
//
// For S = 48: 46 → 23 → 21 → 10, flattened width 6400.
//
// Convolutions are unpadded and pools use stride = pool size.
//
// Reference: Burn Book §3 (Building Blocks)

use anyhow::{bail, Result};
use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{log_softmax, relu, softmax},
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct EmotionCnnConfig {
    pub image_size:  usize,
    pub num_classes: usize,
    #[config(default = 32)]
    pub conv1_filters: usize,
    #[config(default = 64)]
    pub conv2_filters: usize,
    #[config(default = 3)]
    pub kernel_size: usize,
    #[config(default = 2)]
    pub pool_size: usize,
    #[config(default = 128)]
    pub hidden_size: usize,
    #[config(default = 0.3)]
    pub dropout: f64,
}

impl EmotionCnnConfig {
    /// Side length of the feature map after one conv + pool block
    fn block_output(&self, side: usize) -> usize {
        side.saturating_sub(self.kernel_size - 1) / self.pool_size
    }

    /// Side length of the last feature map before flattening
    pub fn feature_map_size(&self) -> usize {
        self.block_output(self.block_output(self.image_size))
    }

    /// Width of the flattened feature vector fed to the dense layer
    pub fn flattened_size(&self) -> usize {
        let side = self.feature_map_size();
        self.conv2_filters * side * side
    }

    /// Reject configurations the topology cannot run on.
    pub fn check(&self) -> Result<()> {
        if self.num_classes == 0 {
            bail!("num_classes must be at least 1");
        }
        if self.feature_map_size() == 0 {
            bail!(
                "image_size {} is too small for two {}x{} conv + {}x{} pool blocks",
                self.image_size, self.kernel_size, self.kernel_size,
                self.pool_size, self.pool_size,
            );
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> EmotionCnn<B> {
        let kernel = [self.kernel_size, self.kernel_size];
        let pool   = [self.pool_size, self.pool_size];

        EmotionCnn {
            conv1:   Conv2dConfig::new([1, self.conv1_filters], kernel).init(device),
            conv2:   Conv2dConfig::new([self.conv1_filters, self.conv2_filters], kernel).init(device),
            pool:    MaxPool2dConfig::new(pool).with_strides(pool).init(),
            hidden:  LinearConfig::new(self.flattened_size(), self.hidden_size).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            output:  LinearConfig::new(self.hidden_size, self.num_classes).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct EmotionCnn<B: Backend> {
    pub conv1:   Conv2d<B>,
    pub conv2:   Conv2d<B>,
    pub pool:    MaxPool2d,
    pub hidden:  Linear<B>,
    pub dropout: Dropout,
    pub output:  Linear<B>,
}

impl<B: Backend> EmotionCnn<B> {
    /// images: [batch, 1, S, S] → unnormalised class scores [batch, C]
    pub fn forward_logits(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.pool.forward(relu(self.conv1.forward(images)));
        let x = self.pool.forward(relu(self.conv2.forward(x)));
        let x = x.flatten::<2>(1, 3);
        let x = self.dropout.forward(relu(self.hidden.forward(x)));
        self.output.forward(x)
    }

    /// images: [batch, 1, S, S] → class probabilities [batch, C]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        softmax(self.forward_logits(images), 1)
    }

    /// Categorical cross-entropy against one-hot targets, averaged over the batch.
    ///
    /// Computed from log-softmax of the logits rather than log of the
    /// softmax output, which is the same quantity without the underflow.
    pub fn forward_loss(
        &self,
        images:  Tensor<B, 4>,
        targets: Tensor<B, 2>,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward_logits(images);
        let loss   = categorical_cross_entropy(logits.clone(), targets);
        (loss, logits)
    }
}

/// Mean over the batch of −Σ target · log_softmax(logits).
pub fn categorical_cross_entropy<B: Backend>(
    logits:  Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    (targets * log_softmax(logits, 1))
        .sum_dim(1)
        .neg()
        .mean()
}

/// How many rows have their highest score at the target's 1.0.
pub fn correct_predictions<B: Backend>(scores: Tensor<B, 2>, targets: Tensor<B, 2>) -> usize {
    let predicted = scores.argmax(1);
    let expected  = targets.argmax(1);
    predicted
        .equal(expected)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_fer_sized_topology() {
        let cfg = EmotionCnnConfig::new(48, 7);
        assert_eq!(cfg.feature_map_size(), 10);
        assert_eq!(cfg.flattened_size(), 6400);
        assert!(cfg.check().is_ok());
    }

    #[test]
    fn test_too_small_image_is_rejected() {
        assert!(EmotionCnnConfig::new(5, 7).check().is_err());
        assert!(EmotionCnnConfig::new(10, 7).check().is_ok());
    }

    #[test]
    fn test_forward_shapes_and_probabilities() {
        let device = Default::default();
        let model: EmotionCnn<TestBackend> = EmotionCnnConfig::new(12, 7).init(&device);

        let images = Tensor::<TestBackend, 4>::zeros([3, 1, 12, 12], &device);
        let probs  = model.forward(images);
        assert_eq!(probs.dims(), [3, 7]);

        let sums: Vec<f32> = probs.sum_dim(1).into_data().to_vec().unwrap();
        for s in sums {
            assert!((s - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_cross_entropy_of_uniform_scores() {
        let device  = Default::default();
        let logits  = Tensor::<TestBackend, 2>::zeros([2, 4], &device);
        let targets = Tensor::<TestBackend, 2>::from_floats(
            [[1.0, 0.0, 0.0, 0.0], [0.0, 0.0, 1.0, 0.0]],
            &device,
        );
        let loss = categorical_cross_entropy(logits, targets)
            .into_scalar()
            .elem::<f64>();
        assert!((loss - (4.0f64).ln()).abs() < 1e-5);
    }

    #[test]
    fn test_correct_predictions() {
        let device = Default::default();
        let scores = Tensor::<TestBackend, 2>::from_floats(
            [[0.1, 0.9, 0.0], [0.8, 0.1, 0.1], [0.2, 0.3, 0.5]],
            &device,
        );
        let targets = Tensor::<TestBackend, 2>::from_floats(
            [[0.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            &device,
        );
        assert_eq!(correct_predictions(scores, targets), 2);
    }
}
