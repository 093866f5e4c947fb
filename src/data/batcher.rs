// ============================================================
// Layer 4 — FER Batcher
// ============================================================
// Implements Burn's Batcher trait to stack FerItems into the
// tensors one training step needs.
//
// How batching works here:
//   Input:  Vec of B FerItems, each with S*S pixels and a
//           C-long one-hot target
//   Output: FerBatch with
//             images  [B, 1, S, S]   (burn convs are channels-first)
//             targets [B, C]
//
//   Items are stored as [S, S, 1]; with a single channel that is
//   the same memory layout as [1, S, S], so one reshape is enough.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::FerItem;

#[derive(Debug, Clone)]
pub struct FerBatch<B: Backend> {
    /// Shape: [batch_size, 1, image_size, image_size]
    pub images: Tensor<B, 4>,

    /// One-hot targets — shape: [batch_size, num_classes]
    pub targets: Tensor<B, 2>,
}

impl<B: Backend> FerBatch<B> {
    pub fn len(&self) -> usize {
        self.images.dims()[0]
    }
}

#[derive(Clone, Debug)]
pub struct FerBatcher<B: Backend> {
    pub device:     B::Device,
    pub image_size: usize,
}

impl<B: Backend> FerBatcher<B> {
    pub fn new(device: B::Device, image_size: usize) -> Self {
        Self { device, image_size }
    }
}

impl<B: Backend> Batcher<FerItem, FerBatch<B>> for FerBatcher<B> {
    fn batch(&self, items: Vec<FerItem>) -> FerBatch<B> {
        let batch_size  = items.len();
        let num_classes = items.first().map_or(0, |i| i.target.len());

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|item| item.pixels.iter().copied())
            .collect();

        let targets: Vec<f32> = items
            .iter()
            .flat_map(|item| item.target.iter().copied())
            .collect();

        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([batch_size, 1, self.image_size, self.image_size]);

        let targets = Tensor::<B, 1>::from_floats(targets.as_slice(), &self.device)
            .reshape([batch_size, num_classes]);

        FerBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shapes_and_values() {
        let device  = Default::default();
        let batcher = FerBatcher::<NdArray>::new(device, 2);
        let items = vec![
            FerItem { pixels: vec![0.0, 0.25, 0.5, 1.0], target: vec![0.0, 1.0, 0.0] },
            FerItem { pixels: vec![1.0; 4],              target: vec![0.0, 0.0, 1.0] },
        ];

        let batch = batcher.batch(items);
        assert_eq!(batch.images.dims(), [2, 1, 2, 2]);
        assert_eq!(batch.targets.dims(), [2, 3]);
        assert_eq!(batch.len(), 2);

        let px: Vec<f32> = batch.images.into_data().to_vec().unwrap();
        assert_eq!(&px[..4], &[0.0, 0.25, 0.5, 1.0]);
    }
}
