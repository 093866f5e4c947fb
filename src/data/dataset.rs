use burn::data::dataset::Dataset;

use crate::data::assembler::AssembledTensors;

/// One row of the assembled tensors, as handed to the batcher.
#[derive(Debug, Clone, PartialEq)]
pub struct FerItem {
    /// `image_size²` normalised pixels, row-major
    pub pixels: Vec<f32>,
    /// One-hot target of length `num_classes`
    pub target: Vec<f32>,
}

/// Burn dataset view over assembled image/label tensors.
pub struct FerTensorDataset {
    tensors: AssembledTensors,
}

impl FerTensorDataset {
    pub fn new(tensors: AssembledTensors) -> Self { Self { tensors } }
}

impl Dataset<FerItem> for FerTensorDataset {
    fn get(&self, index: usize) -> Option<FerItem> {
        if index >= self.tensors.len() {
            return None;
        }
        Some(FerItem {
            pixels: self.tensors.images.row(index).to_vec(),
            target: self.tensors.labels.row(index).to_vec(),
        })
    }

    fn len(&self) -> usize {
        self.tensors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::assembler::TensorAssembler;
    use crate::domain::sample::{FerDataset, FerSample};

    #[test]
    fn test_get_returns_matching_rows() {
        let ds = FerDataset::new(vec![
            FerSample::new(vec![0.0; 4], 2),
            FerSample::new(vec![1.0; 4], 5),
        ]);
        let tensors = TensorAssembler::new(2, 7).assemble(&ds).unwrap();
        let dataset = FerTensorDataset::new(tensors);

        assert_eq!(dataset.len(), 2);
        let item = dataset.get(1).unwrap();
        assert_eq!(item.pixels, vec![1.0; 4]);
        assert_eq!(item.target[5], 1.0);
        assert!(dataset.get(2).is_none());
    }
}
