// ============================================================
// Layer 4 — Tensor Assembler
// ============================================================
// Turns a FerDataset into the two dense arrays the model eats:
//
//   Image tensor: [N, S, S, 1]   pixels, row-major, one channel
//   Label tensor: [N, C]         one-hot emotion vectors
//
// where N = samples, S = image_size, C = num_classes.
//
// This is a pure function of the dataset: same input, same
// bytes out. No device, no backend; rows reach burn through
// FerTensorDataset and FerBatcher.
//
// Reference: Burn Book §3 (Tensor)

use crate::data::error::{DataError, RowError};
use crate::domain::sample::FerDataset;

/// Dense `[N, S, S, 1]` image array.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data:  Vec<f32>,
    shape: [usize; 4],
}

/// Dense `[N, C]` one-hot label array.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelTensor {
    data:  Vec<f32>,
    shape: [usize; 2],
}

impl ImageTensor {
    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    /// Number of values in one image
    pub fn row_len(&self) -> usize {
        self.shape[1] * self.shape[2] * self.shape[3]
    }

    pub fn row(&self, index: usize) -> &[f32] {
        let len = self.row_len();
        &self.data[index * len..(index + 1) * len]
    }
}

impl LabelTensor {
    pub fn shape(&self) -> [usize; 2] {
        self.shape
    }

    pub fn row(&self, index: usize) -> &[f32] {
        let len = self.shape[1];
        &self.data[index * len..(index + 1) * len]
    }
}

/// Images and labels with the same leading dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledTensors {
    pub images: ImageTensor,
    pub labels: LabelTensor,
}

impl AssembledTensors {
    pub fn len(&self) -> usize {
        self.images.shape[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_classes(&self) -> usize {
        self.labels.shape[1]
    }

    /// Gather the given rows, in the given order, into new tensors.
    pub fn select(&self, rows: &[usize]) -> AssembledTensors {
        let mut images = Vec::with_capacity(rows.len() * self.images.row_len());
        let mut labels = Vec::with_capacity(rows.len() * self.num_classes());

        for &r in rows {
            images.extend_from_slice(self.images.row(r));
            labels.extend_from_slice(self.labels.row(r));
        }

        let [_, h, w, c] = self.images.shape;
        AssembledTensors {
            images: ImageTensor { data: images, shape: [rows.len(), h, w, c] },
            labels: LabelTensor { data: labels, shape: [rows.len(), self.num_classes()] },
        }
    }
}

pub struct TensorAssembler {
    image_size:  usize,
    num_classes: usize,
}

impl TensorAssembler {
    pub fn new(image_size: usize, num_classes: usize) -> Self {
        Self { image_size, num_classes }
    }

    /// Build both tensors from the dataset.
    ///
    /// Fails with `EmptyDataset` for zero samples and with `Shape` if any
    /// sample disagrees with the configured image size or class count.
    pub fn assemble(&self, dataset: &FerDataset) -> Result<AssembledTensors, DataError> {
        if dataset.is_empty() {
            return Err(DataError::EmptyDataset);
        }

        let n        = dataset.len();
        let expected = self.image_size * self.image_size;

        let mut images = Vec::with_capacity(n * expected);
        let mut labels = vec![0.0f32; n * self.num_classes];

        for (index, sample) in dataset.samples().iter().enumerate() {
            if sample.pixels.len() != expected {
                return Err(DataError::Shape {
                    index,
                    reason: RowError::PixelCount { expected, found: sample.pixels.len() },
                });
            }
            if sample.label >= self.num_classes {
                return Err(DataError::Shape {
                    index,
                    reason: RowError::LabelOutOfRange {
                        label:       sample.label as i64,
                        num_classes: self.num_classes,
                    },
                });
            }

            images.extend_from_slice(&sample.pixels);
            labels[index * self.num_classes + sample.label] = 1.0;
        }

        tracing::debug!(
            "Assembled images [{n}, {s}, {s}, 1] and labels [{n}, {c}]",
            s = self.image_size,
            c = self.num_classes,
        );

        Ok(AssembledTensors {
            images: ImageTensor { data: images, shape: [n, self.image_size, self.image_size, 1] },
            labels: LabelTensor { data: labels, shape: [n, self.num_classes] },
        })
    }
}
