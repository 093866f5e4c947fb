// ============================================================
// Layer 3 — Sample and Dataset Domain Types
// ============================================================
// A Sample is one CSV row after parsing: a flat vector of
// normalised pixel intensities and an integer emotion label.
//
// A Dataset is the ordered list of every Sample in the file.
// It is built in full before training starts and is consumed
// by the tensor assembler, after which it is dropped.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// One labelled face image.
///
/// `pixels` is row-major, `image_size * image_size` long,
/// each value already divided by 255 so it lies in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FerSample {
    pub pixels: Vec<f32>,

    /// Class index into the emotion list
    pub label: usize,

    /// Value of the FER `Usage` column (Training / PublicTest / PrivateTest)
    /// when the source file has one
    pub usage: Option<String>,
}

impl FerSample {
    pub fn new(pixels: Vec<f32>, label: usize) -> Self {
        Self { pixels, label, usage: None }
    }
}

/// All samples of one run, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FerDataset {
    samples: Vec<FerSample>,
}

impl FerDataset {
    pub fn new(samples: Vec<FerSample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[FerSample] {
        &self.samples
    }

    /// Count of samples per class index, sized to `num_classes`.
    /// Labels beyond the range are ignored here; the assembler rejects them.
    pub fn class_counts(&self, num_classes: usize) -> Vec<usize> {
        let mut counts = vec![0usize; num_classes];
        for s in &self.samples {
            if let Some(c) = counts.get_mut(s.label) {
                *c += 1;
            }
        }
        counts
    }
}

impl FromIterator<FerSample> for FerDataset {
    fn from_iter<T: IntoIterator<Item = FerSample>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_counts() {
        let ds: FerDataset = [0, 3, 3, 6]
            .into_iter()
            .map(|l| FerSample::new(vec![0.0; 4], l))
            .collect();
        assert_eq!(ds.class_counts(7), vec![1, 0, 0, 2, 0, 0, 1]);
    }

    #[test]
    fn test_preserves_order() {
        let ds = FerDataset::new(vec![
            FerSample::new(vec![0.1], 2),
            FerSample { usage: Some("PublicTest".into()), ..FerSample::new(vec![0.2], 1) },
        ]);
        let labels: Vec<usize> = ds.samples().iter().map(|s| s.label).collect();
        assert_eq!(labels, vec![2, 1]);
        assert_eq!(ds.samples()[1].usage.as_deref(), Some("PublicTest"));
    }
}
