// ============================================================
// Layer 2 — Predict Use Case
// ============================================================
// Loads a saved model directory and classifies rows of a FER
// CSV file. Image size and class count come from the saved
// topology, so the CSV must match what the model was trained on.

use anyhow::{bail, Result};
use burn::prelude::*;

use crate::data::loader::CsvLoader;
use crate::infra::model_store::ModelStore;
use crate::ml::inferencer::{Inferencer, Prediction};

pub struct PredictUseCase<B: Backend> {
    inferencer: Inferencer<B>,
}

impl<B: Backend> PredictUseCase<B> {
    pub fn new(model_dir: &str, device: B::Device) -> Result<Self> {
        let store      = ModelStore::new(model_dir);
        let inferencer = Inferencer::from_store(&store, device)?;

        // train_config.json is informational; older directories may lack it
        match store.load_config() {
            Ok(run) => tracing::info!(
                "Model trained on '{}' for {} epochs (seed {})",
                run.csv_path, run.epochs, run.seed
            ),
            Err(e) => tracing::debug!("No training config in '{}': {:#}", model_dir, e),
        }
        Ok(Self { inferencer })
    }

    /// Classify one 1-based data row of `csv_path`, or every row when `row` is None.
    /// Returns (row number, prediction) pairs in file order.
    pub fn classify(&self, csv_path: &str, row: Option<usize>) -> Result<Vec<(usize, Prediction)>> {
        let cfg     = self.inferencer.config();
        let dataset = CsvLoader::new(csv_path, cfg.image_size, cfg.num_classes).load()?;

        let rows: Vec<usize> = match row {
            Some(0) => bail!("rows are numbered from 1"),
            Some(r) if r > dataset.len() => {
                bail!("row {} requested but '{}' has {} rows", r, csv_path, dataset.len())
            }
            Some(r) => vec![r],
            None => (1..=dataset.len()).collect(),
        };

        let images: Vec<Vec<f32>> = rows
            .iter()
            .map(|&r| dataset.samples()[r - 1].pixels.clone())
            .collect();

        let predictions = self.inferencer.predict(&images)?;
        Ok(rows.into_iter().zip(predictions).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::EmotionCnnConfig;
    use burn::backend::NdArray;
    use std::io::Write;

    fn use_case() -> PredictUseCase<NdArray> {
        let device = Default::default();
        let config = EmotionCnnConfig::new(10, 7);
        let model  = config.init::<NdArray>(&device);
        PredictUseCase { inferencer: Inferencer::new(model, config, device) }
    }

    fn csv_with_rows(n: usize) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "emotion,pixels").unwrap();
        for r in 0..n {
            writeln!(f, "{},{}", r % 7, vec!["128"; 100].join(" ")).unwrap();
        }
        f
    }

    #[test]
    fn test_classify_all_rows() {
        let f     = csv_with_rows(3);
        let preds = use_case().classify(f.path().to_str().unwrap(), None).unwrap();
        let rows: Vec<usize> = preds.iter().map(|(r, _)| *r).collect();
        assert_eq!(rows, vec![1, 2, 3]);
    }

    #[test]
    fn test_classify_single_row() {
        let f     = csv_with_rows(3);
        let preds = use_case().classify(f.path().to_str().unwrap(), Some(2)).unwrap();
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].0, 2);
    }

    #[test]
    fn test_new_reads_a_saved_model_directory() {
        let dir    = tempfile::tempdir().unwrap();
        let store  = ModelStore::new(dir.path());
        let config = EmotionCnnConfig::new(10, 7);
        let model  = config.init::<NdArray>(&Default::default());
        store.save_model(&model, &config).unwrap();

        let uc = PredictUseCase::<NdArray>::new(dir.path().to_str().unwrap(), Default::default())
            .unwrap();
        let f  = csv_with_rows(2);
        let preds = uc.classify(f.path().to_str().unwrap(), None).unwrap();
        assert_eq!(preds.len(), 2);
        assert!(preds.iter().all(|(_, p)| p.probabilities.len() == 7));
    }

    #[test]
    fn test_row_out_of_range() {
        let f  = csv_with_rows(2);
        let uc = use_case();
        assert!(uc.classify(f.path().to_str().unwrap(), Some(3)).is_err());
        assert!(uc.classify(f.path().to_str().unwrap(), Some(0)).is_err());
    }
}
