// ============================================================
// Layer 6 — Model Store
// ============================================================
// Writes and reads the model artifact directory consumed by
// the web application.
//
// Directory layout:
//   <output_dir>/
//     model.json             ← web layers model (topology + manifest)
//     group1-shard1of1.bin   ← web weights, little-endian f32
//     emotion_cnn.json       ← EmotionCnnConfig, for `predict`
//     emotion_cnn.mpk        ← parameters (burn CompactRecorder)
//     train_config.json      ← the TrainConfig of the run
//
// Saving into an existing directory replaces these files; the
// last run to finish wins. There is no lock and no versioning.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::infra::tfjs_export::{self, MANIFEST_FILE, SHARD_FILE};
use crate::ml::model::{EmotionCnn, EmotionCnnConfig};

const CONFIG_FILE:       &str = "emotion_cnn.json";
const RECORD_STEM:       &str = "emotion_cnn";
// CompactRecorder is a named msgpack recorder without compression
const RECORD_EXTENSION:  &str = "mpk";
const TRAIN_CONFIG_FILE: &str = "train_config.json";

pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    /// Point at an artifact directory without touching the filesystem.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the burn parameter file, including the recorder's extension
    pub fn weights_path(&self) -> PathBuf {
        self.dir.join(format!("{RECORD_STEM}.{RECORD_EXTENSION}"))
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// The web app's entry point
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    pub fn shard_path(&self) -> PathBuf {
        self.dir.join(SHARD_FILE)
    }

    fn ensure_dir(&self) -> Result<()> {
        // create_dir_all creates parent directories too, like `mkdir -p`
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create model directory '{}'", self.dir.display()))
    }

    /// Save the web layers model plus the burn config and record.
    pub fn save_model<B: Backend>(
        &self,
        model:  &EmotionCnn<B>,
        config: &EmotionCnnConfig,
    ) -> Result<()> {
        self.ensure_dir()?;
        tfjs_export::write_layers_model(&self.dir, model, config)?;

        let config_path = self.config_path();
        config
            .save(&config_path)
            .with_context(|| format!("Cannot write model config to '{}'", config_path.display()))?;

        // The recorder appends the .mpk extension itself
        let path = self.dir.join(RECORD_STEM);
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save parameters to '{}'", path.display()))?;

        tracing::debug!("Saved model to '{}'", self.dir.display());
        Ok(())
    }

    /// Rebuild the network from emotion_cnn.json and restore its parameters.
    pub fn load_model<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<(EmotionCnn<B>, EmotionCnnConfig)> {
        let config_path = self.config_path();
        let config      = EmotionCnnConfig::load(&config_path).with_context(|| {
            format!(
                "Cannot read model config from '{}'. Have you trained the model first?",
                config_path.display()
            )
        })?;

        let path   = self.dir.join(RECORD_STEM);
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load parameters from '{}'", path.display()))?;

        let model = config.init::<B>(device).load_record(record);
        Ok((model, config))
    }

    /// Save the run configuration as pretty JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(TRAIN_CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(TRAIN_CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }
}
