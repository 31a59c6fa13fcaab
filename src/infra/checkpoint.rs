// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the span model inside a model artifact
// directory using Burn's CompactRecorder.
//
// Layout:
//   <dir>/
//     model.mpk.gz        ← weights (MessagePack + gzip)
//     model_config.json   ← architecture, needed to rebuild the
//                           model before loading weights into it
//     tokenizer.json      ← see TokenizerStore
//
// Only the latest state is kept: every save overwrites it.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};

use crate::ml::model::{SpanModel, SpanModelConfig};

const MODEL_STEM:   &str = "model";
const MODEL_FILE:   &str = "model.mpk.gz";
const CONFIG_FILE:  &str = "model_config.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// True when both weights and architecture config are present.
    pub fn has_model(&self) -> bool {
        self.dir.join(MODEL_FILE).is_file() && self.dir.join(CONFIG_FILE).is_file()
    }

    /// Write the model's current weights, replacing any previous save.
    pub fn save_model<B: Backend>(&self, model: &SpanModel<B>) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // Recorder appends the .mpk.gz extension itself
        let path = self.dir.join(MODEL_STEM);
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model to '{}'", path.display()))?;

        tracing::debug!("Saved model weights to '{}'", self.dir.display());
        Ok(())
    }

    /// Load saved weights into a freshly initialised `model`.
    pub fn load_model<B: Backend>(
        &self,
        model:  SpanModel<B>,
        device: &B::Device,
    ) -> Result<SpanModel<B>> {
        let path   = self.dir.join(MODEL_STEM);
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load model '{}'. Has it been trained?", path.display())
            })?;
        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &SpanModelConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(cfg)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<SpanModelConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid model config in '{}'", path.display()))
    }
}
