// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the training pipeline:
//
//   Step 1: Parse the XML corpus            (Layer 4 - data)
//   Step 2: Copy records into the model dir (Layer 6 - infra)
//   Step 3: Fine-tune and save              (Layer 5 - ml)
//
// The JSONL copy from step 2 is what the inference side later
// searches for candidate contexts.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::data::xml_corpus::XmlCorpusLoader;
use crate::domain::traits::RecordSource;
use crate::infra::{interrupt::InterruptFlag, record_export::save_records};
use crate::ml::trainer::{fine_tune, TrainOutcome};

// ─── Training Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub xml_dir:      PathBuf,
    pub output_dir:   PathBuf,
    /// Directory of a previously trained model (or a tokenizer.json) to start from
    pub base_model:   Option<PathBuf>,
    pub max_seq_len:  usize,
    pub batch_size:   usize,
    pub epochs:       usize,
    pub lr:           f64,
    pub weight_decay: f64,
    pub seed:         u64,
    pub d_model:      usize,
    pub num_heads:    usize,
    pub num_layers:   usize,
    pub d_ff:         usize,
    pub dropout:      f64,
    pub vocab_size:   usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            xml_dir:      PathBuf::from("data/xml"),
            output_dir:   PathBuf::from("modelo_treinado"),
            base_model:   None,
            max_seq_len:  384,
            batch_size:   8,
            epochs:       3,
            lr:           3e-5,
            weight_decay: 0.01,
            seed:         42,
            d_model:      256,
            num_heads:    8,
            num_layers:   6,
            d_ff:         1024,
            dropout:      0.1,
            vocab_size:   30522,
        }
    }
}

pub struct TrainUseCase {
    config:    TrainConfig,
    interrupt: InterruptFlag,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig, interrupt: InterruptFlag) -> Self {
        Self { config, interrupt }
    }

    pub fn execute(&self) -> Result<TrainOutcome> {
        let cfg = &self.config;

        // ── Step 1: Parse corpus ──────────────────────────────────────────────
        let records = XmlCorpusLoader::new(&cfg.xml_dir).load_all()?;
        if records.is_empty() {
            tracing::error!("No training records found in '{}'", cfg.xml_dir.display());
            return Ok(TrainOutcome::NothingToTrain);
        }

        // ── Step 2: Keep the records next to the model ────────────────────────
        save_records(&cfg.output_dir, &records)?;

        // ── Step 3: Fine-tune ─────────────────────────────────────────────────
        fine_tune(
            cfg.base_model.as_deref(),
            &records,
            &cfg.output_dir,
            cfg,
            &self.interrupt,
        )
    }
}
