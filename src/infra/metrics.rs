// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per finished (or interrupted) epoch to
// <model dir>/metrics.csv:
//
//   epoch,train_loss,batches
//   1,5.812300,42
//   2,5.190144,42
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics for a training epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch: usize,

    /// Mean loss over the batches actually run
    pub train_loss: f64,

    /// Fewer than a full epoch when training was interrupted
    pub batches: usize,
}

impl EpochMetrics {
    pub fn new(epoch: usize, loss_sum: f64, batches: usize) -> Self {
        let train_loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
        Self { epoch, train_loss, batches }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger, writing the CSV header if the file is new.
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,batches")?;
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(f, "{},{:.6},{}", m.epoch, m.train_loss, m.batches)?;

        tracing::debug!("Logged epoch {} train_loss={:.4}", m.epoch, m.train_loss);
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
