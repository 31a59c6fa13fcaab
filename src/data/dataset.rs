// ============================================================
// Layer 4 — Q&A Dataset
// ============================================================
// Encoded training samples behind Burn's Dataset trait so the
// DataLoader can index and shuffle them.

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One fully tokenised and padded training sample.
/// Sequence format: [CLS] question [SEP] context [SEP] [PAD]...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaSample {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    /// Answer start token; 0 when the answer was not found
    pub start_position: usize,
    /// Answer end token (inclusive); 0 when the answer was not found
    pub end_position:   usize,
}

pub struct QaDataset {
    samples: Vec<QaSample>,
}

impl QaDataset {
    pub fn new(samples: Vec<QaSample>) -> Self { Self { samples } }
}

impl Dataset<QaSample> for QaDataset {
    fn get(&self, index: usize) -> Option<QaSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
