// ============================================================
// Layer 4 — Q&A Batcher
// ============================================================
// Implements Burn's Batcher trait: stacks a Vec<QaSample> into
// [batch, seq_len] id / mask tensors and [batch] target tensors.
// Samples are pre-padded by the SampleEncoder, so every row
// already has the same length.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::QaSample;

#[derive(Debug, Clone)]
pub struct QaBatch<B: Backend> {
    /// [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// [batch_size, seq_len]; 1 = real token, 0 = padding
    pub attention_mask: Tensor<B, 2, Int>,

    /// [batch_size]
    pub start_positions: Tensor<B, 1, Int>,

    /// [batch_size]
    pub end_positions: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct QaBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> QaBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn rows(&self, rows: Vec<i32>, batch_size: usize, seq_len: usize) -> Tensor<B, 2, Int> {
        Tensor::<B, 1, Int>::from_ints(rows.as_slice(), &self.device)
            .reshape([batch_size, seq_len])
    }
}

impl<B: Backend> Batcher<QaSample, QaBatch<B>> for QaBatcher<B> {
    fn batch(&self, items: Vec<QaSample>) -> QaBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map_or(0, |s| s.input_ids.len());

        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.input_ids.iter().map(|&x| x as i32))
            .collect();
        let mask_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.attention_mask.iter().map(|&x| x as i32))
            .collect();
        let starts: Vec<i32> = items.iter().map(|s| s.start_position as i32).collect();
        let ends:   Vec<i32> = items.iter().map(|s| s.end_position as i32).collect();

        QaBatch {
            input_ids:       self.rows(input_flat, batch_size, seq_len),
            attention_mask:  self.rows(mask_flat, batch_size, seq_len),
            start_positions: Tensor::<B, 1, Int>::from_ints(starts.as_slice(), &self.device),
            end_positions:   Tensor::<B, 1, Int>::from_ints(ends.as_slice(), &self.device),
        }
    }
}
