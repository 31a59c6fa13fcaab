// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Loads a trained span model from a model artifact directory
// and answers (question, context) pairs with it.
//
// The answer is the context slice between the chosen start and
// end tokens (byte offsets from the encoder), and the score is
// P(start) * P(end) under the softmax over real tokens, so it
// always lies in [0, 1].

use anyhow::{anyhow, bail, Result};
use burn::prelude::*;
use std::path::Path;
use tokenizers::Tokenizer;

use crate::data::encoder::SampleEncoder;
use crate::domain::traits::{Prediction, QaModel};
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::model::SpanModel;

type InferBackend = burn::backend::Wgpu;

/// Longest answer, in tokens, the span search considers.
const MAX_ANSWER_TOKENS: usize = 30;

pub struct Inferencer {
    model:       SpanModel<InferBackend>,
    tokenizer:   Tokenizer,
    max_seq_len: usize,
    device:      burn::backend::wgpu::WgpuDevice,
}

impl Inferencer {
    pub fn load(dir: &Path) -> Result<Self> {
        let ckpt = CheckpointManager::new(dir);
        if !ckpt.has_model() {
            bail!(
                "No trained model in '{dir}' (expected model.mpk.gz and model_config.json). \
                 Run 'train --xml-dir <DIR> --output-dir {dir}' first, or add \
                 '--base-model <MODEL_DIR>' to continue from an existing model.",
                dir = dir.display()
            );
        }

        let device    = burn::backend::wgpu::WgpuDevice::default();
        let cfg       = ckpt.load_config()?.with_dropout(0.0);
        let model     = ckpt.load_model(cfg.init::<InferBackend>(&device), &device)?;
        let tokenizer = TokenizerStore::new(dir).load()?;

        tracing::info!("Model loaded from '{}'", dir.display());
        Ok(Self { model, tokenizer, max_seq_len: cfg.max_seq_len, device })
    }

    fn int_row(&self, ids: &[u32]) -> Tensor<InferBackend, 2, Int> {
        let flat: Vec<i32> = ids.iter().map(|&x| x as i32).collect();
        Tensor::<InferBackend, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([1, ids.len()])
    }
}

impl QaModel for Inferencer {
    fn answer(&self, question: &str, context: &str) -> Result<Prediction> {
        let encoder = SampleEncoder::new(&self.tokenizer, self.max_seq_len)?;
        let pair    = encoder.encode_pair(question, context)?;
        let seq_len = pair.input_ids.len();

        let context_positions: Vec<usize> = pair.context_positions().collect();
        if context_positions.is_empty() {
            bail!("Context produced no tokens");
        }

        let (input_ids, attention_mask) = encoder.pad(pair.input_ids.clone());
        let logits = self.model.forward(self.int_row(&input_ids), self.int_row(&attention_mask));

        let start_probs = probabilities(logits.start_logits, seq_len)?;
        let end_probs   = probabilities(logits.end_logits, seq_len)?;

        // Best (start, end) with start <= end, both inside the context
        let mut best = (context_positions[0], context_positions[0], f32::NEG_INFINITY);
        for &s in &context_positions {
            for &e in context_positions.iter().filter(|&&e| e >= s && e < s + MAX_ANSWER_TOKENS) {
                let score = start_probs[s] * end_probs[e];
                if score > best.2 {
                    best = (s, e, score);
                }
            }
        }

        let (s, e, score) = best;
        let answer = context[pair.spans[s].start..pair.spans[e].end].trim().to_string();

        tracing::debug!("Span [{},{}] score={:.4} answer='{}'", s, e, score, answer);
        Ok(Prediction { answer, score: score.clamp(0.0, 1.0) })
    }
}

/// Softmax over the first `seq_len` (non-padding) positions of a [1, n] row.
fn probabilities(logits: Tensor<InferBackend, 2>, seq_len: usize) -> Result<Vec<f32>> {
    burn::tensor::activation::softmax(logits.slice([0..1, 0..seq_len]), 1)
        .into_data()
        .to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read probabilities: {e:?}"))
}
