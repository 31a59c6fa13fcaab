// ============================================================
// Layer 4 — Sample Encoder
// ============================================================
// Turns a (question, context) pair into the fixed-length input
// the span model reads:
//
//   [CLS] question tokens [SEP] context tokens [SEP] [PAD]...
//
// Only the context is truncated to fit max_seq_len. Alongside
// the ids, every position gets a TokenSpan (byte offsets into
// its own text + a context flag) so that:
//   - training can align the answer label onto token indices
//   - inference can cut the predicted span out of the context
//
// Reference: Devlin et al. (2019) BERT input format
//            tokenizers crate documentation (Encoding offsets)

use anyhow::{bail, Result};
use tokenizers::Tokenizer;

use crate::data::aligner::{align_answer, Alignment, TokenSpan};
use crate::data::dataset::QaSample;
use crate::domain::qa_record::QaRecord;

/// Shortest sequence that still leaves room for a context token.
const MIN_SEQ_LEN: usize = 8;

/// A tokenised pair before padding.
#[derive(Debug, Clone)]
pub struct EncodedPair {
    pub input_ids: Vec<u32>,
    pub spans:     Vec<TokenSpan>,
}

impl EncodedPair {
    /// Indices of the context tokens in the sequence.
    pub fn context_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.spans
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_context)
            .map(|(i, _)| i)
    }
}

pub struct SampleEncoder<'a> {
    tokenizer:   &'a Tokenizer,
    max_seq_len: usize,
    cls_id:      u32,
    sep_id:      u32,
    pad_id:      u32,
}

impl<'a> SampleEncoder<'a> {
    pub fn new(tokenizer: &'a Tokenizer, max_seq_len: usize) -> Result<Self> {
        if max_seq_len < MIN_SEQ_LEN {
            bail!("max_seq_len must be at least {MIN_SEQ_LEN}, got {max_seq_len}");
        }
        Ok(Self {
            tokenizer,
            max_seq_len,
            cls_id: tokenizer.token_to_id("[CLS]").unwrap_or(101),
            sep_id: tokenizer.token_to_id("[SEP]").unwrap_or(102),
            pad_id: tokenizer.token_to_id("[PAD]").unwrap_or(0),
        })
    }

    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    /// Tokenise and assemble `[CLS] q [SEP] c [SEP]`, truncating `c` to fit.
    pub fn encode_pair(&self, question: &str, context: &str) -> Result<EncodedPair> {
        let q_enc = self.tokenizer.encode(question, false)
            .map_err(|e| anyhow::anyhow!("Question tokenisation: {e}"))?;
        let c_enc = self.tokenizer.encode(context, false)
            .map_err(|e| anyhow::anyhow!("Context tokenisation: {e}"))?;

        // Three special tokens plus at least one context token
        let q_keep = q_enc.get_ids().len().min(self.max_seq_len - 4);
        let c_keep = c_enc.get_ids().len().min(self.max_seq_len - 3 - q_keep);

        let mut input_ids = Vec::with_capacity(q_keep + c_keep + 3);
        let mut spans     = Vec::with_capacity(q_keep + c_keep + 3);

        input_ids.push(self.cls_id);
        spans.push(TokenSpan::other(0, 0));

        for (&id, &(s, e)) in q_enc.get_ids().iter().zip(q_enc.get_offsets()).take(q_keep) {
            input_ids.push(id);
            spans.push(TokenSpan::other(s, e));
        }

        input_ids.push(self.sep_id);
        spans.push(TokenSpan::other(0, 0));

        for (&id, &(s, e)) in c_enc.get_ids().iter().zip(c_enc.get_offsets()).take(c_keep) {
            input_ids.push(id);
            spans.push(TokenSpan::context(s, e));
        }

        input_ids.push(self.sep_id);
        spans.push(TokenSpan::other(0, 0));

        Ok(EncodedPair { input_ids, spans })
    }

    /// Encode one training record and compute its answer-span target.
    pub fn encode_record(&self, record: &QaRecord) -> Result<(QaSample, Alignment)> {
        let pair      = self.encode_pair(&record.question, &record.context)?;
        let alignment = align_answer(&record.context, &record.answer, &pair.spans);
        let (start_position, end_position) = alignment.positions();

        let (input_ids, attention_mask) = self.pad(pair.input_ids);
        Ok((
            QaSample { input_ids, attention_mask, start_position, end_position },
            alignment,
        ))
    }

    /// Pad ids to max_seq_len and build the matching attention mask.
    pub fn pad(&self, mut input_ids: Vec<u32>) -> (Vec<u32>, Vec<u32>) {
        let real = input_ids.len();
        let mut attention_mask = vec![1u32; real];
        input_ids.resize(self.max_seq_len, self.pad_id);
        attention_mask.resize(self.max_seq_len, 0);
        (input_ids, attention_mask)
    }
}

/// Encode every record, logging how many answers could not be aligned.
/// Records that fail to tokenise are skipped.
pub fn encode_records(encoder: &SampleEncoder<'_>, records: &[QaRecord]) -> Vec<QaSample> {
    let mut samples   = Vec::with_capacity(records.len());
    let mut not_found = 0usize;

    for record in records {
        match encoder.encode_record(record) {
            Ok((sample, alignment)) => {
                if !alignment.is_found() {
                    not_found += 1;
                }
                samples.push(sample);
            }
            Err(e) => tracing::warn!("Skipping record '{}': {:#}", record.question, e),
        }
    }

    if not_found > 0 {
        tracing::warn!(
            "{}/{} examples have no locatable answer span",
            not_found,
            samples.len()
        );
    }
    samples
}
