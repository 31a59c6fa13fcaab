// ============================================================
// Layer 5 — Span Model
// ============================================================
// Transformer encoder with a two-logit head per token: one
// logit for "answer starts here", one for "answer ends here".
// Padding positions are masked out of self-attention.
//
//   ids [b, s] ──► token emb + position emb
//              ──► N × (self-attn → add&norm → FFN → add&norm)
//              ──► LayerNorm ──► Linear(d_model, 2)
//              ──► start_logits [b, s], end_logits [b, s]
//
// Reference: Burn Book §3 (Building Blocks)
//            Devlin et al. (2019) BERT

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::{activation::gelu, backend::AutodiffBackend},
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct SpanModelConfig {
    /// Embedding rows; must cover every id the tokenizer emits
    pub vocab_size:  usize,
    /// Longest [CLS] q [SEP] c [SEP] sequence the model accepts
    pub max_seq_len: usize,
    #[config(default = 256)]
    pub d_model:     usize,
    #[config(default = 8)]
    pub num_heads:   usize,
    #[config(default = 6)]
    pub num_layers:  usize,
    #[config(default = 1024)]
    pub d_ff:        usize,
    #[config(default = 0.1)]
    pub dropout:     f64,
}

impl SpanModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SpanModel<B> {
        let layers = (0..self.num_layers)
            .map(|_| self.init_block(device))
            .collect();

        SpanModel {
            token_embedding:    EmbeddingConfig::new(self.vocab_size, self.d_model).init(device),
            position_embedding: EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device),
            layers,
            final_norm:         LayerNormConfig::new(self.d_model).init(device),
            span_head:          LinearConfig::new(self.d_model, 2).init(device),
            dropout:            DropoutConfig::new(self.dropout).init(),
        }
    }

    fn init_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        EncoderBlock {
            self_attn: MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
                .with_dropout(self.dropout)
                .init(device),
            ffn_in:    LinearConfig::new(self.d_model, self.d_ff).init(device),
            ffn_out:   LinearConfig::new(self.d_ff, self.d_model).init(device),
            norm1:     LayerNormConfig::new(self.d_model).init(device),
            norm2:     LayerNormConfig::new(self.d_model).init(device),
            dropout:   DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn: MultiHeadAttention<B>,
    pub ffn_in:    Linear<B>,
    pub ffn_out:   Linear<B>,
    pub norm1:     LayerNorm<B>,
    pub norm2:     LayerNorm<B>,
    pub dropout:   Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// `pad_mask` is true at padding positions.
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn = self
            .self_attn
            .forward(MhaInput::self_attn(x.clone()).mask_pad(pad_mask))
            .context;
        let x   = self.norm1.forward(x + self.dropout.forward(attn));
        let ffn = self.ffn_out.forward(gelu(self.ffn_in.forward(x.clone())));
        self.norm2.forward(x + self.dropout.forward(ffn))
    }
}

#[derive(Module, Debug)]
pub struct SpanModel<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub span_head:          Linear<B>,
    pub dropout:            Dropout,
}

pub struct SpanLogits<B: Backend> {
    pub start_logits: Tensor<B, 2>,
    pub end_logits:   Tensor<B, 2>,
}

impl<B: Backend> SpanModel<B> {
    /// input_ids, attention_mask: [batch, seq_len] → logits: [batch, seq_len]
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> SpanLogits<B> {
        let [batch_size, seq_len] = input_ids.dims();
        let pad_mask = attention_mask.equal_elem(0);

        let tok_emb   = self.token_embedding.forward(input_ids);
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb   = self.position_embedding.forward(positions);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.layers {
            x = layer.forward(x, pad_mask.clone());
        }
        let logits = self.span_head.forward(self.final_norm.forward(x)); // [b, s, 2]

        let start_logits = logits.clone()
            .slice([0..batch_size, 0..seq_len, 0..1])
            .reshape([batch_size, seq_len]);
        let end_logits = logits
            .slice([0..batch_size, 0..seq_len, 1..2])
            .reshape([batch_size, seq_len]);

        SpanLogits { start_logits, end_logits }
    }

    /// Mean of start and end cross-entropy.
    pub fn forward_loss(
        &self,
        input_ids:       Tensor<B, 2, Int>,
        attention_mask:  Tensor<B, 2, Int>,
        start_positions: Tensor<B, 1, Int>,
        end_positions:   Tensor<B, 1, Int>,
    ) -> Tensor<B, 1>
    where
        B: AutodiffBackend,
    {
        let out = self.forward(input_ids, attention_mask);
        let ce  = CrossEntropyLossConfig::new().init(&out.start_logits.device());
        (ce.forward(out.start_logits, start_positions)
            + ce.forward(out.end_logits, end_positions)) / 2.0_f64
    }
}
