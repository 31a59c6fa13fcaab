// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Three subcommands: `parse`, `train` and `ask`.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::application::treatment_use_case::DEFAULT_QUESTION_TEMPLATE;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse the XML corpus into JSONL question/context/answer records
    Parse(ParseArgs),

    /// Fine-tune the span model on the XML corpus
    Train(TrainArgs),

    /// Suggest treatments for a symptom using a trained model
    Ask(AskArgs),
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Directory containing .xml files with QAPair elements
    #[arg(long)]
    pub xml_dir: PathBuf,

    /// JSONL file to write; stdout when omitted
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory containing .xml files with QAPair elements
    #[arg(long)]
    pub xml_dir: PathBuf,

    /// Where the model, tokenizer, metrics and records are written
    #[arg(long, default_value = "modelo_treinado")]
    pub output_dir: PathBuf,

    /// Previously trained model directory to continue from
    #[arg(long)]
    pub base_model: Option<PathBuf>,

    /// Format: [CLS] question [SEP] context [SEP] + padding
    #[arg(long, default_value_t = 384)]
    pub max_seq_len: usize,

    #[arg(long, default_value_t = 8)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 3)]
    pub epochs: usize,

    #[arg(long, default_value_t = 3e-5)]
    pub lr: f64,

    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f64,

    /// Seed for batch shuffling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Hidden dimension of the transformer
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    /// d_model must be divisible by num_heads
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 6)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Upper bound on the vocabulary built when no base tokenizer exists
    #[arg(long, default_value_t = 30522)]
    pub vocab_size: usize,
}

/// Boundary between Layer 1 and Layer 2: the application layer
/// never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            xml_dir:      a.xml_dir,
            output_dir:   a.output_dir,
            base_model:   a.base_model,
            max_seq_len:  a.max_seq_len,
            batch_size:   a.batch_size,
            epochs:       a.epochs,
            lr:           a.lr,
            weight_decay: a.weight_decay,
            seed:         a.seed,
            d_model:      a.d_model,
            num_heads:    a.num_heads,
            num_layers:   a.num_layers,
            d_ff:         a.d_ff,
            dropout:      a.dropout,
            vocab_size:   a.vocab_size,
        }
    }
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Free-text symptom description
    #[arg(long)]
    pub symptom: String,

    /// Trained model directory (also searched for candidate contexts)
    #[arg(long, default_value = "modelo_treinado")]
    pub model_dir: PathBuf,

    #[arg(long, default_value_t = 1)]
    pub top_k: usize,

    /// Upper bound on candidate contexts scored per query
    #[arg(long, default_value_t = 200)]
    pub max_contexts: usize,

    /// Question built from the symptom; `{symptom}` is substituted
    #[arg(long, default_value = DEFAULT_QUESTION_TEMPLATE)]
    pub question_template: String,
}
