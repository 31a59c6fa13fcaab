// ============================================================
// Layer 3 — Inference-time Domain Types
// ============================================================
// ContextCandidate: a passage pulled out of a JSON/JSONL file
//                   that may contain the answer to a query.
// AnswerResult:     what the orchestrator hands back per
//                   candidate after running the QA model.
//
// Reference: Rust Book §5 (Structs and Methods)

use serde::{Deserialize, Serialize};

/// Passages at or below this trimmed length are never candidates.
pub const MIN_CONTEXT_CHARS: usize = 20;

/// Maximum characters of the context echoed back in a result.
pub const SNIPPET_CHARS: usize = 400;

/// A candidate passage and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextCandidate {
    pub context: String,

    /// `"<file>"` for bare strings, `"<file>:<field>"` for object fields
    pub source: String,

    /// The owning record's question (or qid), when it had one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
}

impl ContextCandidate {
    pub fn new(context: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            source:  source.into(),
            meta:    None,
        }
    }

    pub fn with_meta(mut self, meta: Option<String>) -> Self {
        self.meta = meta;
        self
    }
}

/// One ranked answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer:         String,
    /// Model confidence in [0, 1]
    pub score:          f32,
    pub source:         String,
    pub source_snippet: String,
}

/// True when `text` is long enough to be worth asking the model about.
pub fn is_usable_context(text: &str) -> bool {
    text.trim().chars().count() > MIN_CONTEXT_CHARS
}
