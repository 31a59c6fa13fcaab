// ============================================================
// Layer 3 — QaRecord Domain Type
// ============================================================
// One supervised example built from a <QAPair> of the corpus.
//
//   Question: "Como tratar febre?"
//   Context:  the whole <Answer> body
//   Answer:   the first ANSWER_LABEL_CHARS characters of that body
//
// The answer label is a prefix of the context, so the span
// aligner can always locate it with a substring search.
//
// Reference: Rust Book §5 (Structs)

use serde::{Deserialize, Serialize};

/// Number of leading context characters used as the answer label.
pub const ANSWER_LABEL_CHARS: usize = 200;

/// A training record: question, full context, and the short answer label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaRecord {
    pub question: String,
    pub context:  String,
    pub answer:   String,
}

impl QaRecord {
    /// Build a record from already-normalised question and answer text.
    /// The answer label is derived from the context.
    pub fn from_pair(question: impl Into<String>, answer_body: impl Into<String>) -> Self {
        let context = answer_body.into();
        let answer  = truncate_chars(&context, ANSWER_LABEL_CHARS).to_string();
        Self {
            question: question.into(),
            context,
            answer,
        }
    }
}

/// Return the prefix of `text` holding at most `max_chars` characters.
/// Slices on a char boundary, so multi-byte text is never split.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None                => text,
    }
}
