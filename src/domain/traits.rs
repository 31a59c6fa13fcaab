// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer only sees these traits:
//
//   RecordSource → anything that yields training records
//                  (XmlCorpusLoader reads a directory of .xml)
//   QaModel      → anything that can extract an answer span
//                  from a (question, context) pair
//                  (Inferencer wraps the trained burn model;
//                   tests use a scripted fake)
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::qa_record::QaRecord;

// ─── RecordSource ────────────────────────────────────────────────────────────
/// Any component that can load training records.
pub trait RecordSource {
    fn load_all(&self) -> Result<Vec<QaRecord>>;
}

// ─── QaModel ─────────────────────────────────────────────────────────────────
/// The extractive QA collaborator.
pub trait QaModel {
    /// Extract the best answer span for `question` from `context`.
    fn answer(&self, question: &str, context: &str) -> Result<Prediction>;
}

/// The model's reply for one (question, context) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub answer: String,
    /// Confidence in [0, 1]
    pub score:  f32,
}

impl<M: QaModel + ?Sized> QaModel for &M {
    fn answer(&self, question: &str, context: &str) -> Result<Prediction> {
        (**self).answer(question, context)
    }
}
