// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Training path:
//
//   .xml corpus
//       │
//       ▼
//   XmlCorpusLoader   → QaRecords (normalised question/context/answer)
//       │
//       ▼
//   SampleEncoder     → token ids + offsets, answer aligned to tokens
//       │
//       ▼
//   QaDataset         → Burn Dataset
//       │
//       ▼
//   QaBatcher         → tensor batches for the training loop
//
// Inference path:
//
//   model dir .json/.jsonl → context_extractor → ContextCache
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Sorted, extension-filtered directory listing
pub mod listing;

/// Whitespace normalisation for corpus text
pub mod preprocessor;

/// Reads QAPair elements out of .xml files
pub mod xml_corpus;

/// Heuristic candidate passages from arbitrary JSON records
pub mod context_extractor;

/// Per-directory memo of extracted candidates
pub mod context_cache;

/// Maps answer character spans onto token indices
pub mod aligner;

/// [CLS] q [SEP] c [SEP] encoding with offsets
pub mod encoder;

/// Implements Burn's Dataset trait for Q&A samples
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
