// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong to one layer:
//
//   checkpoint.rs      — model weights + architecture config
//                        in the model artifact directory
//   tokenizer_store.rs — load a tokenizer.json or build a
//                        word-level one from the corpus
//   metrics.rs         — per-epoch loss CSV
//   record_export.rs   — QaRecords as JSON Lines
//   interrupt.rs       — Ctrl-C → early-stop flag
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;

/// JSON Lines export of training records
pub mod record_export;

/// Shared flag set by the Ctrl-C handler
pub mod interrupt;
