// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn framework specific code lives here.
//
//   model.rs      — transformer encoder with a start/end head
//   trainer.rs    — fine_tune: encode records, epoch loop,
//                   save on every exit path
//   inferencer.rs — loads a model artifact directory and
//                   implements the QaModel trait
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// Transformer encoder span model
pub mod model;

/// Fine-tuning loop with guaranteed final save
pub mod trainer;

/// Inference engine — loads a trained model and predicts answers
pub mod inferencer;
