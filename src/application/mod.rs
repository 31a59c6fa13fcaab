// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no ML math, no printing, no
// direct parsing. Each use case wires the lower layers together
// for one goal.

// Corpus → records → fine-tuned model directory
pub mod train_use_case;

// Symptom → ranked treatment answers
pub mod treatment_use_case;
