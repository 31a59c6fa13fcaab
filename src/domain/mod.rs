// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing the core concepts:
// training records parsed from the XML corpus, candidate
// passages found at inference time, ranked answers, and the
// model seam the rest of the system talks to.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A (question, context, answer) training record
pub mod qa_record;

// Candidate passages and ranked answers used at inference time
pub mod candidate;

// Core abstractions (traits) that other layers implement
pub mod traits;
