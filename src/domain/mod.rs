// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that name the core
// concepts of the pipeline: a labelled face sample, the
// emotion categories, and the seams other layers implement.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// One parsed dataset row and the ordered collection of them
pub mod sample;

// The seven FER emotion categories
pub mod emotion;

// Core abstractions (traits) that other layers implement
pub mod traits;
