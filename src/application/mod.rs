// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no ML math, no console UI, no
// direct file formats. Each use case tells the lower layers
// what to do in which order.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training pipeline
pub mod train_use_case;

// Classifying CSV rows with a saved model
pub mod predict_use_case;
