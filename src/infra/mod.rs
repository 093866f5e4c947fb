// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that do not belong to one business layer:
//
//   model_store.rs — writes the model artifact directory
//                    (web layers model + CompactRecorder parameters
//                    + run config) and reads it back for predict.
//
//   tfjs_export.rs — model.json and the f32 weight shard the
//                    web app loads.
//
//   metrics.rs     — progress observers: the per-epoch console
//                    line and the optional metrics CSV.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Model artifact saving and loading
pub mod model_store;

/// TensorFlow.js layers-model export
pub mod tfjs_export;

/// Console and CSV progress observers
pub mod metrics;
