// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Burn-specific code for the network and its training:
//
//   model.rs      — EmotionCnn topology, loss and accuracy helpers
//   trainer.rs    — epoch loop: forward, loss, backward, Adam step,
//                   validation pass, progress reporting
//   inferencer.rs — loads a saved artifact and classifies images
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// CNN architecture for 48x48 grayscale faces
pub mod model;

/// Training loop with validation
pub mod trainer;

/// Inference over a saved model directory
pub mod inferencer;

/// Backend used by the `train` command (autodiff over WGPU)
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Backend used by the `predict` command
pub type InferBackend = burn::backend::Wgpu;
