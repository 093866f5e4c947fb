// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw CSV file to tensor batches.
//
//   fer2013.csv
//       │
//       ▼
//   CsvLoader         → parses rows, normalises pixels, validates labels
//       │
//       ▼
//   TensorAssembler   → [N, S, S, 1] images + [N, C] one-hot labels
//       │
//       ▼
//   split_indices     → train / validation rows
//       │
//       ▼
//   FerTensorDataset  → implements Burn's Dataset trait
//       │
//       ▼
//   FerBatcher        → stacks items into FerBatch tensors
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Typed errors for loading and assembling
pub mod error;

/// Reads FER CSV files into a FerDataset
pub mod loader;

/// Builds image and one-hot label tensors
pub mod assembler;

/// Chooses validation rows
pub mod splitter;

/// Implements Burn's Dataset trait over assembled tensors
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;
