// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses command line arguments with clap and hands off to the
// use cases in Layer 2. Only this layer prints final results.
//
//   1. `train`   — load CSV, train the CNN, write the model dir
//   2. `predict` — load the model dir, classify CSV rows
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "fer-train",
    version = "0.1.0",
    about = "Train a facial-expression CNN on FER-style CSV data and export it for the web app."
)]
pub struct Cli {
    /// The subcommand to run (train or predict)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}'", args.csv_path);

    let use_case = TrainUseCase::new(args.into());
    let report   = use_case.execute()?;

    println!("Model saved to {}", report.output_dir);
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;
    use crate::ml::InferBackend;

    let device   = burn::backend::wgpu::WgpuDevice::default();
    let use_case = PredictUseCase::<InferBackend>::new(&args.model_dir, device)?;

    for (row, p) in use_case.classify(&args.csv_path, args.row)? {
        let name = p
            .emotion()
            .map(|e| e.to_string())
            .unwrap_or_else(|| format!("class {}", p.label));
        println!("row {}: {} ({:.2}%)", row, name, p.confidence * 100.0);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::data::splitter::SplitStrategy;

    #[test]
    fn test_train_without_flags_uses_defaults() {
        let cli = Cli::try_parse_from(["fer-train", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        let def = TrainConfig::default();
        assert_eq!(cfg.csv_path, def.csv_path);
        assert_eq!(cfg.output_dir, def.output_dir);
        assert_eq!((cfg.batch_size, cfg.epochs), (def.batch_size, def.epochs));
        assert_eq!(cfg.validation_fraction, def.validation_fraction);
        assert_eq!(cfg.learning_rate, def.learning_rate);
    }

    #[test]
    fn test_train_flags() {
        let cli = Cli::try_parse_from([
            "fer-train", "train", "--epochs", "1", "--batch-size", "4",
            "--split", "shuffled", "--usage", "Training",
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg: TrainConfig = args.into();
        assert_eq!(cfg.epochs, 1);
        assert_eq!(cfg.batch_size, 4);
        assert_eq!(cfg.split, SplitStrategy::Shuffled);
        assert_eq!(cfg.usage.as_deref(), Some("Training"));
    }

    #[test]
    fn test_predict_requires_csv() {
        assert!(Cli::try_parse_from(["fer-train", "predict"]).is_err());
    }
}
