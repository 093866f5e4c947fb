// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `predict`
// and all their configurable flags.
//
// `train` with no flags reproduces the original web model run:
// fer2013.csv in, ../web/model out, 48x48 images, 7 classes,
// batch 64, 20 epochs, trailing 20% validation.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::TrainConfig;
use crate::data::{loader::MalformedRowPolicy, splitter::SplitStrategy};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the emotion CNN and write the model directory
    Train(TrainArgs),

    /// Classify CSV rows with a saved model directory
    Predict(PredictArgs),
}

/// How validation rows are chosen
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SplitArg {
    /// Last rows of the file, in file order
    Trailing,
    /// Seeded random rows
    Shuffled,
}

/// What to do with rows that fail validation
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum RowPolicyArg {
    /// Fail the run at the first bad row
    Abort,
    /// Warn and drop the row
    Skip,
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// FER-style CSV with `emotion` and `pixels` columns
    #[arg(long, default_value = "fer2013.csv")]
    pub csv_path: String,

    /// Directory the trained model is written to (replaced if present)
    #[arg(long, default_value = "../web/model")]
    pub output_dir: String,

    /// Width and height of each image in pixels
    #[arg(long, default_value_t = 48)]
    pub image_size: usize,

    /// Number of emotion classes
    #[arg(long, default_value_t = 7)]
    pub num_classes: usize,

    /// Samples per training step
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    /// Fraction of samples held out for validation
    #[arg(long, default_value_t = 0.2)]
    pub validation_fraction: f64,

    #[arg(long, value_enum, default_value_t = SplitArg::Trailing)]
    pub split: SplitArg,

    /// Seed for the shuffled split, batch order and weight init
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Adam step size
    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    #[arg(long, value_enum, default_value_t = RowPolicyArg::Abort)]
    pub malformed_rows: RowPolicyArg,

    /// Only train on rows whose Usage column equals this (e.g. Training)
    #[arg(long)]
    pub usage: Option<String>,

    /// Append per-epoch metrics, validation included, to this CSV file
    #[arg(long)]
    pub metrics_csv: Option<String>,
}

impl From<SplitArg> for SplitStrategy {
    fn from(a: SplitArg) -> Self {
        match a {
            SplitArg::Trailing => SplitStrategy::Trailing,
            SplitArg::Shuffled => SplitStrategy::Shuffled,
        }
    }
}

impl From<RowPolicyArg> for MalformedRowPolicy {
    fn from(a: RowPolicyArg) -> Self {
        match a {
            RowPolicyArg::Abort => MalformedRowPolicy::Abort,
            RowPolicyArg::Skip  => MalformedRowPolicy::Skip,
        }
    }
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            csv_path:            a.csv_path,
            output_dir:          a.output_dir,
            image_size:          a.image_size,
            num_classes:         a.num_classes,
            batch_size:          a.batch_size,
            epochs:              a.epochs,
            validation_fraction: a.validation_fraction,
            split:               a.split.into(),
            seed:                a.seed,
            learning_rate:       a.learning_rate,
            malformed_rows:      a.malformed_rows.into(),
            usage:               a.usage,
            metrics_csv:         a.metrics_csv,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// CSV with rows to classify (same format as training)
    #[arg(long)]
    pub csv_path: String,

    /// Model directory written by `train`
    #[arg(long, default_value = "../web/model")]
    pub model_dir: String,

    /// 1-based data row to classify; all rows when omitted
    #[arg(long)]
    pub row: Option<usize>,
}
