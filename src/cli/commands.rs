// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `validate`, `infer`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, PathBuf, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::config::PipelineConfig;
use crate::application::infer_use_case::InferOptions;
use crate::domain::fragment::OrderingPolicy;
use crate::ml::decoder::DecoderMode;
use crate::text::corrector::{CorrectionFailurePolicy, DEFAULT_MAX_DISTANCE};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the recognizer on the IAM word database
    Train(TrainArgs),

    /// Measure character error rate and word accuracy of the saved model
    Validate(ValidateArgs),

    /// Read a directory of segmented word images as one sentence
    Infer(InferArgs),
}

/// Decoder selection shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct DecoderArgs {
    /// Decode with CTC prefix beam search instead of best path
    #[arg(long)]
    pub beam_search: bool,

    /// Number of prefixes kept by beam search
    #[arg(long, default_value_t = 10)]
    pub beam_width: usize,
}

impl From<&DecoderArgs> for DecoderMode {
    fn from(a: &DecoderArgs) -> Self {
        if a.beam_search {
            DecoderMode::BeamSearch { width: a.beam_width }
        } else {
            DecoderMode::BestPath
        }
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding words.txt and the words/ image tree
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory for the checkpoint, charList.txt and logs
    #[arg(long, default_value = "model")]
    pub model_dir: PathBuf,

    /// Images per batch; inference pads single images to this size
    #[arg(long, default_value_t = 50)]
    pub batch_size: usize,

    /// Input width in pixels (multiple of 4; one CTC step per 4 columns)
    #[arg(long, default_value_t = 128)]
    pub img_width: usize,

    /// Input height in pixels (multiple of 8)
    #[arg(long, default_value_t = 32)]
    pub img_height: usize,

    /// Labels are truncated to fit this many CTC time steps
    #[arg(long, default_value_t = 32)]
    pub max_text_len: usize,

    /// Width of the hidden layer before the output head
    #[arg(long, default_value_t = 256)]
    pub hidden: usize,

    #[arg(long, default_value_t = 0.2)]
    pub dropout: f64,

    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    /// Fraction of the words used for training; the rest validates
    #[arg(long, default_value_t = 0.95)]
    pub train_fraction: f64,

    /// Words drawn for each training epoch
    #[arg(long, default_value_t = 25_000)]
    pub train_samples_per_epoch: usize,

    /// Stop after this many epochs without improvement
    #[arg(long, default_value_t = 5)]
    pub early_stopping: usize,

    /// Seed for the train/validation split and epoch sampling
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(flatten)]
    pub decoder: DecoderArgs,
}

/// Convert CLI TrainArgs into the application-layer PipelineConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for PipelineConfig {
    fn from(a: TrainArgs) -> Self {
        PipelineConfig {
            decoder:                 DecoderMode::from(&a.decoder),
            data_dir:                a.data_dir,
            model_dir:               a.model_dir,
            batch_size:              a.batch_size,
            img_width:               a.img_width,
            img_height:              a.img_height,
            max_text_len:            a.max_text_len,
            hidden:                  a.hidden,
            dropout:                 a.dropout,
            learning_rate:           a.learning_rate,
            train_fraction:          a.train_fraction,
            train_samples_per_epoch: a.train_samples_per_epoch,
            early_stopping:          a.early_stopping,
            seed:                    a.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[arg(long, default_value = "model")]
    pub model_dir: PathBuf,

    /// Dataset to validate on; defaults to the one used for training
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[command(flatten)]
    pub decoder: DecoderArgs,
}

#[derive(Args, Debug)]
pub struct InferArgs {
    /// Directory of word images; filenames give the word order
    #[arg(long, default_value = "words")]
    pub images_dir: PathBuf,

    #[arg(long, default_value = "model")]
    pub model_dir: PathBuf,

    /// File the corrected sentence is written to (overwritten)
    #[arg(long, default_value = "sentence.txt")]
    pub output: PathBuf,

    /// Word-frequency corpus used for spelling correction
    #[arg(long, default_value = "data/corpus.txt")]
    pub language_model: PathBuf,

    /// Order words by the number their filename starts with
    /// ("2.png" before "10.png") instead of plain string order
    #[arg(long)]
    pub numeric_order: bool,

    /// Fail if the language model cannot be loaded instead of
    /// emitting the uncorrected sentence
    #[arg(long)]
    pub require_correction: bool,

    /// Most edits the spelling corrector may make to one word
    #[arg(long, default_value_t = DEFAULT_MAX_DISTANCE)]
    pub max_edit_distance: usize,

    #[command(flatten)]
    pub decoder: DecoderArgs,
}

impl From<InferArgs> for InferOptions {
    fn from(a: InferArgs) -> Self {
        InferOptions {
            decoder:        DecoderMode::from(&a.decoder),
            model_dir:      a.model_dir,
            images_dir:     a.images_dir,
            output:         a.output,
            language_model: a.language_model,
            ordering:       if a.numeric_order { OrderingPolicy::Numeric } else { OrderingPolicy::Lexical },
            correction:     if a.require_correction {
                CorrectionFailurePolicy::Abort
            } else {
                CorrectionFailurePolicy::Fallback
            },
            max_edit_distance: a.max_edit_distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        command: Commands,
    }

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = TestCli::parse_from(["htr", "train"]);
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        assert_eq!(PipelineConfig::from(args), PipelineConfig::default());
    }

    #[test]
    fn test_beam_search_flag() {
        let cli = TestCli::parse_from(["htr", "validate", "--beam-search", "--beam-width", "25"]);
        let Commands::Validate(args) = cli.command else { panic!("expected validate") };
        assert_eq!(DecoderMode::from(&args.decoder), DecoderMode::BeamSearch { width: 25 });
    }

    #[test]
    fn test_infer_policies() {
        let cli = TestCli::parse_from(["htr", "infer", "--numeric-order", "--require-correction"]);
        let Commands::Infer(args) = cli.command else { panic!("expected infer") };
        let opts = InferOptions::from(args);
        assert_eq!(opts.ordering, OrderingPolicy::Numeric);
        assert_eq!(opts.correction, CorrectionFailurePolicy::Abort);
        assert_eq!(opts.output, PathBuf::from("sentence.txt"));
        assert_eq!(opts.decoder, DecoderMode::BestPath);
        assert_eq!(opts.max_edit_distance, DEFAULT_MAX_DISTANCE);
    }

    #[test]
    fn test_max_edit_distance_flag() {
        let cli = TestCli::parse_from(["htr", "infer", "--max-edit-distance", "1"]);
        let Commands::Infer(args) = cli.command else { panic!("expected infer") };
        assert_eq!(InferOptions::from(args).max_edit_distance, 1);
    }
}
