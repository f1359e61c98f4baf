// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction, parsed with `clap`.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`    — trains the recognizer on IAM words
//   2. `validate` — reports CER / word accuracy of the saved model
//   3. `infer`    — turns a folder of word images into a sentence
//
// On Ctrl-C, `train` and `validate` stop at the next batch boundary.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, InferArgs, TrainArgs, ValidateArgs};

use crate::application::{
    infer_use_case::InferUseCase,
    train_use_case::TrainUseCase,
    validate_use_case::ValidateUseCase,
};
use crate::ml::{decoder::DecoderMode, stop::StopSignal};

#[derive(Parser, Debug)]
#[command(
    name = "htr",
    version,
    about = "Train a handwritten word recognizer, then read word images back as sentences."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. The CLI only routes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Validate(args) => run_validate(args),
            Commands::Infer(args)    => run_infer(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    tracing::info!("Starting training on IAM words in: {}", args.data_dir.display());

    let stop  = stop_on_ctrl_c()?;
    let state = TrainUseCase::new(args.into()).with_stop_signal(stop).execute()?;

    println!(
        "Training complete after {} epochs. Best character error rate: {:.6}%",
        state.epoch,
        state.best_char_error_rate.min(1.0) * 100.0
    );
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<()> {
    let decoder = DecoderMode::from(&args.decoder);
    let stop    = stop_on_ctrl_c()?;
    let report  = ValidateUseCase::new(args.model_dir, args.data_dir, decoder)
        .with_stop_signal(stop)
        .execute()?;

    println!(
        "Character error rate: {:.6}%. Word accuracy: {:.6}%.",
        report.char_error_rate * 100.0,
        report.word_accuracy * 100.0
    );
    Ok(())
}

fn run_infer(args: InferArgs) -> Result<()> {
    let sentence = InferUseCase::new(args.into()).execute()?;
    println!("{sentence}");
    Ok(())
}

/// Install the process Ctrl-C handler; the returned signal is
/// raised when it fires. Can only be installed once per process.
pub fn stop_on_ctrl_c() -> Result<StopSignal> {
    let stop   = StopSignal::new();
    let handle = stop.clone();
    ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl-C. Stopping after the current batch...");
        handle.request_stop();
    })
    .context("cannot install Ctrl-C handler")?;
    Ok(stop)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::{process::Command, thread, time::Duration};

    #[test]
    fn test_ctrl_c_raises_stop_signal() {
        let stop = stop_on_ctrl_c().unwrap();
        assert!(!stop.is_stop_requested());

        let status = Command::new("kill")
            .args(["-INT", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        for _ in 0..100 {
            if stop.is_stop_requested() {
                return;
            }
            thread::sleep(Duration::from_millis(50));
        }
        panic!("stop signal never raised");
    }
}
