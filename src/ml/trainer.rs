// ============================================================
// Layer 5 — Training Controller
// ============================================================
// Epoch loop with best-checkpoint selection and early stopping.
//
//   state = (epoch 0, best CER +∞, 0 epochs without improvement)
//   loop:
//     epoch += 1
//     train on every batch of the training partition
//     CER = validate()            (uncapped, may exceed 1)
//     CER < best  → save model, THEN write accuracy record,
//                   best = CER, counter = 0
//     otherwise   → counter += 1
//     counter == patience → stop
//
// TrainingState is an immutable value: each epoch consumes the
// previous state and returns the next, so the loop is testable
// without a real network or dataset.
//
// Checkpoint failures abort the run before the state is updated;
// the previous best checkpoint survives because every write goes
// to a temporary file first.
//
// Reference: Prechelt (1998) Early Stopping — But When?

use crate::domain::error::{PipelineError, Result};
use crate::domain::traits::{DataSource, Model};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::error_metrics::ValidationReport;
use crate::ml::stop::StopSignal;
use crate::ml::validator::ValidationRunner;

/// Stop after this many consecutive epochs without improvement.
pub const EARLY_STOPPING_PATIENCE: usize = 5;

/// `best_char_error_rate` holds the uncapped rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingState {
    pub epoch:                      usize,
    pub best_char_error_rate:       f64,
    pub epochs_without_improvement: usize,
}

impl TrainingState {
    pub fn initial() -> Self {
        Self {
            epoch:                      0,
            best_char_error_rate:       f64::INFINITY,
            epochs_without_improvement: 0,
        }
    }

    pub fn next_epoch(self) -> Self {
        Self { epoch: self.epoch + 1, ..self }
    }

    /// Strictly better than the best so far.
    pub fn is_improvement(&self, char_error_rate: f64) -> bool {
        char_error_rate < self.best_char_error_rate
    }

    pub fn improved(self, char_error_rate: f64) -> Self {
        Self {
            best_char_error_rate:       char_error_rate,
            epochs_without_improvement: 0,
            ..self
        }
    }

    pub fn stalled(self) -> Self {
        Self { epochs_without_improvement: self.epochs_without_improvement + 1, ..self }
    }

    pub fn should_stop(&self, patience: usize) -> bool {
        self.epochs_without_improvement >= patience
    }
}

/// Drives epochs until early stopping triggers.
pub struct TrainingController<'a> {
    checkpoints: &'a CheckpointManager,
    patience:    usize,
    metrics:     Option<MetricsLogger>,
    stop:        StopSignal,
}

impl<'a> TrainingController<'a> {
    pub fn new(checkpoints: &'a CheckpointManager) -> Self {
        Self {
            checkpoints,
            patience: EARLY_STOPPING_PATIENCE,
            metrics:  None,
            stop:     StopSignal::new(),
        }
    }

    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience.max(1);
        self
    }

    /// Append one CSV row per epoch.
    pub fn with_metrics(mut self, logger: MetricsLogger) -> Self {
        self.metrics = Some(logger);
        self
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Train until early stopping, validating with `ValidationRunner`.
    pub fn run<M: Model, D: DataSource>(&mut self, model: &mut M, data: &mut D) -> Result<TrainingState> {
        let runner = ValidationRunner::new().with_stop_signal(self.stop.clone());
        self.run_with(model, data, |m, d| runner.validate(m, d))
    }

    /// Train until early stopping with a caller-supplied validation step.
    pub fn run_with<M, D, V>(&mut self, model: &mut M, data: &mut D, mut validate: V) -> Result<TrainingState>
    where
        M: Model,
        D: DataSource,
        V: FnMut(&mut M, &mut D) -> Result<ValidationReport>,
    {
        let mut state = TrainingState::initial();
        loop {
            state = self.run_epoch(state, model, data, &mut validate)?;
            if state.should_stop(self.patience) {
                tracing::info!(
                    "No more improvement since {} epochs. Training stopped.",
                    self.patience
                );
                return Ok(state);
            }
        }
    }

    fn run_epoch<M, D, V>(
        &mut self,
        state:    TrainingState,
        model:    &mut M,
        data:     &mut D,
        validate: &mut V,
    ) -> Result<TrainingState>
    where
        M: Model,
        D: DataSource,
        V: FnMut(&mut M, &mut D) -> Result<ValidationReport>,
    {
        let state = state.next_epoch();
        tracing::info!("Epoch: {}", state.epoch);

        // ── Training phase ────────────────────────────────────────────────────
        let train_loss = self.train_epoch(model, data)?;

        // ── Validation phase ──────────────────────────────────────────────────
        let report = validate(model, data)?;
        let cer    = report.char_error_rate;
        let raw    = report.raw_char_error_rate;

        let improved = state.is_improvement(raw);
        let next = if improved {
            tracing::info!("Character error rate improved, save model");
            model.save()?;
            self.checkpoints.save_accuracy(cer)?;
            state.improved(raw)
        } else {
            tracing::info!("Character error rate not improved");
            state.stalled()
        };

        if let Some(logger) = &self.metrics {
            logger.log(&EpochMetrics::new(
                state.epoch,
                train_loss,
                cer,
                report.word_accuracy,
                improved,
            ))?;
        }

        Ok(next)
    }

    /// Drain the training partition; returns the mean batch loss.
    fn train_epoch<M: Model, D: DataSource>(&self, model: &mut M, data: &mut D) -> Result<f64> {
        tracing::info!("Train NN");
        data.select_training_partition();

        let mut loss_sum = 0.0f64;
        let mut batches  = 0usize;

        while data.has_next() {
            if self.stop.is_stop_requested() {
                return Err(PipelineError::Cancelled);
            }

            let (index, total) = data.iterator_position();
            let batch = data.next_batch()?;
            let loss  = model.train_batch(&batch)?;
            tracing::info!("Batch: {} / {} Loss: {}", index, total, loss);

            loss_sum += loss;
            batches  += 1;
        }

        Ok(if batches > 0 { loss_sum / batches as f64 } else { f64::NAN })
    }
}
