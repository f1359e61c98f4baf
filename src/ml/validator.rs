// ============================================================
// Layer 5 — Validation Runner
// ============================================================
// One full sweep over the validation partition:
//
//   for every batch:
//     recognized = model.infer_batch(batch)
//     for every REAL (recognized, truth) pair:
//       accumulate edit distance, truth length, exact matches
//
// Padded replicas at the end of the last batch are skipped so
// the final word is not counted several times.

use crate::domain::error::{PipelineError, Result};
use crate::domain::traits::{DataSource, Model};
use crate::ml::error_metrics::{ErrorMetrics, ValidationReport};
use crate::ml::stop::StopSignal;

#[derive(Debug, Clone, Default)]
pub struct ValidationRunner {
    stop: StopSignal,
}

impl ValidationRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Sweep the validation partition and return the aggregate rates.
    pub fn validate<M: Model, D: DataSource>(
        &self,
        model: &mut M,
        data:  &mut D,
    ) -> Result<ValidationReport> {
        tracing::info!("Validate NN");
        data.select_validation_partition();

        let mut metrics = ErrorMetrics::new();

        while data.has_next() {
            if self.stop.is_stop_requested() {
                return Err(PipelineError::Cancelled);
            }

            let (index, total) = data.iterator_position();
            tracing::info!("Batch: {} / {}", index, total);

            let batch      = data.next_batch()?;
            let recognized = model.infer_batch(&batch)?;
            let truth      = batch
                .ground_truth()
                .ok_or_else(|| PipelineError::data("validation batch has no ground truth"))?;

            if recognized.len() < batch.real_len() {
                return Err(PipelineError::inference(format!(
                    "model returned {} results for {} images",
                    recognized.len(),
                    batch.real_len()
                )));
            }

            for (rec, gt) in recognized.iter().zip(truth).take(batch.real_len()) {
                let dist = metrics.add(rec, gt);
                if dist == 0 {
                    tracing::debug!("[OK] {:?} -> {:?}", gt, rec);
                } else {
                    tracing::debug!("[ERR:{}] {:?} -> {:?}", dist, gt, rec);
                }
            }
        }

        let report = metrics.report()?;
        tracing::info!(
            "Character error rate: {:.6}%. Word accuracy: {:.6}%.",
            report.char_error_rate * 100.0,
            report.word_accuracy * 100.0,
        );
        Ok(report)
    }
}
