// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records one CSV row per training epoch.
//
// Metrics recorded per epoch:
//   - epoch:           the epoch number (1, 2, 3, ...)
//   - train_loss:      mean CTC loss over the training batches
//   - char_error_rate: validation CER, in [0, 1]
//   - word_accuracy:   fraction of validation words recognised exactly
//   - improved:        whether this epoch saved a new checkpoint
//
// Output file: <model_dir>/metrics.csv
//
// Example CSV output:
//   epoch,train_loss,char_error_rate,word_accuracy,improved
//   1,14.812300,0.412000,0.103000,true
//   2,9.250100,0.281200,0.244000,true
//   3,8.990000,0.290500,0.239000,false
//
// How to read the metrics:
//   - train_loss should fall every epoch
//   - char_error_rate drives early stopping; a run ends after
//     `patience` consecutive rows with improved=false
//
// The file is appended to across runs, so a resumed training
// session continues the same log.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, Result};

const HEADER: &str = "epoch,train_loss,char_error_rate,word_accuracy,improved";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean CTC loss over all training batches of the epoch
    pub train_loss: f64,

    /// Validation character error rate after the epoch
    pub char_error_rate: f64,

    /// Validation word accuracy after the epoch
    pub word_accuracy: f64,

    /// True if the epoch beat the best error rate so far
    pub improved: bool,
}

impl EpochMetrics {
    pub fn new(
        epoch:           usize,
        train_loss:      f64,
        char_error_rate: f64,
        word_accuracy:   f64,
        improved:        bool,
    ) -> Self {
        Self { epoch, train_loss, char_error_rate, word_accuracy, improved }
    }

    /// Returns true if this epoch's error rate beats `best_char_error_rate`
    pub fn is_improvement(&self, best_char_error_rate: f64) -> bool {
        self.char_error_rate < best_char_error_rate
    }

    fn to_csv_row(self) -> String {
        format!(
            "{},{:.6},{:.6},{:.6},{}",
            self.epoch, self.train_loss, self.char_error_rate, self.word_accuracy, self.improved,
        )
    }
}

/// Appends epoch metrics to `metrics.csv`.
#[derive(Debug, Clone)]
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger, writing the CSV header if the file is new.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| PipelineError::persistence("metrics", dir, e))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            fs::write(&csv_path, format!("{HEADER}\n"))
                .map_err(|e| PipelineError::persistence("metrics", &csv_path, e))?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .map_err(|e| PipelineError::persistence("metrics", &self.csv_path, e))?;

        writeln!(f, "{}", m.to_csv_row())
            .map_err(|e| PipelineError::persistence("metrics", &self.csv_path, e))?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, cer={:.4}",
            m.epoch,
            m.train_loss,
            m.char_error_rate,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
