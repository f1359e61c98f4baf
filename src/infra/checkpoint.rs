// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Owns everything the pipeline persists in the model directory:
//
//   model/
//     model.mpk.gz           ← best weights (Burn CompactRecorder)
//     accuracy.txt           ← "Validation character error rate of
//                               saved model: 12.345678%"
//     pipeline_config.json   ← geometry, batch size, charset source
//     charList.txt           ← see CharsetStore
//     metrics.csv            ← see MetricsLogger
//
// Every write lands in a temporary file in the same directory
// and is renamed into place, so an interrupted run leaves the
// previous best checkpoint and record untouched.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

use crate::domain::error::{PipelineError, Result};
use crate::ml::model::CrnnModel;

const MODEL_STEM:    &str = "model";
const STAGING_DIR:   &str = ".staging";
const ACCURACY_FILE: &str = "accuracy.txt";
const CONFIG_FILE:   &str = "pipeline_config.json";

/// Manages the files in one model directory.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Open `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| PipelineError::persistence("model directory", &dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ─── Model weights ────────────────────────────────────────────────────────

    /// The recorder picks the extension, so look for `model.*`.
    pub fn model_file(&self) -> Option<PathBuf> {
        fs::read_dir(&self.dir).ok()?.flatten().map(|e| e.path()).find(|p| {
            p.is_file()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("model."))
        })
    }

    pub fn has_model(&self) -> bool {
        self.model_file().is_some()
    }

    /// Record the weights into a staging directory, then rename
    /// each produced file over the live checkpoint.
    pub fn save_model<B: Backend>(&self, model: &CrnnModel<B>) -> Result<()> {
        let staging = self.dir.join(STAGING_DIR);
        fs::create_dir_all(&staging)
            .map_err(|e| PipelineError::persistence("checkpoint", &staging, e))?;

        CompactRecorder::new()
            .record(model.clone().into_record(), staging.join(MODEL_STEM))
            .map_err(|e| {
                PipelineError::persistence(
                    "checkpoint",
                    staging.join(MODEL_STEM),
                    std::io::Error::other(format!("{e:?}")),
                )
            })?;

        let entries = fs::read_dir(&staging)
            .map_err(|e| PipelineError::persistence("checkpoint", &staging, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| PipelineError::persistence("checkpoint", &staging, e))?;
            let target = self.dir.join(entry.file_name());
            fs::rename(entry.path(), &target)
                .map_err(|e| PipelineError::persistence("checkpoint", &target, e))?;
        }
        fs::remove_dir(&staging).ok();

        tracing::debug!("Saved checkpoint to '{}'", self.dir.display());
        Ok(())
    }

    /// Load the saved weights into `model`.
    pub fn load_model<B: Backend>(&self, model: CrnnModel<B>, device: &B::Device) -> Result<CrnnModel<B>> {
        if !self.has_model() {
            return Err(PipelineError::CheckpointMissing { path: self.dir.join(MODEL_STEM) });
        }

        let path   = self.dir.join(MODEL_STEM);
        let record = CompactRecorder::new().load(path.clone(), device).map_err(|e| {
            PipelineError::data(format!("cannot load checkpoint '{}': {e:?}", path.display()))
        })?;

        tracing::info!("Loaded checkpoint from '{}'", self.dir.display());
        Ok(model.load_record(record))
    }

    // ─── Accuracy record ──────────────────────────────────────────────────────

    pub fn save_accuracy(&self, char_error_rate: f64) -> Result<()> {
        let line = format!(
            "Validation character error rate of saved model: {:.6}%",
            char_error_rate * 100.0
        );
        self.write_atomic("accuracy record", ACCURACY_FILE, line.as_bytes())
    }

    /// The last accuracy record, if training ever saved one.
    pub fn accuracy_record(&self) -> Option<String> {
        fs::read_to_string(self.dir.join(ACCURACY_FILE)).ok()
    }

    // ─── Pipeline configuration ───────────────────────────────────────────────

    pub fn save_config<T: Serialize>(&self, config: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(config)
            .map_err(|e| PipelineError::persistence("config", self.dir.join(CONFIG_FILE), e))?;
        self.write_atomic("config", CONFIG_FILE, json.as_bytes())
    }

    pub fn load_config<T: DeserializeOwned>(&self) -> Result<T> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).map_err(|e| {
            PipelineError::data(format!(
                "cannot read '{}': {e}. Make sure you have run 'train' first.",
                path.display()
            ))
        })?;
        serde_json::from_str(&json)
            .map_err(|e| PipelineError::data(format!("malformed '{}': {e}", path.display())))
    }

    /// Write `bytes` to a temp file beside `name`, then rename it over `name`.
    pub(crate) fn write_atomic(&self, what: &'static str, name: &str, bytes: &[u8]) -> Result<()> {
        let target = self.dir.join(name);
        let mut tmp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| PipelineError::persistence(what, &target, e))?;
        tmp.write_all(bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| PipelineError::persistence(what, &target, e))?;
        tmp.persist(&target)
            .map_err(|e| PipelineError::persistence(what, &target, e.error))?;
        Ok(())
    }
}
