// ============================================================
// Layer 2 — ValidateUseCase
// ============================================================
// Re-runs validation on a trained model:
//
//   Step 1: Reload the config and charset saved by `train`
//   Step 2: Restore the checkpoint (fails if there is none)
//   Step 3: Sweep the validation partition of the dataset
//
// The split is seeded, so the validation words are the same
// ones training measured against.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::application::config::PipelineConfig;
use crate::data::loader::WordDataLoader;
use crate::infra::{charset_store::CharsetStore, checkpoint::CheckpointManager};
use crate::ml::{
    decoder::DecoderMode,
    error_metrics::ValidationReport,
    recognizer::{build_recognizer, TrainBackend},
    stop::StopSignal,
    validator::ValidationRunner,
};

pub struct ValidateUseCase {
    model_dir: PathBuf,
    data_dir:  Option<PathBuf>,
    decoder:   DecoderMode,
    stop:      StopSignal,
}

impl ValidateUseCase {
    pub fn new(model_dir: impl Into<PathBuf>, data_dir: Option<PathBuf>, decoder: DecoderMode) -> Self {
        Self { model_dir: model_dir.into(), data_dir, decoder, stop: StopSignal::new() }
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn execute(&self) -> Result<ValidationReport> {
        // ── Step 1: Saved configuration ───────────────────────────────────────
        let checkpoints = CheckpointManager::new(&self.model_dir)?;
        let saved: PipelineConfig = checkpoints.load_config()?;
        let cfg = PipelineConfig {
            data_dir: self.data_dir.clone().unwrap_or(saved.data_dir.clone()),
            decoder:  self.decoder,
            ..saved
        };
        cfg.validate()?;

        let charset = CharsetStore::new(&checkpoints).load()?;
        if let Some(record) = checkpoints.accuracy_record() {
            tracing::info!("{}", record);
        }

        // ── Step 2: Model ─────────────────────────────────────────────────────
        let device    = burn::backend::wgpu::WgpuDevice::default();
        let mut model = build_recognizer::<TrainBackend>(
            charset,
            cfg.recognizer_settings(true),
            checkpoints.clone(),
            device,
        )?;

        // ── Step 3: Validation sweep ──────────────────────────────────────────
        let mut loader = WordDataLoader::open(&cfg.data_dir, cfg.loader_settings())
            .with_context(|| format!("cannot load validation data from '{}'", cfg.data_dir.display()))?;

        let report = ValidationRunner::new()
            .with_stop_signal(self.stop.clone())
            .validate(&mut model, &mut loader)?;
        Ok(report)
    }
}
