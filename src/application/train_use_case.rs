// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Check the configuration
//   Step 2: Load and split words.txt      (Layer 4 - data)
//   Step 3: Save charList.txt and config  (Layer 6 - infra)
//   Step 4: Build or restore the model    (Layer 5 - ml)
//   Step 5: Run epochs until the character error rate
//           stops improving               (Layer 5 - ml)
//
// Only the best model is kept on disk: a checkpoint is written
// each time validation beats the previous best.
//
// Reference: Burn Book §5 (Training)

use anyhow::{Context, Result};

use crate::application::config::PipelineConfig;
use crate::data::loader::WordDataLoader;
use crate::domain::traits::DataSource;
use crate::infra::{
    charset_store::CharsetStore,
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
};
use crate::ml::{
    recognizer::{build_recognizer, TrainBackend},
    stop::StopSignal,
    trainer::{TrainingController, TrainingState},
};

pub struct TrainUseCase {
    config: PipelineConfig,
    stop:   StopSignal,
}

impl TrainUseCase {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config, stop: StopSignal::new() }
    }

    /// Share a stop flag with the caller so training can be cancelled.
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingState> {
        let cfg = &self.config;

        // ── Step 1: Configuration ─────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Dataset ───────────────────────────────────────────────────
        tracing::info!("Loading IAM words from '{}'", cfg.data_dir.display());
        let mut loader = WordDataLoader::open(&cfg.data_dir, cfg.loader_settings())
            .with_context(|| format!("cannot load training data from '{}'", cfg.data_dir.display()))?;

        // ── Step 3: Persist what inference will need ──────────────────────────
        let checkpoints = CheckpointManager::new(&cfg.model_dir)?;
        CharsetStore::new(&checkpoints).save(loader.charset())?;
        checkpoints.save_config(cfg)?;

        // ── Step 4: Model ─────────────────────────────────────────────────────
        let device    = burn::backend::wgpu::WgpuDevice::default();
        let mut model = build_recognizer::<TrainBackend>(
            loader.charset().clone(),
            cfg.recognizer_settings(false),
            checkpoints.clone(),
            device,
        )?;

        // ── Step 5: Train ─────────────────────────────────────────────────────
        let metrics = MetricsLogger::new(&cfg.model_dir)?;
        let state   = TrainingController::new(&checkpoints)
            .with_patience(cfg.early_stopping)
            .with_metrics(metrics)
            .with_stop_signal(self.stop.clone())
            .run(&mut model, &mut loader)?;

        tracing::info!(
            "Finished after {} epochs, best character error rate {:.6}%",
            state.epoch,
            state.best_char_error_rate.min(1.0) * 100.0
        );
        Ok(state)
    }
}
