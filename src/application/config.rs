// ============================================================
// Layer 2 — Pipeline Configuration
// ============================================================
// All settings for a run, in one serialisable struct.
//
// `train` saves it as pipeline_config.json in the model
// directory. `validate` and `infer` reload it so the model is
// rebuilt with the geometry it was trained with, then apply
// the few options that may change per run (decoder, data dir).
//
// The #[serde(default)] attribute lets configs written by older
// runs load even when a field was added later.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::data::loader::LoaderSettings;
use crate::domain::error::{PipelineError, Result};
use crate::ml::decoder::DecoderMode;
use crate::ml::recognizer::RecognizerSettings;
use crate::ml::trainer::EARLY_STOPPING_PATIENCE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_dir:                PathBuf,
    pub model_dir:               PathBuf,
    pub batch_size:              usize,
    pub img_width:               usize,
    pub img_height:              usize,
    pub max_text_len:            usize,
    pub hidden:                  usize,
    pub dropout:                 f64,
    pub learning_rate:           f64,
    pub train_fraction:          f64,
    pub train_samples_per_epoch: usize,
    pub early_stopping:          usize,
    pub seed:                    u64,
    pub decoder:                 DecoderMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir:                PathBuf::from("data"),
            model_dir:               PathBuf::from("model"),
            batch_size:              50,
            img_width:               128,
            img_height:              32,
            max_text_len:            32,
            hidden:                  256,
            dropout:                 0.2,
            learning_rate:           1e-3,
            train_fraction:          0.95,
            train_samples_per_epoch: 25_000,
            early_stopping:          EARLY_STOPPING_PATIENCE,
            seed:                    42,
            decoder:                 DecoderMode::BestPath,
        }
    }
}

impl PipelineConfig {
    /// Reject settings the network or the CTC loss cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(PipelineError::invalid_config("batch size must be at least 1"));
        }
        if self.img_height == 0 || self.img_height % 8 != 0 {
            return Err(PipelineError::invalid_config(format!(
                "image height {} must be a positive multiple of 8",
                self.img_height
            )));
        }
        if self.img_width == 0 || self.img_width % 4 != 0 {
            return Err(PipelineError::invalid_config(format!(
                "image width {} must be a positive multiple of 4",
                self.img_width
            )));
        }
        // One CTC time step per 4 pixel columns
        if self.max_text_len == 0 || self.max_text_len > self.img_width / 4 {
            return Err(PipelineError::invalid_config(format!(
                "max text length {} must be between 1 and {} for width {}",
                self.max_text_len,
                self.img_width / 4,
                self.img_width
            )));
        }
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(PipelineError::invalid_config(format!(
                "train fraction {} must be in (0, 1)",
                self.train_fraction
            )));
        }
        if self.early_stopping == 0 {
            return Err(PipelineError::invalid_config("early stopping patience must be at least 1"));
        }
        if let DecoderMode::BeamSearch { width: 0 } = self.decoder {
            return Err(PipelineError::invalid_config("beam width must be at least 1"));
        }
        Ok(())
    }

    pub fn loader_settings(&self) -> LoaderSettings {
        LoaderSettings {
            batch_size:              self.batch_size,
            max_text_len:            self.max_text_len,
            img_width:               self.img_width as u32,
            img_height:              self.img_height as u32,
            train_fraction:          self.train_fraction,
            train_samples_per_epoch: self.train_samples_per_epoch,
            seed:                    self.seed,
        }
    }

    pub fn recognizer_settings(&self, must_restore: bool) -> RecognizerSettings {
        RecognizerSettings {
            batch_size:    self.batch_size,
            img_height:    self.img_height,
            hidden:        self.hidden,
            dropout:       self.dropout,
            learning_rate: self.learning_rate,
            decoder:       self.decoder,
            must_restore,
        }
    }
}
