// ============================================================
// Layer 3 — Pipeline Errors
// ============================================================
// Every failure the pipeline can report. All of them are fatal
// to the current run: nothing in the pipeline retries.
//
// Running out of batches is NOT an error — `has_next()`
// returning false is the normal end of a partition.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed source error for collaborators whose error types we
/// do not want to leak into the domain (burn recorders, etc).
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// The model reported a fatal error while training on a batch.
    #[error("training failed: {message}")]
    Training { message: String },

    /// The model could not produce recognitions for a batch.
    #[error("inference failed: {message}")]
    Inference { message: String },

    /// A checkpoint, accuracy record or config could not be written.
    #[error("failed to persist {what} to '{}'", path.display())]
    Persistence {
        what:   &'static str,
        path:   PathBuf,
        #[source]
        source: BoxedSource,
    },

    /// A model was required to restore from disk but no checkpoint exists.
    #[error("no checkpoint found at '{}'; train the model first", path.display())]
    CheckpointMissing { path: PathBuf },

    /// The spelling language model could not be loaded.
    #[error("cannot load language model from '{}'", path.display())]
    LanguageModelLoad {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Validation produced no ground-truth characters, so the
    /// character error rate would be a division by zero.
    #[error("validation set contains no ground-truth characters")]
    EmptyValidationSet,

    /// The dataset could not be read or is malformed.
    #[error("dataset error: {message}")]
    Data { message: String },

    /// A word image could not be decoded.
    #[error("cannot load image '{}'", path.display())]
    ImageLoad {
        path:   PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A stop was requested between batches.
    #[error("run cancelled")]
    Cancelled,

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl PipelineError {
    pub fn training(message: impl Into<String>) -> Self {
        Self::Training { message: message.into() }
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference { message: message.into() }
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::Data { message: message.into() }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig { message: message.into() }
    }

    pub fn persistence(
        what:   &'static str,
        path:   impl Into<PathBuf>,
        source: impl Into<BoxedSource>,
    ) -> Self {
        Self::Persistence { what, path: path.into(), source: source.into() }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
