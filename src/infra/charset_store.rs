// ============================================================
// Layer 6 — Charset Store
// ============================================================
// Persists the character set the model was trained with.
//
// The output layer has one class per character plus the CTC
// blank, so validation and inference must decode with exactly
// the charset training used. It is written once per training
// run as `charList.txt`: every character on a single line, in
// class-index order, with no separator.
//
//   "ab" + "ba" + "cab"  ──►  charList.txt = "abc"

use std::{fs, path::PathBuf};

use crate::domain::batch::Charset;
use crate::domain::error::{PipelineError, Result};
use crate::infra::checkpoint::CheckpointManager;

pub const CHARSET_FILE: &str = "charList.txt";

pub struct CharsetStore<'a> {
    checkpoints: &'a CheckpointManager,
}

impl<'a> CharsetStore<'a> {
    pub fn new(checkpoints: &'a CheckpointManager) -> Self {
        Self { checkpoints }
    }

    pub fn path(&self) -> PathBuf {
        self.checkpoints.dir().join(CHARSET_FILE)
    }

    pub fn save(&self, charset: &Charset) -> Result<()> {
        self.checkpoints
            .write_atomic("charset", CHARSET_FILE, charset.serialize().as_bytes())?;
        tracing::info!("Saved {} characters to '{}'", charset.len(), self.path().display());
        Ok(())
    }

    /// Load the charset written by the last training run.
    pub fn load(&self) -> Result<Charset> {
        let path = self.path();
        let text = fs::read_to_string(&path).map_err(|e| {
            PipelineError::data(format!(
                "cannot read '{}': {e}. Make sure you have run 'train' first.",
                path.display()
            ))
        })?;

        let charset = Charset::parse(text.trim_end_matches(['\n', '\r']));
        if charset.is_empty() {
            return Err(PipelineError::data(format!("'{}' is empty", path.display())));
        }
        Ok(charset)
    }
}
