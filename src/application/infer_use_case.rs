// ============================================================
// Layer 2 — InferUseCase
// ============================================================
// Reads one line of handwriting that a segmenter has already
// split into word images, and writes it out as a sentence.
//
//   Step 1: Reload config + charset, restore the checkpoint
//   Step 2: Load the language model (once)
//   Step 3: Recognize every word image on its own
//   Step 4: Order the words by filename and join them
//   Step 5: Spell-correct the whole sentence (once)
//   Step 6: Overwrite the output file
//
//   words/1.png ─┐                                     ┌─ sentence.txt
//   words/2.png ─┼─► recognize ─► assemble ─► correct ─┤
//   words/3.png ─┘                                     └─ stdout
//
// Each image is recognized independently; the model only sees
// full batches, so FixedBatchAdapter pads every single image
// up to the batch size.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::application::config::PipelineConfig;
use crate::data::preprocessor::ImagePreprocessor;
use crate::domain::batch::WordImage;
use crate::domain::error::PipelineError;
use crate::domain::fragment::{OrderingPolicy, PositionedFragment};
use crate::domain::traits::{Corrector, WordRecognizer};
use crate::infra::{charset_store::CharsetStore, checkpoint::CheckpointManager};
use crate::ml::{
    decoder::DecoderMode,
    inferencer::FixedBatchAdapter,
    recognizer::{build_recognizer, TrainBackend},
};
use crate::text::{
    assembler::SentenceAssembler,
    corrector::{CorrectionFailurePolicy, PostCorrector},
};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// Per-run options for `infer`.
#[derive(Debug, Clone)]
pub struct InferOptions {
    pub model_dir:      PathBuf,
    pub images_dir:     PathBuf,
    pub output:         PathBuf,
    pub language_model: PathBuf,
    pub decoder:        DecoderMode,
    pub ordering:       OrderingPolicy,
    pub correction:     CorrectionFailurePolicy,
    /// Most edits allowed when replacing a misspelled word
    pub max_edit_distance: usize,
}

pub struct InferUseCase {
    options: InferOptions,
}

impl InferUseCase {
    pub fn new(options: InferOptions) -> Self {
        Self { options }
    }

    /// Run the whole pipeline and return the corrected sentence.
    pub fn execute(&self) -> Result<String> {
        let opts = &self.options;

        // ── Step 1: Model ─────────────────────────────────────────────────────
        let checkpoints = CheckpointManager::new(&opts.model_dir)?;
        let saved: PipelineConfig = checkpoints.load_config()?;
        let cfg = PipelineConfig { decoder: opts.decoder, ..saved };
        cfg.validate()?;

        let charset = CharsetStore::new(&checkpoints).load()?;
        if let Some(record) = checkpoints.accuracy_record() {
            tracing::info!("{}", record);
        }

        let device    = burn::backend::wgpu::WgpuDevice::default();
        let mut model = build_recognizer::<TrainBackend>(
            charset,
            cfg.recognizer_settings(true),
            checkpoints,
            device,
        )?;

        // ── Step 2: Language model ────────────────────────────────────────────
        let corrector = PostCorrector::load(&opts.language_model, opts.correction)?
            .with_max_distance(opts.max_edit_distance);

        // ── Steps 3-5: Recognize, assemble, correct ───────────────────────────
        let preprocessor = ImagePreprocessor::new(cfg.img_width as u32, cfg.img_height as u32);
        let words = list_word_images(&opts.images_dir)?
            .into_iter()
            .map(|(key, path)| -> Result<(String, WordImage)> { Ok((key, preprocessor.load(&path)?)) })
            .collect::<Result<Vec<_>>>()?;

        let sentence = recognize_sentence(
            &mut FixedBatchAdapter::new(&mut model),
            words,
            &SentenceAssembler::new(opts.ordering),
            &corrector,
        )?;

        // ── Step 6: Output ────────────────────────────────────────────────────
        fs::write(&opts.output, &sentence)
            .with_context(|| format!("cannot write '{}'", opts.output.display()))?;
        tracing::info!("Wrote sentence to '{}'", opts.output.display());

        Ok(sentence)
    }
}

/// Recognize each (key, image) pair, assemble the words in key
/// order and correct the result once.
pub fn recognize_sentence<R, C>(
    recognizer: &mut R,
    words:      Vec<(String, WordImage)>,
    assembler:  &SentenceAssembler,
    corrector:  &PostCorrector<C>,
) -> Result<String>
where
    R: WordRecognizer,
    C: Corrector,
{
    let mut fragments = Vec::with_capacity(words.len());
    for (key, image) in words {
        let text = recognizer
            .recognize(image)
            .with_context(|| format!("cannot recognize '{key}'"))?;
        tracing::info!("Recognized: {:?} in '{}'", text, key);
        fragments.push(PositionedFragment::new(key, text));
    }

    let sentence = assembler.assemble(fragments);
    tracing::info!("Assembled: {:?}", sentence);

    let corrected = corrector.correct(&sentence);
    tracing::info!("Corrected: {:?}", corrected);
    Ok(corrected)
}

/// Word images in `dir` as (filename, path), sorted by filename.
pub fn list_word_images(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("cannot read word image directory '{}'", dir.display()))?;

    let mut images = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_image = path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        if !is_image {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            images.push((name.to_string(), path.clone()));
        }
    }

    if images.is_empty() {
        return Err(PipelineError::data(format!("no word images in '{}'", dir.display())).into());
    }
    images.sort();
    tracing::info!("Found {} word images in '{}'", images.len(), dir.display());
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Reads the word straight out of a lookup by pixel value.
    struct LookupRecognizer {
        words: Vec<&'static str>,
    }

    impl WordRecognizer for LookupRecognizer {
        fn recognize(&mut self, image: WordImage) -> crate::domain::error::Result<String> {
            Ok(self.words[image.pixels[0] as usize].to_string())
        }
    }

    /// Keeps every input it was asked to correct.
    #[derive(Default)]
    struct RecordingCorrector {
        seen: RefCell<Vec<String>>,
    }

    impl Corrector for RecordingCorrector {
        fn correct(&self, text: &str) -> String {
            self.seen.borrow_mut().push(text.to_string());
            text.replace("teh", "the")
        }
        fn name(&self) -> &str {
            "recording"
        }
    }

    fn word(id: usize) -> WordImage {
        WordImage::new(1, 1, vec![id as f32]).unwrap()
    }

    #[test]
    fn test_words_ordered_and_corrected_once() {
        let mut recognizer = LookupRecognizer { words: vec!["teh", "cat", "sat"] };
        let corrector      = PostCorrector::new(RecordingCorrector::default());
        let words = vec![
            ("2.png".to_string(), word(1)),
            ("1.png".to_string(), word(0)),
            ("3.png".to_string(), word(2)),
        ];

        let sentence =
            recognize_sentence(&mut recognizer, words, &SentenceAssembler::default(), &corrector).unwrap();
        assert_eq!(sentence, " the cat sat");
    }

    #[test]
    fn test_corrector_sees_whole_sentence_once() {
        let mut recognizer = LookupRecognizer { words: vec!["teh", "cat", "sat"] };
        let corrector      = PostCorrector::new(RecordingCorrector::default());
        let words = vec![
            ("3.png".to_string(), word(2)),
            ("1.png".to_string(), word(0)),
            ("2.png".to_string(), word(1)),
        ];

        recognize_sentence(&mut recognizer, words, &SentenceAssembler::default(), &corrector).unwrap();
        let seen = corrector.inner().unwrap().seen.borrow();
        assert_eq!(*seen, vec![" teh cat sat".to_string()]);
    }

    #[test]
    fn test_list_word_images_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["2.png", "1.JPG", "notes.txt", "3.tiff"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("sub.png")).unwrap();

        let keys: Vec<String> = list_word_images(dir.path()).unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["1.JPG", "2.png", "3.tiff"]);
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_word_images(dir.path()).is_err());
    }
}
