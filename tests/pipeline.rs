// End-to-end runs of the pipeline with in-memory models.
//
// The recognizers here never touch Burn: the training loop,
// validation, checkpoint bookkeeping, inference adapter,
// sentence assembly and spelling correction are exercised
// through the same public API the CLI uses.

use std::{fs, path::Path};

use image::{GrayImage, Luma};

use htr_pipeline::application::infer_use_case::{list_word_images, recognize_sentence};
use htr_pipeline::data::{loader::{LoaderSettings, WordDataLoader}, preprocessor::ImagePreprocessor};
use htr_pipeline::domain::batch::{Batch, Charset, RecognitionResult};
use htr_pipeline::domain::error::Result;
use htr_pipeline::domain::fragment::OrderingPolicy;
use htr_pipeline::domain::traits::{DataSource, Model};
use htr_pipeline::infra::{charset_store::CharsetStore, checkpoint::CheckpointManager, metrics::MetricsLogger};
use htr_pipeline::ml::inferencer::FixedBatchAdapter;
use htr_pipeline::ml::trainer::TrainingController;
use htr_pipeline::text::{
    assembler::SentenceAssembler,
    corrector::{CorrectionFailurePolicy, PostCorrector},
};

// ─── Fakes ────────────────────────────────────────────────────────────────────

/// Reads back the ground truth when the batch has one.
struct OracleModel {
    batch_size: usize,
    saves:      usize,
}

impl Model for OracleModel {
    fn batch_size(&self) -> usize {
        self.batch_size
    }
    fn train_batch(&mut self, batch: &Batch) -> Result<f64> {
        assert_eq!(batch.len(), self.batch_size);
        Ok(1.0)
    }
    fn infer_batch(&mut self, batch: &Batch) -> Result<RecognitionResult> {
        Ok(batch.ground_truth().map(<[String]>::to_vec).unwrap_or_default())
    }
    fn save(&mut self) -> Result<()> {
        self.saves += 1;
        Ok(())
    }
}

/// Finds the one dark pixel column in each image and maps it to a word.
struct ColumnModel {
    words:   Vec<&'static str>,
    spacing: usize,
}

impl Model for ColumnModel {
    fn batch_size(&self) -> usize {
        4
    }
    fn train_batch(&mut self, _batch: &Batch) -> Result<f64> {
        Ok(0.0)
    }
    fn infer_batch(&mut self, batch: &Batch) -> Result<RecognitionResult> {
        Ok(batch
            .images()
            .iter()
            .map(|img| {
                let darkest = img
                    .pixels
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                self.words[(darkest % img.width) / self.spacing].to_string()
            })
            .collect())
    }
    fn save(&mut self) -> Result<()> {
        Ok(())
    }
}

fn write_iam_dataset(root: &Path, words: &[&str]) {
    let mut index = String::from("# IAM words\n");
    for (i, text) in words.iter().enumerate() {
        let id  = format!("a01-000u-00-{i:02}");
        let dir = root.join("words/a01/a01-000u");
        fs::create_dir_all(&dir).unwrap();
        GrayImage::from_pixel(20, 8, Luma([(i * 20) as u8])).save(dir.join(format!("{id}.png"))).unwrap();
        index.push_str(&format!("{id} ok 154 408 768 27 51 AT {text}\n"));
    }
    // A listed word whose image is missing is skipped
    index.push_str("a01-000u-00-99 ok 154 408 768 27 51 AT ghost\n");
    fs::write(root.join("words.txt"), index).unwrap();
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn test_training_stops_after_patience_and_keeps_best() {
    let data  = tempfile::tempdir().unwrap();
    let model = tempfile::tempdir().unwrap();
    write_iam_dataset(data.path(), &["the", "cat", "sat", "on", "a", "mat", "by", "me"]);

    let settings = LoaderSettings {
        batch_size:              3,
        max_text_len:            8,
        img_width:               16,
        img_height:              8,
        train_fraction:          0.75,
        train_samples_per_epoch: 100,
        seed:                    1,
    };
    let mut loader = WordDataLoader::open(data.path(), settings).unwrap();
    assert_eq!(loader.train_len() + loader.validation_len(), 8);

    let checkpoints = CheckpointManager::new(model.path()).unwrap();
    CharsetStore::new(&checkpoints).save(loader.charset()).unwrap();

    let mut oracle = OracleModel { batch_size: 3, saves: 0 };
    let state = TrainingController::new(&checkpoints)
        .with_patience(2)
        .with_metrics(MetricsLogger::new(model.path()).unwrap())
        .run(&mut oracle, &mut loader)
        .unwrap();

    // Perfect from epoch 1, never strictly better again
    assert_eq!(state.epoch, 3);
    assert_eq!(oracle.saves, 1);
    assert_eq!(
        checkpoints.accuracy_record().unwrap(),
        "Validation character error rate of saved model: 0.000000%"
    );

    let csv = fs::read_to_string(model.path().join("metrics.csv")).unwrap();
    assert_eq!(csv.lines().count(), 4);

    let charset = CharsetStore::new(&checkpoints).load().unwrap();
    assert_eq!(&charset, loader.charset());
    assert!(charset.index_of('g').is_none());
}

#[test]
fn test_word_images_to_corrected_sentence() {
    let words  = tempfile::tempdir().unwrap();
    let corpus = tempfile::NamedTempFile::new().unwrap();
    fs::write(corpus.path(), "the 500\ncat 40\nsat 30\n").unwrap();

    // Image n has its dark column at x = 8n; filenames are out of order
    for (name, column) in [("2.png", 8u32), ("1.png", 0), ("3.png", 16)] {
        let mut img = GrayImage::from_pixel(32, 8, Luma([255u8]));
        for y in 0..8 {
            img.put_pixel(column, y, Luma([0u8]));
        }
        img.save(words.path().join(name)).unwrap();
    }
    fs::write(words.path().join("notes.txt"), "not an image").unwrap();

    let preprocessor = ImagePreprocessor::new(32, 8);
    let images = list_word_images(words.path())
        .unwrap()
        .into_iter()
        .map(|(key, path)| (key, preprocessor.load(&path).unwrap()))
        .collect();

    let mut model = ColumnModel { words: vec!["teh", "cat", "sat"], spacing: 8 };
    let corrector = PostCorrector::load(corpus.path(), CorrectionFailurePolicy::Abort).unwrap();

    let sentence = recognize_sentence(
        &mut FixedBatchAdapter::new(&mut model),
        images,
        &SentenceAssembler::new(OrderingPolicy::Lexical),
        &corrector,
    )
    .unwrap();

    assert_eq!(sentence, " the cat sat");
}

#[test]
fn test_fallback_without_language_model() {
    let dir = tempfile::tempdir().unwrap();
    let corrector =
        PostCorrector::load(dir.path().join("missing.txt"), CorrectionFailurePolicy::Fallback).unwrap();
    assert_eq!(corrector.correct(" teh cat"), " teh cat");
}

#[test]
fn test_charset_survives_model_directory_round_trip() {
    let dir         = tempfile::tempdir().unwrap();
    let checkpoints = CheckpointManager::new(dir.path()).unwrap();
    let charset     = Charset::from_texts(["A MOVE to stop Mr. Gaitskell"]);

    CharsetStore::new(&checkpoints).save(&charset).unwrap();
    let loaded = CharsetStore::new(&checkpoints).load().unwrap();

    assert_eq!(loaded.encode("stop").unwrap(), charset.encode("stop").unwrap());
    assert_eq!(loaded.len(), charset.len());
}
