// ============================================================
// Layer 4 — IAM Word Loader
// ============================================================
// Loads the IAM handwriting word database and serves it as
// fixed-size batches through the DataSource trait.
//
// Expected layout under the data directory:
//
//   data/
//     words.txt                         ← one line per word
//     words/a01/a01-000u/a01-000u-00-00.png
//     ...
//
// A words.txt line looks like:
//
//   a01-000u-00-00 ok 154 408 768 27 51 AT A
//   └─ id ───────┘ └─ segmentation, gray level, bbox, tag ┘ └ text
//
// Field 9 onward is the ground truth. Lines starting with '#'
// are comments.
//
// Images are only decoded when their batch is requested, so an
// epoch never holds more than one batch of pixels in memory.
//
// Reference: Marti & Bunke (2002) The IAM-database

use std::{
    fs,
    path::{Path, PathBuf},
};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::{
    dataset::{truncate_label, WordSample},
    preprocessor::ImagePreprocessor,
    splitter::split_train_val,
};
use crate::domain::batch::{Batch, Charset};
use crate::domain::error::{PipelineError, Result};
use crate::domain::traits::DataSource;

/// Everything the loader needs to know about batching and geometry.
#[derive(Debug, Clone)]
pub struct LoaderSettings {
    pub batch_size:              usize,
    pub max_text_len:            usize,
    pub img_width:               u32,
    pub img_height:              u32,
    pub train_fraction:          f64,
    pub train_samples_per_epoch: usize,
    pub seed:                    u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Partition {
    Train,
    Validation,
}

/// Serves IAM words as training and validation batches.
pub struct WordDataLoader {
    settings:     LoaderSettings,
    preprocessor: ImagePreprocessor,
    train:        Vec<WordSample>,
    validation:   Vec<WordSample>,
    active:       Vec<WordSample>,
    cursor:       usize,
    charset:      Charset,
    rng:          StdRng,
    partition:    Partition,
}

impl WordDataLoader {
    /// Read `<data_dir>/words.txt` and split it.
    pub fn open(data_dir: impl AsRef<Path>, settings: LoaderSettings) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let index    = data_dir.join("words.txt");
        let content  = fs::read_to_string(&index).map_err(|e| {
            PipelineError::data(format!("cannot read '{}': {e}", index.display()))
        })?;

        let samples: Vec<WordSample> = parse_words_file(data_dir, &content, settings.max_text_len)
            .into_iter()
            .filter(|s| {
                let usable = fs::metadata(&s.image_path).map(|m| m.len() > 0).unwrap_or(false);
                if !usable {
                    tracing::warn!("Skipping missing or empty image '{}'", s.image_path.display());
                }
                usable
            })
            .collect();

        tracing::info!("Loaded {} word samples from '{}'", samples.len(), index.display());
        Self::from_samples(samples, settings)
    }

    /// Build a loader over samples that are already known to exist.
    pub fn from_samples(samples: Vec<WordSample>, settings: LoaderSettings) -> Result<Self> {
        if samples.is_empty() {
            return Err(PipelineError::data("no usable word samples"));
        }
        if settings.batch_size == 0 {
            return Err(PipelineError::invalid_config("batch size must be at least 1"));
        }

        let charset = Charset::from_texts(samples.iter().map(|s| s.ground_truth.as_str()));
        let (train, validation) = split_train_val(samples, settings.train_fraction, settings.seed);
        tracing::info!(
            "Split: {} train, {} validation, {} distinct characters",
            train.len(),
            validation.len(),
            charset.len()
        );

        Ok(Self {
            preprocessor: ImagePreprocessor::new(settings.img_width, settings.img_height),
            rng:          StdRng::seed_from_u64(settings.seed),
            settings,
            train,
            validation,
            active:       Vec::new(),
            cursor:       0,
            charset,
            partition:    Partition::Train,
        })
    }

    pub fn train_len(&self) -> usize {
        self.train.len()
    }

    pub fn validation_len(&self) -> usize {
        self.validation.len()
    }
}

impl DataSource for WordDataLoader {
    /// Draw a fresh shuffled subset of the training words.
    fn select_training_partition(&mut self) {
        let mut epoch = self.train.clone();
        epoch.shuffle(&mut self.rng);
        epoch.truncate(self.settings.train_samples_per_epoch);
        self.active    = epoch;
        self.cursor    = 0;
        self.partition = Partition::Train;
    }

    fn select_validation_partition(&mut self) {
        self.active    = self.validation.clone();
        self.cursor    = 0;
        self.partition = Partition::Validation;
    }

    fn has_next(&self) -> bool {
        self.cursor < self.active.len()
    }

    fn next_batch(&mut self) -> Result<Batch> {
        if !self.has_next() {
            return Err(PipelineError::data(format!(
                "{:?} partition is exhausted",
                self.partition
            )));
        }

        let end   = (self.cursor + self.settings.batch_size).min(self.active.len());
        let words = &self.active[self.cursor..end];

        let mut samples = Vec::with_capacity(words.len());
        for word in words {
            let image = self.preprocessor.load(&word.image_path)?;
            samples.push((image, word.ground_truth.clone()));
        }
        self.cursor = end;

        Batch::labelled(samples, self.settings.batch_size)
    }

    fn iterator_position(&self) -> (usize, usize) {
        let size = self.settings.batch_size;
        (self.cursor / size + 1, self.active.len().div_ceil(size))
    }

    fn charset(&self) -> &Charset {
        &self.charset
    }
}

/// Parse the contents of an IAM `words.txt`.
///
/// Lines that are comments or have fewer than nine fields are
/// ignored; labels are truncated to fit `max_text_len` CTC steps.
pub fn parse_words_file(data_dir: &Path, content: &str, max_text_len: usize) -> Vec<WordSample> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 9 {
                return None;
            }
            let path = image_path_for(data_dir, fields[0])?;
            let text = truncate_label(&fields[8..].join(" "), max_text_len);
            Some(WordSample::new(path, text))
        })
        .collect()
}

/// `a01-000u-00-00` → `<data_dir>/words/a01/a01-000u/a01-000u-00-00.png`
fn image_path_for(data_dir: &Path, id: &str) -> Option<PathBuf> {
    let mut parts = id.split('-');
    let form      = parts.next()?;
    let page      = parts.next()?;
    Some(
        data_dir
            .join("words")
            .join(form)
            .join(format!("{form}-{page}"))
            .join(format!("{id}.png")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn settings(batch_size: usize) -> LoaderSettings {
        LoaderSettings {
            batch_size,
            max_text_len:            32,
            img_width:               16,
            img_height:              8,
            train_fraction:          0.5,
            train_samples_per_epoch: 25_000,
            seed:                    3,
        }
    }

    #[test]
    fn test_parse_words_file() {
        let content = "\
# comment line
a01-000u-00-00 ok 154 408 768 27 51 AT A
a01-000u-00-01 ok 154 507 766 213 48 NN MOVE
short line
a01-000u-00-02 err 154 796 764 70 50 TO to be
";
        let samples = parse_words_file(Path::new("data"), content, 32);
        assert_eq!(samples.len(), 3);
        assert_eq!(
            samples[0].image_path,
            Path::new("data/words/a01/a01-000u/a01-000u-00-00.png")
        );
        assert_eq!(samples[1].ground_truth, "MOVE");
        assert_eq!(samples[2].ground_truth, "to be");
    }

    #[test]
    fn test_batches_padded_and_counted() {
        let dir = tempfile::tempdir().unwrap();
        let mut samples = Vec::new();
        for (i, text) in ["a", "b", "c", "d", "e", "f"].iter().enumerate() {
            let path = dir.path().join(format!("{i}.png"));
            GrayImage::from_pixel(10, 5, Luma([i as u8 * 30])).save(&path).unwrap();
            samples.push(WordSample::new(path, *text));
        }

        let mut loader = WordDataLoader::from_samples(samples, settings(2)).unwrap();
        assert_eq!(loader.charset().serialize(), "abcdef");

        loader.select_validation_partition();
        assert_eq!(loader.validation_len(), 3);
        assert_eq!(loader.iterator_position(), (1, 2));

        let first = loader.next_batch().unwrap();
        assert_eq!((first.len(), first.real_len()), (2, 2));
        assert_eq!(loader.iterator_position(), (2, 2));

        let second = loader.next_batch().unwrap();
        assert_eq!((second.len(), second.real_len()), (2, 1));
        let truth = second.ground_truth().unwrap();
        assert_eq!(truth[0], truth[1]);

        assert!(!loader.has_next());
        assert!(loader.next_batch().is_err());
    }

    #[test]
    fn test_training_partition_subsampled() {
        let samples = (0..10)
            .map(|i| WordSample::new(format!("{i}.png"), "x"))
            .collect();
        let mut cfg = settings(4);
        cfg.train_fraction          = 1.0;
        cfg.train_samples_per_epoch = 6;

        let mut loader = WordDataLoader::from_samples(samples, cfg).unwrap();
        loader.select_training_partition();
        assert_eq!(loader.iterator_position(), (1, 2));
    }

    #[test]
    fn test_empty_dataset_rejected() {
        assert!(WordDataLoader::from_samples(Vec::new(), settings(2)).is_err());
    }
}
