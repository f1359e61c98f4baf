// ============================================================
// Layer 3 — Word Images, Batches and the Character Set
// ============================================================
// A Batch is what the model consumes: a fixed number of
// preprocessed word images, optionally paired with the text
// written in each one.
//
// The recognizer only accepts batches of one constant size.
// When a partition runs out of samples mid-batch, the last real
// sample is repeated until the batch is full. `real_len` records
// how many leading entries are genuine so that evaluation never
// counts the padding twice.
//
//   images:       [img0, img1, img2, img2, img2]   (batch_size = 5)
//   ground_truth: ["a",  "b",  "c",  "c",  "c" ]
//   real_len:     3

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, Result};

/// A preprocessed grayscale word image.
///
/// Pixels are row-major, `height * width` long, already scaled
/// and normalised for the network.
#[derive(Debug, Clone, PartialEq)]
pub struct WordImage {
    pub width:  usize,
    pub height: usize,
    pub pixels: Vec<f32>,
}

impl WordImage {
    pub fn new(width: usize, height: usize, pixels: Vec<f32>) -> Result<Self> {
        if pixels.len() != width * height {
            return Err(PipelineError::data(format!(
                "image buffer has {} pixels, expected {}x{}",
                pixels.len(), width, height
            )));
        }
        Ok(Self { width, height, pixels })
    }
}

/// Recognized strings, positionally aligned with a batch's images.
pub type RecognitionResult = Vec<String>;

#[derive(Debug, Clone)]
pub struct Batch {
    images:       Vec<WordImage>,
    ground_truth: Option<Vec<String>>,
    real_len:     usize,
}

// Never empty: pad_to rejects zero samples.
#[allow(clippy::len_without_is_empty)]
impl Batch {
    /// Build a labelled batch of exactly `size` entries, repeating
    /// the last sample if fewer were supplied.
    pub fn labelled(samples: Vec<(WordImage, String)>, size: usize) -> Result<Self> {
        let (images, texts): (Vec<_>, Vec<_>) = samples.into_iter().unzip();
        let real_len = images.len();
        Ok(Self {
            images:       pad_to(images, size)?,
            ground_truth: Some(pad_to(texts, size)?),
            real_len,
        })
    }

    /// Build an unlabelled batch of exactly `size` entries.
    pub fn unlabelled(images: Vec<WordImage>, size: usize) -> Result<Self> {
        let real_len = images.len();
        Ok(Self {
            images: pad_to(images, size)?,
            ground_truth: None,
            real_len,
        })
    }

    pub fn images(&self) -> &[WordImage] {
        &self.images
    }

    pub fn ground_truth(&self) -> Option<&[String]> {
        self.ground_truth.as_deref()
    }

    /// Number of entries, padding included. Always the configured size.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Number of leading entries that are real samples.
    pub fn real_len(&self) -> usize {
        self.real_len
    }
}

fn pad_to<T: Clone>(mut items: Vec<T>, size: usize) -> Result<Vec<T>> {
    if size == 0 {
        return Err(PipelineError::invalid_config("batch size must be at least 1"));
    }
    if items.len() > size {
        return Err(PipelineError::data(format!(
            "{} samples do not fit in a batch of {}",
            items.len(), size
        )));
    }
    let last = items
        .last()
        .cloned()
        .ok_or_else(|| PipelineError::data("cannot build a batch from zero samples"))?;
    items.resize(size, last);
    Ok(items)
}

// ─── Charset ──────────────────────────────────────────────────────────────────
/// The sorted set of distinct characters the model can emit.
///
/// On disk it is the newline-free concatenation of the characters,
/// e.g. ` !"#&'()*+,-./0123456789:;?ABC...xyz`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charset {
    chars: Vec<char>,
}

impl Charset {
    /// Collect every distinct character used in `texts`.
    pub fn from_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let set: BTreeSet<char> = texts.into_iter().flat_map(str::chars).collect();
        Self { chars: set.into_iter().collect() }
    }

    /// Parse the on-disk form. Duplicates and order are normalised.
    pub fn parse(serialized: &str) -> Self {
        Self::from_texts([serialized])
    }

    pub fn serialize(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Class index of `c`, if the model knows it.
    pub fn index_of(&self, c: char) -> Option<usize> {
        self.chars.binary_search(&c).ok()
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    /// Map a label to class indices, failing on unknown characters.
    pub fn encode(&self, text: &str) -> Result<Vec<usize>> {
        text.chars()
            .map(|c| {
                self.index_of(c).ok_or_else(|| {
                    PipelineError::data(format!("character {c:?} in {text:?} is not in the charset"))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(value: f32) -> WordImage {
        WordImage::new(2, 1, vec![value, value]).unwrap()
    }

    #[test]
    fn test_labelled_batch_pads_with_last_sample() {
        let batch = Batch::labelled(
            vec![(image(0.0), "a".into()), (image(1.0), "b".into())],
            4,
        )
        .unwrap();

        assert_eq!(batch.len(), 4);
        assert_eq!(batch.real_len(), 2);
        assert_eq!(batch.ground_truth().unwrap(), ["a", "b", "b", "b"]);
        assert_eq!(batch.images()[3], image(1.0));
    }

    #[test]
    fn test_full_batch_is_not_padded() {
        let batch = Batch::unlabelled(vec![image(0.0), image(1.0)], 2).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.real_len(), 2);
        assert!(batch.ground_truth().is_none());
    }

    #[test]
    fn test_empty_and_oversized_batches_rejected() {
        assert!(Batch::unlabelled(Vec::new(), 3).is_err());
        assert!(Batch::unlabelled(vec![image(0.0); 4], 3).is_err());
        assert!(Batch::unlabelled(vec![image(0.0)], 0).is_err());
    }

    #[test]
    fn test_image_dimensions_checked() {
        assert!(WordImage::new(3, 2, vec![0.0; 5]).is_err());
    }

    #[test]
    fn test_charset_sorted_and_deduplicated() {
        let charset = Charset::from_texts(["cab", "bad", "A"]);
        assert_eq!(charset.serialize(), "Aabcd");
        assert_eq!(charset.index_of('c'), Some(3));
        assert_eq!(charset.index_of('z'), None);
    }

    #[test]
    fn test_charset_encode_rejects_unknown() {
        let charset = Charset::from_texts(["abc"]);
        assert_eq!(charset.encode("cab").unwrap(), vec![2, 0, 1]);
        assert!(charset.encode("cat").is_err());
    }
}
