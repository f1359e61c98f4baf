use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One labelled word: where its image lives and what it says.
/// Images are decoded lazily, one batch at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordSample {
    pub image_path:   PathBuf,
    pub ground_truth: String,
}

impl WordSample {
    pub fn new(image_path: impl Into<PathBuf>, ground_truth: impl Into<String>) -> Self {
        Self { image_path: image_path.into(), ground_truth: ground_truth.into() }
    }
}

/// Shorten `text` until its CTC cost fits in `max_text_len` time steps.
///
/// CTC needs a blank between two identical neighbours, so "ll"
/// costs three steps, not two.
pub fn truncate_label(text: &str, max_text_len: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut cost = 0usize;
    for (i, c) in chars.iter().enumerate() {
        let repeat = i > 0 && chars[i - 1] == *c;
        cost += if repeat { 2 } else { 1 };
        if cost > max_text_len {
            return chars[..i].iter().collect();
        }
    }
    text.to_string()
}
