// ============================================================
// Layer 3 — Positioned Fragments
// ============================================================
// A word segmenter writes one image per word. The only record
// of where a word sat on the line is the image's filename, so
// each recognized word travels with that filename as its
// ordering key.
//
//   ("2.png", "cat")  ("1.png", "the")  ("3.png", "sat")
//
// The key carries no meaning beyond comparison.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionedFragment {
    /// Filename of the word image, e.g. "3.png"
    pub key: String,

    /// Text recognized in that image
    pub text: String,
}

impl PositionedFragment {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self { key: key.into(), text: text.into() }
    }
}

/// How ordering keys are compared when rebuilding a sentence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderingPolicy {
    /// Plain string comparison. "10.png" sorts before "2.png",
    /// so segmenters must zero-pad their filenames.
    #[default]
    Lexical,

    /// Compare the leading digits of the file stem as a number.
    /// Keys without leading digits sort after numbered keys,
    /// lexically among themselves.
    Numeric,
}

impl OrderingPolicy {
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            OrderingPolicy::Lexical => a.cmp(b),
            OrderingPolicy::Numeric => match (leading_number(a), leading_number(b)) {
                (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
                (Some(_), None)    => Ordering::Less,
                (None, Some(_))    => Ordering::Greater,
                (None, None)       => a.cmp(b),
            },
        }
    }
}

/// Leading decimal digits of `key`, if any.
pub fn leading_number(key: &str) -> Option<u64> {
    let end = key
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(key.len(), |(i, _)| i);
    key[..end].parse().ok()
}
