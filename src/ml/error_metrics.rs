// ============================================================
// Layer 5 — Recognition Error Metrics
// ============================================================
// Two numbers summarise how well the recognizer reads words:
//
//   character error rate = Σ edit_distance(recognized, truth)
//                          ─────────────────────────────────
//                               Σ chars(truth)
//
//   word accuracy        = #(recognized == truth) / #words
//
// Edit distance is Levenshtein over Unicode scalar values:
// the minimum number of single-character insertions,
// deletions and substitutions. It is symmetric.
//
// Word matches are exact — no case folding, no trimming.
//
// Reference: strsim crate documentation

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, Result};

/// Minimum single-character edits turning `a` into `b`.
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Aggregate result of one validation sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Edit distance per ground-truth character, in [0, 1]
    pub char_error_rate:     f64,
    /// Same ratio before capping; can exceed 1 when recognitions
    /// run longer than their truth. Early stopping compares this.
    pub raw_char_error_rate: f64,
    /// Fraction of words recognized exactly, in [0, 1]
    pub word_accuracy:       f64,
    pub words:               usize,
    pub chars:               usize,
    pub char_errors:         usize,
}

/// Running totals over (recognized, truth) pairs.
#[derive(Debug, Clone, Default)]
pub struct ErrorMetrics {
    char_errors: usize,
    char_total:  usize,
    words_ok:    usize,
    words_total: usize,
}

impl ErrorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one pair and return its edit distance.
    pub fn add(&mut self, recognized: &str, truth: &str) -> usize {
        let dist = edit_distance(recognized, truth);
        self.char_errors += dist;
        self.char_total  += truth.chars().count();
        self.words_total += 1;
        if recognized == truth {
            self.words_ok += 1;
        }
        dist
    }

    /// Final rates.
    ///
    /// Fails with `EmptyValidationSet` when no ground-truth
    /// characters were seen. A recognition longer than its truth
    /// can push the raw ratio above 1; `char_error_rate` is capped
    /// at 1 while `raw_char_error_rate` keeps the uncapped ratio.
    pub fn report(&self) -> Result<ValidationReport> {
        if self.char_total == 0 {
            return Err(PipelineError::EmptyValidationSet);
        }
        let raw = self.char_errors as f64 / self.char_total as f64;
        Ok(ValidationReport {
            char_error_rate:     raw.min(1.0),
            raw_char_error_rate: raw,
            word_accuracy:       self.words_ok as f64 / self.words_total as f64,
            words:               self.words_total,
            chars:               self.char_total,
            char_errors:         self.char_errors,
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance_known_values() {
        assert_eq!(edit_distance("cat", "cart"), 1);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("über", "uber"), 1);
    }

    #[test]
    fn test_edit_distance_symmetric_and_zero_on_self() {
        let words = ["", "a", "cat", "cart", "Hello", "hello ", "straße"];
        for a in words {
            assert_eq!(edit_distance(a, a), 0);
            for b in words {
                assert_eq!(edit_distance(a, b), edit_distance(b, a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_rates_from_known_distances() {
        let mut m = ErrorMetrics::new();
        assert_eq!(m.add("cat", "cart"), 1);
        assert_eq!(m.add("dog", "dog"), 0);
        assert_eq!(m.add("Sun", "sun"), 1);

        let r = m.report().unwrap();
        assert_eq!((r.char_errors, r.chars, r.words), (2, 10, 3));
        assert!((r.char_error_rate - 0.2).abs() < 1e-12);
        assert!((r.word_accuracy - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_word_match_is_exact() {
        let mut m = ErrorMetrics::new();
        m.add("word ", "word");
        m.add("Word", "word");
        assert_eq!(m.report().unwrap().word_accuracy, 0.0);
    }

    #[test]
    fn test_rate_stays_in_unit_interval() {
        let mut m = ErrorMetrics::new();
        m.add("a very long hallucination", "a");
        let r = m.report().unwrap();
        assert!((0.0..=1.0).contains(&r.char_error_rate));
        assert!(r.char_errors > r.chars);
        assert_eq!(r.raw_char_error_rate, r.char_errors as f64 / r.chars as f64);
        assert!(r.raw_char_error_rate > 1.0);
    }

    #[test]
    fn test_empty_set_is_an_error() {
        assert!(matches!(
            ErrorMetrics::new().report(),
            Err(PipelineError::EmptyValidationSet)
        ));
        let mut m = ErrorMetrics::new();
        m.add("x", "");
        assert!(m.report().is_err());
    }
}
