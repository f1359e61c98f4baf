// ============================================================
// Layer 5b — Spelling Correction
// ============================================================
// Two pieces:
//
//   FrequencyCorrector — a word-frequency language model.
//     Unknown words are replaced by the closest dictionary word
//     (Levenshtein, at most `max_distance` edits). Ties go to the
//     more frequent word, then to the lexically smaller one.
//
//   PostCorrector — loads the language model once per run and
//     applies it once to the assembled sentence. What happens
//     when the model file cannot be loaded is a policy:
//       Abort    → the run fails with LanguageModelLoad
//       Fallback → warn and pass sentences through unchanged
//
// Language model file, one entry per line:
//
//   the 23135851162        ← "word count" adds count
//   Call me Ishmael.       ← any other line adds 1 per token
//
// Tokens are lowercased and stripped of non-alphabetic edges.
//
// Reference: Norvig (2007) How to Write a Spelling Corrector

use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, Result};
use crate::domain::traits::Corrector;
use crate::ml::error_metrics::edit_distance;

pub const DEFAULT_MAX_DISTANCE: usize = 2;

// ─── FrequencyCorrector ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct FrequencyCorrector {
    frequencies:  HashMap<String, u64>,
    max_distance: usize,
}

impl FrequencyCorrector {
    /// Load a language model file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| PipelineError::LanguageModelLoad {
            path: path.to_path_buf(),
            source,
        })?;

        let corrector = Self::from_text(&text);
        tracing::info!(
            "Loaded language model '{}' with {} words",
            path.display(),
            corrector.vocabulary_size()
        );
        Ok(corrector)
    }

    /// Build the frequency table from language model text.
    pub fn from_text(text: &str) -> Self {
        let mut frequencies: HashMap<String, u64> = HashMap::new();

        for line in text.lines() {
            let tokens: Vec<&str> = line.split_whitespace().collect();

            // "word count" form
            if let [word, count] = tokens.as_slice() {
                if let (Some(word), Ok(count)) = (normalise(word), count.parse::<u64>()) {
                    *frequencies.entry(word).or_insert(0) += count;
                    continue;
                }
            }

            for word in tokens.iter().filter_map(|t| normalise(t)) {
                *frequencies.entry(word).or_insert(0) += 1;
            }
        }

        Self { frequencies, max_distance: DEFAULT_MAX_DISTANCE }
    }

    pub fn with_max_distance(mut self, max_distance: usize) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn vocabulary_size(&self) -> usize {
        self.frequencies.len()
    }

    pub fn frequency(&self, word: &str) -> u64 {
        self.frequencies.get(word).copied().unwrap_or(0)
    }

    /// Best replacement for a single lowercase word, or None if it
    /// is already known or nothing is close enough.
    fn suggest(&self, word: &str) -> Option<&str> {
        if self.frequencies.contains_key(word) {
            return None;
        }

        let len = word.chars().count();
        self.frequencies
            .iter()
            .filter(|(candidate, _)| candidate.chars().count().abs_diff(len) <= self.max_distance)
            .map(|(candidate, &freq)| (edit_distance(word, candidate), freq, candidate.as_str()))
            .filter(|&(dist, _, _)| dist <= self.max_distance)
            .min_by(|a, b| {
                a.0.cmp(&b.0)
                    .then_with(|| b.1.cmp(&a.1))
                    .then_with(|| a.2.cmp(b.2))
            })
            .map(|(_, _, candidate)| candidate)
    }

    fn correct_word(&self, word: &str) -> Option<String> {
        let lower = word.to_lowercase();
        let best  = self.suggest(&lower)?;
        Some(CasePattern::of(word).apply(best))
    }
}

impl Corrector for FrequencyCorrector {
    /// Rewrite each word run, leaving everything between runs untouched.
    fn correct(&self, text: &str) -> String {
        let mut out  = String::with_capacity(text.len());
        let mut word = String::new();

        let flush = |word: &mut String, out: &mut String| {
            if word.is_empty() {
                return;
            }
            match self.correct_word(word) {
                Some(fixed) => out.push_str(&fixed),
                None        => out.push_str(word),
            }
            word.clear();
        };

        for c in text.chars() {
            if is_word_char(c) {
                word.push(c);
            } else {
                flush(&mut word, &mut out);
                out.push(c);
            }
        }
        flush(&mut word, &mut out);
        out
    }

    fn name(&self) -> &str {
        "word-frequency"
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphabetic() || c == '\''
}

/// Lowercase `token` and strip non-alphabetic characters from both ends.
fn normalise(token: &str) -> Option<String> {
    let trimmed = token.trim_matches(|c: char| !c.is_alphabetic());
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CasePattern {
    Lower,
    Capitalized,
    Upper,
}

impl CasePattern {
    fn of(word: &str) -> Self {
        let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
        match letters.as_slice() {
            [first, rest @ ..] if first.is_uppercase() => {
                if !rest.is_empty() && rest.iter().all(|c| c.is_uppercase()) {
                    CasePattern::Upper
                } else {
                    CasePattern::Capitalized
                }
            }
            _ => CasePattern::Lower,
        }
    }

    fn apply(self, word: &str) -> String {
        match self {
            CasePattern::Lower => word.to_string(),
            CasePattern::Upper => word.to_uppercase(),
            CasePattern::Capitalized => {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None        => String::new(),
                }
            }
        }
    }
}

// ─── PostCorrector ────────────────────────────────────────────────────────────

/// What to do when the language model cannot be loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectionFailurePolicy {
    /// Fail the run.
    Abort,
    /// Log a warning and emit uncorrected text.
    #[default]
    Fallback,
}

/// Applies a loaded corrector to whole sentences.
pub struct PostCorrector<C: Corrector> {
    corrector: Option<C>,
}

impl PostCorrector<FrequencyCorrector> {
    /// Load the language model at `path` once, honouring `policy` on failure.
    pub fn load(path: impl AsRef<Path>, policy: CorrectionFailurePolicy) -> Result<Self> {
        match FrequencyCorrector::load(path) {
            Ok(corrector) => Ok(Self::new(corrector)),
            Err(e) => match policy {
                CorrectionFailurePolicy::Abort => Err(e),
                CorrectionFailurePolicy::Fallback => {
                    tracing::warn!("{e}; sentences will not be corrected");
                    Ok(Self::disabled())
                }
            },
        }
    }

    /// Replace a word only when a dictionary word is at most
    /// `max_distance` edits away.
    pub fn with_max_distance(self, max_distance: usize) -> Self {
        Self { corrector: self.corrector.map(|c| c.with_max_distance(max_distance)) }
    }
}

impl<C: Corrector> PostCorrector<C> {
    pub fn new(corrector: C) -> Self {
        Self { corrector: Some(corrector) }
    }

    /// A post-corrector that passes text through unchanged.
    pub fn disabled() -> Self {
        Self { corrector: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.corrector.is_some()
    }

    pub fn inner(&self) -> Option<&C> {
        self.corrector.as_ref()
    }

    pub fn correct(&self, sentence: &str) -> String {
        match &self.corrector {
            Some(corrector) => {
                let corrected = corrector.correct(sentence);
                tracing::debug!("{} correction: {:?} -> {:?}", corrector.name(), sentence, corrected);
                corrected
            }
            None => sentence.to_string(),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn corrector() -> FrequencyCorrector {
        FrequencyCorrector::from_text("the 100\ncat 20\nsat 15\nset 15\nhat 30\n")
    }

    #[test]
    fn test_word_count_and_free_text_lines() {
        let c = FrequencyCorrector::from_text("the 5\nThe cat, the DOG.\n42 is\n");
        assert_eq!(c.frequency("the"), 7);
        assert_eq!(c.frequency("cat"), 1);
        assert_eq!(c.frequency("dog"), 1);
        assert_eq!(c.frequency("is"), 1);
        assert_eq!(c.frequency("42"), 0);
    }

    #[test]
    fn test_known_words_untouched() {
        assert_eq!(corrector().correct(" the cat sat"), " the cat sat");
    }

    #[test]
    fn test_nearest_word_replaces_unknown() {
        assert_eq!(corrector().correct(" teh cxt sat"), " the cat sat");
    }

    #[test]
    fn test_tie_broken_by_frequency() {
        // "cet" is one edit from "cat" (20) and "set" (15)
        assert_eq!(corrector().correct("cet"), "cat");
        // "sxt" is one edit from "sat" and "set", equal frequency → lexical
        assert_eq!(corrector().correct("sxt"), "sat");
    }

    #[test]
    fn test_too_far_left_alone() {
        assert_eq!(corrector().correct("zzzzzz"), "zzzzzz");
    }

    #[test]
    fn test_case_and_spacing_preserved() {
        let c = corrector();
        assert_eq!(c.correct("  Teh,  CXT!"), "  The,  CAT!");
        assert_eq!(c.correct("42 teh"), "42 the");
    }

    #[test]
    fn test_max_distance_limits_replacements() {
        // "teh" is two edits from "the"
        let strict = PostCorrector::new(corrector()).with_max_distance(1);
        assert_eq!(strict.correct(" teh cxt"), " teh cat");

        let loose = PostCorrector::new(corrector()).with_max_distance(2);
        assert_eq!(loose.correct(" teh cxt"), " the cat");

        assert!(!PostCorrector::disabled().with_max_distance(1).is_enabled());
    }

    #[test]
    fn test_missing_file_abort_vs_fallback() {
        let dir     = tempfile::tempdir().unwrap();
        let missing = dir.path().join("corpus.txt");

        let err = PostCorrector::load(&missing, CorrectionFailurePolicy::Abort).err().unwrap();
        assert!(matches!(err, PipelineError::LanguageModelLoad { .. }));

        let post = PostCorrector::load(&missing, CorrectionFailurePolicy::Fallback).unwrap();
        assert!(!post.is_enabled());
        assert_eq!(post.correct(" teh cat"), " teh cat");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "the 10").unwrap();
        writeln!(file, "cat 3").unwrap();

        let post = PostCorrector::load(file.path(), CorrectionFailurePolicy::Abort).unwrap();
        assert!(post.is_enabled());
        assert_eq!(post.correct(" teh cat"), " the cat");
    }
}
