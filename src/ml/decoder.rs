// ============================================================
// Layer 5 — CTC Decoding
// ============================================================
// Turns per-time-step log-probabilities back into text.
//
//   BestPath   — take the most likely class at every step, merge
//                repeats, drop blanks. Fast, slightly less accurate.
//
//                a a ∅ b b ∅ ∅ b  →  a b b  →  "abb"
//
//   BeamSearch — CTC prefix beam search. Keeps the `width` most
//                probable prefixes, tracking for each the probability
//                of ending in a blank and in a non-blank so that
//                "aa" and "a∅a" are scored separately.
//
// Reference: Graves et al. (2006) §3.2
//            Hannun et al. (2014) First-Pass LVCSR with prefix search

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::batch::Charset;

const LOG_ZERO: f32 = f32::NEG_INFINITY;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecoderMode {
    #[default]
    BestPath,
    BeamSearch { width: usize },
}

impl DecoderMode {
    /// Decode one sample.
    ///
    /// `log_probs` is row-major [time, classes]; the blank is the
    /// last class, every other class indexes `charset`.
    pub fn decode(&self, log_probs: &[f32], classes: usize, charset: &Charset) -> String {
        let blank = classes - 1;
        let path = match *self {
            DecoderMode::BestPath            => best_path(log_probs, classes, blank),
            DecoderMode::BeamSearch { width } => beam_search(log_probs, classes, blank, width.max(1)),
        };
        path.into_iter().filter_map(|c| charset.char_at(c)).collect()
    }
}

fn best_path(log_probs: &[f32], classes: usize, blank: usize) -> Vec<usize> {
    let mut labels = Vec::new();
    let mut prev   = blank;

    for frame in log_probs.chunks(classes) {
        let best = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map_or(blank, |(i, _)| i);

        if best != blank && best != prev {
            labels.push(best);
        }
        prev = best;
    }
    labels
}

#[derive(Debug, Clone, Copy)]
struct BeamScore {
    blank:     f32,
    non_blank: f32,
}

impl BeamScore {
    const EMPTY: BeamScore = BeamScore { blank: LOG_ZERO, non_blank: LOG_ZERO };

    fn total(&self) -> f32 {
        log_add(self.blank, self.non_blank)
    }
}

fn beam_search(log_probs: &[f32], classes: usize, blank: usize, width: usize) -> Vec<usize> {
    let mut beams: HashMap<Vec<usize>, BeamScore> = HashMap::new();
    beams.insert(Vec::new(), BeamScore { blank: 0.0, non_blank: LOG_ZERO });

    for frame in log_probs.chunks(classes) {
        let mut next: HashMap<Vec<usize>, BeamScore> = HashMap::new();

        for (prefix, score) in &beams {
            let total = score.total();

            // Emit blank: prefix unchanged, now ends in blank
            let entry = next.entry(prefix.clone()).or_insert(BeamScore::EMPTY);
            entry.blank = log_add(entry.blank, total + frame[blank]);

            for (c, &p) in frame.iter().enumerate() {
                if c == blank {
                    continue;
                }
                let mut extended = prefix.clone();
                extended.push(c);

                if prefix.last() == Some(&c) {
                    // Repeat without a blank collapses into the same prefix
                    let same = next.entry(prefix.clone()).or_insert(BeamScore::EMPTY);
                    same.non_blank = log_add(same.non_blank, score.non_blank + p);

                    // A genuine double letter needs a blank in between
                    let ext = next.entry(extended).or_insert(BeamScore::EMPTY);
                    ext.non_blank = log_add(ext.non_blank, score.blank + p);
                } else {
                    let ext = next.entry(extended).or_insert(BeamScore::EMPTY);
                    ext.non_blank = log_add(ext.non_blank, total + p);
                }
            }
        }

        let mut ranked: Vec<(Vec<usize>, BeamScore)> = next.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total().total_cmp(&a.1.total()).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(width);
        beams = ranked.into_iter().collect();
    }

    beams
        .into_iter()
        .max_by(|a, b| a.1.total().total_cmp(&b.1.total()).then_with(|| b.0.cmp(&a.0)))
        .map(|(prefix, _)| prefix)
        .unwrap_or_default()
}

/// log(exp(a) + exp(b)) without leaving log space.
fn log_add(a: f32, b: f32) -> f32 {
    if a == LOG_ZERO {
        return b;
    }
    if b == LOG_ZERO {
        return a;
    }
    let m = a.max(b);
    m + ((a - m).exp() + (b - m).exp()).ln()
}
