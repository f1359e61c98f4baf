// ============================================================
// Layer 5b — Sentence Assembler
// ============================================================
// Rebuilds a line of text from words recognized out of order.
//
//   ("2.png", "cat")            ("1.png", "the")
//   ("1.png", "the")   sort     ("2.png", "cat")    join
//   ("3.png", "sat")  ──────►   ("3.png", "sat")  ──────►  " the cat sat"
//
// Each word is preceded by one space, so the sentence starts
// with a space. Downstream tools already expect that form.
//
// The sort is stable: fragments with equal keys keep the order
// they were recognized in.

use crate::domain::fragment::{leading_number, OrderingPolicy, PositionedFragment};

#[derive(Debug, Clone, Copy, Default)]
pub struct SentenceAssembler {
    policy: OrderingPolicy,
}

impl SentenceAssembler {
    pub fn new(policy: OrderingPolicy) -> Self {
        Self { policy }
    }

    /// Order fragments by key and join their texts into one sentence.
    pub fn assemble(&self, mut fragments: Vec<PositionedFragment>) -> String {
        if self.policy == OrderingPolicy::Lexical && has_unpadded_numbers(&fragments) {
            tracing::warn!(
                "Word image names have numbers of different lengths; lexical ordering \
                 will put e.g. '10.png' before '2.png'. Zero-pad the names or use numeric ordering."
            );
        }

        fragments.sort_by(|a, b| self.policy.compare(&a.key, &b.key));

        fragments.iter().fold(String::new(), |mut sentence, f| {
            sentence.push(' ');
            sentence.push_str(&f.text);
            sentence
        })
    }
}

/// True when numbered keys disagree on how many digits they start with.
fn has_unpadded_numbers(fragments: &[PositionedFragment]) -> bool {
    let mut widths = fragments
        .iter()
        .filter(|f| leading_number(&f.key).is_some())
        .map(|f| f.key.chars().take_while(char::is_ascii_digit).count());

    match widths.next() {
        Some(first) => widths.any(|w| w != first),
        None        => false,
    }
}
