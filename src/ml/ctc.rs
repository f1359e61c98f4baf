// ============================================================
// Layer 5 — CTC Loss
// ============================================================
// Connectionist Temporal Classification loss, computed with the
// forward (alpha) recursion in log space using plain tensor ops
// so autodiff can differentiate through it.
//
// For a label "ab" the extended sequence interleaves blanks:
//
//   s:    0  1  2  3  4
//   ext:  ∅  a  ∅  b  ∅
//
//   alpha[t][s] = logsumexp(alpha[t-1][s],
//                           alpha[t-1][s-1],
//                           alpha[t-1][s-2] if ext[s] ≠ ∅ and ext[s] ≠ ext[s-2])
//                 + log p_t(ext[s])
//
//   loss = -logsumexp(alpha[T-1][2L], alpha[T-1][2L-1])
//
// Labels of different lengths are padded with blanks; the final
// gather picks each sample's own last two states.
//
// Reference: Graves et al. (2006) §4.1

use burn::prelude::*;

/// Stand-in for log(0). Finite so that `x - max` never becomes NaN.
const LOG_ZERO: f32 = -1.0e4;

/// Mean CTC negative log-likelihood over the batch.
///
/// * `log_probs` - [batch, time, classes], already log-softmaxed
/// * `targets`   - one class-index sequence per batch entry
/// * `blank`     - class index of the blank
pub fn ctc_loss<B: Backend>(
    log_probs: Tensor<B, 3>,
    targets:   &[Vec<usize>],
    blank:     usize,
) -> Tensor<B, 1> {
    let [batch, time, classes] = log_probs.dims();
    let device = log_probs.device();

    let max_label = targets.iter().map(Vec::len).max().unwrap_or(0);
    let states    = 2 * max_label + 1;

    // ── Host-side tables ──────────────────────────────────────────────────────
    let mut ext      = vec![blank as i32; batch * states];
    let mut skip     = vec![LOG_ZERO; batch * states];
    let mut start    = vec![LOG_ZERO; batch * states];
    let mut ends     = vec![0i32; batch * 2];
    let mut end_mask = vec![0.0f32; batch * 2];

    for (b, labels) in targets.iter().enumerate().take(batch) {
        let row = b * states;
        for (i, &label) in labels.iter().enumerate() {
            let s = 2 * i + 1;
            ext[row + s] = label as i32;
            if i > 0 && labels[i - 1] != label {
                skip[row + s] = 0.0;
            }
        }

        start[row] = 0.0;
        if !labels.is_empty() {
            start[row + 1] = 0.0;
        }

        let last = 2 * labels.len();
        ends[b * 2]     = last as i32;
        ends[b * 2 + 1] = last.saturating_sub(1) as i32;
        if labels.is_empty() {
            // Only the single blank state can end an empty label
            end_mask[b * 2 + 1] = LOG_ZERO;
        }
    }

    let ext      = Tensor::<B, 1, Int>::from_ints(ext.as_slice(), &device).reshape([batch, states]);
    let skip     = Tensor::<B, 1>::from_floats(skip.as_slice(), &device).reshape([batch, states]);
    let start    = Tensor::<B, 1>::from_floats(start.as_slice(), &device).reshape([batch, states]);
    let ends     = Tensor::<B, 1, Int>::from_ints(ends.as_slice(), &device).reshape([batch, 2]);
    let end_mask = Tensor::<B, 1>::from_floats(end_mask.as_slice(), &device).reshape([batch, 2]);

    // ── Forward recursion ─────────────────────────────────────────────────────
    let emissions = |t: usize| {
        log_probs
            .clone()
            .slice([0..batch, t..t + 1, 0..classes])
            .reshape([batch, classes])
            .gather(1, ext.clone())
    };

    let mut alpha = emissions(0) + start;
    for t in 1..time {
        let stay  = alpha.clone();
        let step  = shift_right(alpha.clone(), 1);
        let jump  = shift_right(alpha, 2) + skip.clone();
        alpha = log_sum_exp3(stay, step, jump) + emissions(t);
    }

    // ── Read out each sample's final states ───────────────────────────────────
    let tail = alpha.gather(1, ends) + end_mask;
    let a = tail.clone().slice([0..batch, 0..1]);
    let b = tail.slice([0..batch, 1..2]);
    let m = a.clone().max_pair(b.clone());
    let log_likelihood = m.clone() + ((a - m.clone()).exp() + (b - m).exp()).log();

    log_likelihood.neg().mean()
}

/// Shift every row right by `n` states, filling with LOG_ZERO.
fn shift_right<B: Backend>(x: Tensor<B, 2>, n: usize) -> Tensor<B, 2> {
    let [batch, states] = x.dims();
    let device = x.device();
    if n >= states {
        return Tensor::full([batch, states], LOG_ZERO, &device);
    }
    Tensor::cat(
        vec![
            Tensor::full([batch, n], LOG_ZERO, &device),
            x.slice([0..batch, 0..states - n]),
        ],
        1,
    )
}

fn log_sum_exp3<B: Backend>(a: Tensor<B, 2>, b: Tensor<B, 2>, c: Tensor<B, 2>) -> Tensor<B, 2> {
    let m = a.clone().max_pair(b.clone()).max_pair(c.clone());
    let sum = (a - m.clone()).exp() + (b - m.clone()).exp() + (c - m.clone()).exp();
    m + sum.log()
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::ElementConversion;

    fn uniform(batch: usize, time: usize, classes: usize) -> Tensor<NdArray, 3> {
        let p = (1.0 / classes as f32).ln();
        Tensor::full([batch, time, classes], p, &Default::default())
    }

    #[test]
    fn test_single_step_uniform() {
        // One frame, two classes, label [0]: p = 0.5
        let loss = ctc_loss(uniform(1, 1, 2), &[vec![0]], 1);
        let value: f32 = loss.into_scalar().elem();
        assert!((value - std::f32::consts::LN_2).abs() < 1e-4);
    }

    #[test]
    fn test_two_steps_counts_all_paths() {
        // T=2, classes {a, ∅}, label "a": paths aa, a∅, ∅a → 3 × 0.25
        let loss  = ctc_loss(uniform(1, 2, 2), &[vec![0]], 1);
        let value: f32 = loss.into_scalar().elem();
        assert!((value - -(0.75f32).ln()).abs() < 1e-4);
    }

    #[test]
    fn test_mixed_label_lengths_average() {
        // Label "a" (3 paths) and empty label (only ∅∅): 0.75 and 0.25
        let loss  = ctc_loss(uniform(2, 2, 2), &[vec![0], vec![]], 1);
        let value: f32 = loss.into_scalar().elem();
        let expected = (-(0.75f32).ln() - (0.25f32).ln()) / 2.0;
        assert!((value - expected).abs() < 1e-4);
    }
}
