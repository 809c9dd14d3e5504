//! In-place repairs of raw traces before reshaping.
//!
//! Every edit applies to all traces of a run so regions stay aligned.

use std::ops::Range;

use crate::error::{Error, Result};

/// Swaps each even sample with the odd sample after it.
///
/// Fixes a two-channel recording whose first frame came from the second
/// excitation source. A trailing unpaired sample is left in place.
pub fn swap_interleaved(traces: &mut [Vec<f64>]) {
    for trace in traces {
        for pair in trace.chunks_exact_mut(2) {
            pair.swap(0, 1);
        }
    }
}

/// Marks `span` as missing in every trace. The span is clamped to each trace.
pub fn wipe(traces: &mut [Vec<f64>], span: Range<usize>) {
    for trace in traces {
        let end = span.end.min(trace.len());
        let start = span.start.min(end);
        trace[start..end].fill(f64::NAN);
    }
}

/// Inserts `count` missing samples before `index` in every trace.
pub fn insert_missing(traces: &mut [Vec<f64>], index: usize, count: usize) -> Result<()> {
    if let Some(trace) = traces.iter().find(|t| index > t.len()) {
        return Err(Error::InvalidParameter {
            name: "index",
            reason: format!("{index} is past the end of a {}-sample trace", trace.len()),
        });
    }
    for trace in traces {
        trace.splice(index..index, std::iter::repeat_n(f64::NAN, count));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_exchanges_pairs() {
        let mut traces = vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0]];
        swap_interleaved(&mut traces);
        assert_eq!(traces[0], vec![2.0, 1.0, 4.0, 3.0]);
        assert_eq!(traces[1], vec![6.0, 5.0, 7.0]);
    }

    #[test]
    fn swap_twice_is_identity() {
        let original = vec![(0..10).map(f64::from).collect::<Vec<_>>()];
        let mut traces = original.clone();
        swap_interleaved(&mut traces);
        swap_interleaved(&mut traces);
        assert_eq!(traces, original);
    }

    #[test]
    fn wipe_marks_span_missing() {
        let mut traces = vec![vec![1.0; 6], vec![2.0; 3]];
        wipe(&mut traces, 2..5);
        let missing: Vec<bool> = traces[0].iter().map(|v| v.is_nan()).collect();
        assert_eq!(missing, vec![false, false, true, true, true, false]);
        assert!(!traces[1][1].is_nan());
        assert!(traces[1][2].is_nan());
    }

    #[test]
    fn wipe_past_end_is_noop() {
        let mut traces = vec![vec![1.0; 3]];
        wipe(&mut traces, 10..20);
        assert_eq!(traces[0], vec![1.0; 3]);
    }

    #[test]
    fn insert_shifts_samples() {
        let mut traces = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        insert_missing(&mut traces, 1, 2).unwrap();
        for trace in &traces {
            assert_eq!(trace.len(), 5);
            assert!(trace[1].is_nan() && trace[2].is_nan());
        }
        assert_eq!(traces[1][3..], [5.0, 6.0]);
    }

    #[test]
    fn insert_past_end_is_error() {
        let mut traces = vec![vec![1.0; 3]];
        assert!(insert_missing(&mut traces, 4, 1).is_err());
        assert!(insert_missing(&mut traces, 3, 1).is_ok());
        assert!(traces[0][3].is_nan());
    }
}
