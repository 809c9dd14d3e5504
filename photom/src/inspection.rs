//! Quality checks on raw traces of one run.
//!
//! With alternating excitation every sample above the trace mean should be
//! followed by one below it. Even samples are expected below the mean and odd
//! samples above it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionConfig {
    /// Accepted trace lengths; empty accepts any length.
    pub expected_lengths: Vec<usize>,
    /// Traces with a lower mean are too dim to judge.
    pub min_signal: f64,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            expected_lengths: Vec::new(),
            min_signal: 150.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceIssue {
    UnexpectedLength { trace: usize, length: usize },
    /// Consecutive valid samples on the same side of the mean; `indices` are
    /// the positions of the first sample of each such pair.
    SwitchDiscontinuity { trace: usize, indices: Vec<usize> },
    ThresholdingError { trace: usize },
    InconsistentLengths,
    LowSignal,
}

/// Inspects the raw traces of one run, background first.
pub fn inspect_traces(traces: &[Vec<f64>], config: &InspectionConfig) -> Vec<TraceIssue> {
    let mut issues = Vec::new();
    let mut means = Vec::with_capacity(traces.len());

    for (index, trace) in traces.iter().enumerate() {
        if !config.expected_lengths.is_empty() && !config.expected_lengths.contains(&trace.len()) {
            issues.push(TraceIssue::UnexpectedLength {
                trace: index,
                length: trace.len(),
            });
        }

        let mean = nan_mean(trace);
        means.push(mean);
        if mean.is_nan() || mean < config.min_signal {
            continue;
        }

        // None for missing samples.
        let above: Vec<Option<bool>> = trace
            .iter()
            .map(|v| (!v.is_nan()).then(|| *v > mean))
            .collect();

        let indices: Vec<usize> = above
            .windows(2)
            .enumerate()
            .filter_map(|(i, w)| match (w[0], w[1]) {
                (Some(a), Some(b)) if a == b => Some(i),
                _ => None,
            })
            .collect();
        if !indices.is_empty() {
            issues.push(TraceIssue::SwitchDiscontinuity {
                trace: index,
                indices,
            });
        }

        let even_high = above.iter().step_by(2).any(|a| *a == Some(true));
        let odd_low = above.iter().skip(1).step_by(2).any(|a| *a == Some(false));
        if even_high || odd_low {
            issues.push(TraceIssue::ThresholdingError { trace: index });
        }
    }

    if !means.is_empty() && means.iter().all(|m| !(*m >= config.min_signal)) {
        issues.push(TraceIssue::LowSignal);
    }
    if traces.windows(2).any(|w| w[0].len() != w[1].len()) {
        issues.push(TraceIssue::InconsistentLengths);
    }

    if !issues.is_empty() {
        tracing::debug!(issue_count = issues.len(), "Trace inspection found issues");
    }
    issues
}

fn nan_mean(trace: &[f64]) -> f64 {
    let (sum, count) = trace
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 { f64::NAN } else { sum / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Alternating low/high samples around 300.
    fn healthy(len: usize) -> Vec<f64> {
        (0..len).map(|i| if i % 2 == 0 { 200.0 } else { 400.0 }).collect()
    }

    #[test]
    fn healthy_run_has_no_issues() {
        let traces = vec![healthy(8), healthy(8)];
        assert!(inspect_traces(&traces, &InspectionConfig::default()).is_empty());
    }

    #[test]
    fn flags_unexpected_length() {
        let config = InspectionConfig {
            expected_lengths: vec![12000, 18000],
            ..Default::default()
        };
        let issues = inspect_traces(&[healthy(8)], &config);
        assert_eq!(
            issues,
            vec![TraceIssue::UnexpectedLength {
                trace: 0,
                length: 8
            }]
        );
    }

    #[test]
    fn flags_switch_discontinuity_and_thresholding() {
        // a dropped frame shifts the phase after index 3
        let trace = vec![200.0, 400.0, 200.0, 400.0, 400.0, 200.0, 400.0, 200.0];
        let issues = inspect_traces(&[trace], &InspectionConfig::default());
        assert_eq!(
            issues,
            vec![
                TraceIssue::SwitchDiscontinuity {
                    trace: 0,
                    indices: vec![3]
                },
                TraceIssue::ThresholdingError { trace: 0 },
            ]
        );
    }

    #[test]
    fn missing_samples_are_ignored() {
        let mut trace = healthy(8);
        trace[3] = f64::NAN;
        trace[4] = f64::NAN;
        assert!(inspect_traces(&[trace], &InspectionConfig::default()).is_empty());
    }

    #[test]
    fn dim_traces_skip_phase_checks() {
        let dim = vec![10.0, 10.0, 30.0, 30.0];
        let issues = inspect_traces(&[dim, healthy(4)], &InspectionConfig::default());
        assert!(issues.is_empty());
    }

    #[test]
    fn all_dim_traces_are_low_signal() {
        let dim = vec![10.0, 20.0, 10.0, 20.0];
        let issues = inspect_traces(&[dim.clone(), dim], &InspectionConfig::default());
        assert_eq!(issues, vec![TraceIssue::LowSignal]);
    }

    #[test]
    fn flags_inconsistent_lengths() {
        let issues = inspect_traces(&[healthy(8), healthy(6)], &InspectionConfig::default());
        assert_eq!(issues, vec![TraceIssue::InconsistentLengths]);
    }
}
