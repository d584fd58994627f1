//! Frequency checks for sampled measurement records.

use quantum_core::linalg::{digits, index_from_digits};

/// Relative tolerance for runs of at least 100K records.
pub const TOLERANCE_HIGH_SAMPLES: f64 = 0.05;

/// Relative tolerance for shorter runs.
pub const TOLERANCE_LOW_SAMPLES: f64 = 0.10;

/// Number of records for each outcome over qudits of dimensions `shape`, indexed big-endian.
pub fn outcome_counts(records: &[Vec<usize>], shape: &[usize]) -> Vec<usize> {
    let mut counts = vec![0; shape.iter().product()];
    for record in records {
        counts[index_from_digits(record, shape)] += 1;
    }
    counts
}

/// Checks the observed frequency of every outcome against `expected`, outcome probabilities indexed like
/// [`outcome_counts`]. Outcomes expected with probability zero must never be observed.
///
/// # Panics
/// Panics naming the first outcome whose frequency is off by more than `relative_tolerance` of its probability.
#[allow(clippy::cast_precision_loss)]
pub fn assert_outcome_frequencies(records: &[Vec<usize>], shape: &[usize], expected: &[f64], relative_tolerance: f64) {
    let counts = outcome_counts(records, shape);
    assert_eq!(counts.len(), expected.len(), "one probability per outcome");
    for (outcome, (&count, &probability)) in counts.iter().zip(expected).enumerate() {
        let frequency = count as f64 / records.len() as f64;
        assert!(
            (frequency - probability).abs() <= probability * relative_tolerance,
            "outcome {:?} seen in {count} of {} records, expected probability {probability:.4}",
            digits(outcome, shape),
            records.len()
        );
    }
}

/// Wraps single-index results, such as the operator chosen by a mixture, as one-qudit records.
pub fn index_records(indices: impl IntoIterator<Item = Option<usize>>) -> Vec<Vec<usize>> {
    indices.into_iter().flatten().map(|index| vec![index]).collect()
}
