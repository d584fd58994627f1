//! Tensor reshuffling of flat state vectors: products, factoring and axis permutations.

use itertools::iproduct;
use num_complex::Complex64;
use quantum_core::linalg::{allclose_up_to_global_phase, are_valid_axes, norm_squared, transpose, Tolerance};

use crate::error::{Error, Result};

/// Tensor product of two states, the axes of `left` come first.
#[must_use]
pub fn state_vector_kronecker_product(left: &[Complex64], right: &[Complex64]) -> Vec<Complex64> {
    iproduct!(left, right).map(|(a, b)| a * b).collect()
}

/// Moves `axes` to the front in the given order, the other axes follow in their original order.
fn front_order(axes: &[usize], rank: usize) -> Vec<usize> {
    let mut order = axes.to_vec();
    order.extend((0..rank).filter(|axis| !axes.contains(axis)));
    order
}

fn normalized(mut amplitudes: Vec<Complex64>) -> Vec<Complex64> {
    let norm = norm_squared(&amplitudes).sqrt();
    if norm > 0.0 {
        for amplitude in &mut amplitudes {
            *amplitude /= norm;
        }
    }
    amplitudes
}

/// Extracted and remainder parts of a factored state, each as `(amplitudes, qid_shape)`.
pub type Factors = ((Vec<Complex64>, Vec<usize>), (Vec<Complex64>, Vec<usize>));

/// Splits a product state into the state on `axes`, in that order, and the state on the remaining axes.
///
/// Both parts are cut through the largest amplitude and normalized. Without validation the result of factoring
/// an entangled state is meaningless.
///
/// # Errors
/// Returns [`Error::InvalidAxes`] for repeated or out of range axes and, when `validate` is set,
/// [`Error::NotSeparable`] if the product of the parts differs from the state by more than `atol`.
pub fn factor_state_vector(
    state: &[Complex64],
    qid_shape: &[usize],
    axes: &[usize],
    validate: bool,
    atol: f64,
) -> Result<Factors> {
    if !are_valid_axes(axes, qid_shape.len()) {
        return Err(Error::InvalidAxes {
            axes: axes.to_vec(),
            rank: qid_shape.len(),
        });
    }
    let (moved, moved_shape) =
        transpose(state, qid_shape, &front_order(axes, qid_shape.len())).ok_or_else(|| shape_mismatch(state, qid_shape))?;
    let (extracted_shape, remainder_shape) = moved_shape.split_at(axes.len());
    let remainder_size: usize = remainder_shape.iter().product();

    let pivot = moved
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.norm().total_cmp(&b.norm()))
        .map_or(0, |(index, _)| index);
    let (pivot_extracted, pivot_remainder) = (pivot / remainder_size, pivot % remainder_size);

    let extracted = normalized(
        moved
            .iter()
            .skip(pivot_remainder)
            .step_by(remainder_size)
            .copied()
            .collect(),
    );
    let start = pivot_extracted * remainder_size;
    let remainder = normalized(moved[start..start + remainder_size].to_vec());

    if validate {
        let product = state_vector_kronecker_product(&extracted, &remainder);
        if !allclose_up_to_global_phase(&product, &moved, Tolerance::with_atol(atol)) {
            return Err(Error::NotSeparable);
        }
    }
    Ok((
        (extracted, extracted_shape.to_vec()),
        (remainder, remainder_shape.to_vec()),
    ))
}

/// Permutes the axes of a state so that new axis `k` is old axis `axes[k]`.
///
/// # Errors
/// Returns [`Error::InvalidAxes`] unless `axes` is a permutation of all axes.
pub fn transpose_state_vector_to_axis_order(
    state: &[Complex64],
    qid_shape: &[usize],
    axes: &[usize],
) -> Result<(Vec<Complex64>, Vec<usize>)> {
    if axes.len() != qid_shape.len() || !are_valid_axes(axes, qid_shape.len()) {
        return Err(Error::InvalidAxes {
            axes: axes.to_vec(),
            rank: qid_shape.len(),
        });
    }
    transpose(state, qid_shape, axes).ok_or_else(|| shape_mismatch(state, qid_shape))
}

fn shape_mismatch(state: &[Complex64], qid_shape: &[usize]) -> Error {
    Error::ShapeMismatch {
        qid_shape: qid_shape.to_vec(),
        expected: qid_shape.iter().product(),
        actual: state.len(),
    }
}
