//! Dense complex linear algebra on row-major tensors.
//!
//! A state tensor over qudits with dimensions `shape` is stored flat, with the first qudit as the most
//! significant digit of the index. Matrices acting on a subset of axes use the same big-endian convention over
//! the listed axes.

use ndarray::{Array2, ArrayViewD, IxDyn};
use num_complex::Complex64;

use crate::PauliMatrix;

pub type Matrix = Array2<Complex64>;

/// Closeness thresholds used when comparing floating point amplitudes: `|a - b| <= atol + rtol * |b|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance { rtol: 1e-5, atol: 1e-8 }
    }
}

impl Tolerance {
    #[must_use]
    pub fn with_atol(atol: f64) -> Self {
        Tolerance {
            atol,
            ..Tolerance::default()
        }
    }

    #[must_use]
    pub fn is_close(&self, a: Complex64, b: Complex64) -> bool {
        (a - b).norm() <= self.atol + self.rtol * b.norm()
    }

    #[must_use]
    pub fn is_close_real(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.atol + self.rtol * b.abs()
    }
}

#[must_use]
pub fn identity(dimension: usize) -> Matrix {
    Array2::from_shape_fn((dimension, dimension), |(row, col)| {
        if row == col {
            Complex64::new(1.0, 0.0)
        } else {
            Complex64::new(0.0, 0.0)
        }
    })
}

#[must_use]
pub fn pauli_matrix(pauli: PauliMatrix) -> Matrix {
    let zero = Complex64::new(0.0, 0.0);
    let one = Complex64::new(1.0, 0.0);
    let i = Complex64::new(0.0, 1.0);
    let entries = match pauli {
        PauliMatrix::I => [one, zero, zero, one],
        PauliMatrix::X => [zero, one, one, zero],
        PauliMatrix::Y => [zero, -i, i, zero],
        PauliMatrix::Z => [one, zero, zero, -one],
    };
    Array2::from_shape_fn((2, 2), |(row, col)| entries[2 * row + col])
}

/// Conjugate transpose.
#[must_use]
pub fn dagger(matrix: &Matrix) -> Matrix {
    matrix.t().mapv(|entry| entry.conj())
}

/// Kronecker product, the rows and columns of `left` are the most significant.
#[must_use]
pub fn kron(left: &Matrix, right: &Matrix) -> Matrix {
    let (left_rows, left_cols) = left.dim();
    let (right_rows, right_cols) = right.dim();
    Array2::from_shape_fn((left_rows * right_rows, left_cols * right_cols), |(row, col)| {
        left[[row / right_rows, col / right_cols]] * right[[row % right_rows, col % right_cols]]
    })
}

#[must_use]
pub fn allclose(left: &Matrix, right: &Matrix, tolerance: Tolerance) -> bool {
    left.dim() == right.dim() && left.iter().zip(right.iter()).all(|(a, b)| tolerance.is_close(*a, *b))
}

#[must_use]
pub fn is_unitary(matrix: &Matrix, tolerance: Tolerance) -> bool {
    let (rows, cols) = matrix.dim();
    rows == cols && allclose(&matrix.dot(&dagger(matrix)), &identity(rows), tolerance)
}

/// Compares two amplitude sequences after removing the phase of the entry where `right` is largest.
#[must_use]
pub fn allclose_up_to_global_phase(left: &[Complex64], right: &[Complex64], tolerance: Tolerance) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let pivot = right
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.norm().total_cmp(&b.norm()))
        .map(|(index, _)| index);
    let Some(pivot) = pivot else {
        return true;
    };
    let dephase = |amplitude: Complex64| {
        if amplitude.norm() == 0.0 {
            Complex64::new(1.0, 0.0)
        } else {
            (amplitude / amplitude.norm()).conj()
        }
    };
    let left_phase = dephase(left[pivot]);
    let right_phase = dephase(right[pivot]);
    left.iter()
        .zip(right)
        .all(|(a, b)| tolerance.is_close(a * left_phase, b * right_phase))
}

#[must_use]
pub fn matrices_close_up_to_global_phase(left: &Matrix, right: &Matrix, tolerance: Tolerance) -> bool {
    if left.dim() != right.dim() {
        return false;
    }
    let left: Vec<Complex64> = left.iter().copied().collect();
    let right: Vec<Complex64> = right.iter().copied().collect();
    allclose_up_to_global_phase(&left, &right, tolerance)
}

#[must_use]
pub fn norm_squared(amplitudes: &[Complex64]) -> f64 {
    amplitudes.iter().map(Complex64::norm_sqr).sum()
}

/// Row-major strides for a tensor of the given shape.
#[must_use]
pub fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

/// Big-endian mixed radix digits of `index`.
#[must_use]
pub fn digits(mut index: usize, shape: &[usize]) -> Vec<usize> {
    let mut digits = vec![0; shape.len()];
    for (digit, &dimension) in digits.iter_mut().zip(shape).rev() {
        *digit = index % dimension;
        index /= dimension;
    }
    digits
}

#[must_use]
pub fn index_from_digits(digits: &[usize], shape: &[usize]) -> usize {
    digits
        .iter()
        .zip(shape)
        .fold(0, |index, (&digit, &dimension)| index * dimension + digit)
}

/// Writes `matrix` applied to the `axes` of `source` into `target`, leaving other axes untouched.
///
/// `matrix` must be square with side equal to the product of the dimensions of `axes`, `source` and `target` must
/// both hold `shape.iter().product()` amplitudes.
pub fn targeted_left_multiply(
    matrix: &Matrix,
    source: &[Complex64],
    shape: &[usize],
    axes: &[usize],
    target: &mut [Complex64],
) {
    let strides = strides(shape);
    let sub_shape: Vec<usize> = axes.iter().map(|&axis| shape[axis]).collect();
    let sub_size: usize = sub_shape.iter().product();
    let offsets: Vec<usize> = (0..sub_size)
        .map(|col| {
            digits(col, &sub_shape)
                .iter()
                .zip(axes)
                .map(|(digit, &axis)| digit * strides[axis])
                .sum()
        })
        .collect();
    for (index, amplitude) in target.iter_mut().enumerate() {
        let mut row = 0;
        let mut base = index;
        for (&axis, &dimension) in axes.iter().zip(&sub_shape) {
            let digit = (index / strides[axis]) % dimension;
            row = row * dimension + digit;
            base -= digit * strides[axis];
        }
        *amplitude = offsets
            .iter()
            .enumerate()
            .map(|(col, offset)| matrix[[row, col]] * source[base + offset])
            .sum();
    }
}

/// Permutes tensor axes so that new axis `k` is old axis `order[k]`. Returns the data and the new shape.
///
/// Returns `None` unless `data` holds one amplitude per entry of `shape` and `order` is a permutation of its axes.
#[must_use]
pub fn transpose(data: &[Complex64], shape: &[usize], order: &[usize]) -> Option<(Vec<Complex64>, Vec<usize>)> {
    if order.len() != shape.len() || !are_valid_axes(order, shape.len()) {
        return None;
    }
    let tensor = ArrayViewD::from_shape(IxDyn(shape), data).ok()?;
    let permuted = tensor.permuted_axes(IxDyn(order));
    Some((permuted.iter().copied().collect(), permuted.shape().to_vec()))
}

/// Returns true when `axes` lists distinct axes below `rank`.
#[must_use]
pub fn are_valid_axes(axes: &[usize], rank: usize) -> bool {
    let mut seen = vec![false; rank];
    for &axis in axes {
        if axis >= rank || seen[axis] {
            return false;
        }
        seen[axis] = true;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn digits_are_big_endian() {
        assert_eq!(digits(5, &[2, 2, 2]), vec![1, 0, 1]);
        assert_eq!(digits(7, &[3, 4]), vec![1, 3]);
        assert_eq!(index_from_digits(&[1, 3], &[3, 4]), 7);
        assert_eq!(strides(&[3, 4, 2]), vec![8, 2, 1]);
    }

    #[test]
    fn targeted_multiply_on_second_qubit() {
        // |00> with X on qubit 1 gives |01>
        let mut source = vec![c(0.0, 0.0); 4];
        source[0] = c(1.0, 0.0);
        let mut target = vec![c(0.0, 0.0); 4];
        targeted_left_multiply(&pauli_matrix(PauliMatrix::X), &source, &[2, 2], &[1], &mut target);
        assert_eq!(target[1], c(1.0, 0.0));
        assert_eq!(norm_squared(&target), 1.0);
    }

    #[test]
    fn global_phase_is_ignored() {
        let a = vec![c(1.0, 0.0), c(0.0, 1.0)];
        let b: Vec<Complex64> = a.iter().map(|amp| amp * c(0.0, 1.0)).collect();
        assert!(allclose_up_to_global_phase(&a, &b, Tolerance::default()));
        let d = vec![c(1.0, 0.0), c(0.0, -1.0)];
        assert!(!allclose_up_to_global_phase(&a, &d, Tolerance::default()));
    }

    #[test]
    fn paulis_are_unitary() {
        for pauli in [PauliMatrix::I, PauliMatrix::X, PauliMatrix::Y, PauliMatrix::Z] {
            assert!(is_unitary(&pauli_matrix(pauli), Tolerance::default()));
        }
        let doubled = pauli_matrix(PauliMatrix::X) * c(2.0, 0.0);
        assert!(!is_unitary(&doubled, Tolerance::default()));
    }

    #[test]
    fn transpose_swaps_axes() {
        let data: Vec<Complex64> = (0..6).map(|value| c(f64::from(value), 0.0)).collect();
        let (transposed, shape) = transpose(&data, &[2, 3], &[1, 0]).unwrap();
        assert_eq!(shape, vec![3, 2]);
        let expected: Vec<Complex64> = [0, 3, 1, 4, 2, 5].iter().map(|&value| c(f64::from(value), 0.0)).collect();
        assert_eq!(transposed, expected);
        assert_eq!(transpose(&data, &[2, 2], &[1, 0]), None);
        assert_eq!(transpose(&data, &[2, 3], &[0, 0]), None);
    }
}
