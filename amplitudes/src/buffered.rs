//! Dense state vector with a scratch buffer of the same size.
//!
//! Every operation that rewrites the amplitudes computes into the buffer and then swaps the two vectors, so no
//! operation allocates once the state exists. The buffer holds stale data between calls and is never exposed.

use ndarray::{ArrayD, IxDyn};
use num_complex::Complex64;
use quantum_core::linalg::{are_valid_axes, digits, norm_squared, strides, targeted_left_multiply, Matrix, Tolerance};
use rand::Rng;
use tableaux::Gate;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::transformations::{factor_state_vector, state_vector_kronecker_product, transpose_state_vector_to_axis_order};

/// Absolute tolerance used for normalization checks and for validating factorizations.
pub const DEFAULT_ATOL: f64 = 1e-7;

#[derive(Debug, Clone)]
pub struct BufferedStateVector {
    state_vector: Vec<Complex64>,
    buffer: Vec<Complex64>,
    qid_shape: Vec<usize>,
}

/// Exact comparison of shapes and amplitudes, the buffers are ignored.
impl PartialEq for BufferedStateVector {
    fn eq(&self, other: &Self) -> bool {
        self.qid_shape == other.qid_shape && self.state_vector == other.state_vector
    }
}

impl BufferedStateVector {
    /// The all-zero basis state over qudits of the given dimensions.
    #[must_use]
    pub fn new(qid_shape: &[usize]) -> Self {
        let size = qid_shape.iter().product();
        let mut state_vector = vec![Complex64::new(0.0, 0.0); size];
        state_vector[0] = Complex64::new(1.0, 0.0);
        Self::with_state_vector(state_vector, qid_shape.to_vec())
    }

    /// The computational basis state with big-endian index `state`.
    ///
    /// # Errors
    /// Returns [`Error::BasisStateOutOfRange`] if `state` does not index an amplitude.
    pub fn from_basis_state(state: usize, qid_shape: &[usize]) -> Result<Self> {
        let size: usize = qid_shape.iter().product();
        if state >= size {
            return Err(Error::BasisStateOutOfRange {
                state,
                qid_shape: qid_shape.to_vec(),
            });
        }
        let mut state_vector = vec![Complex64::new(0.0, 0.0); size];
        state_vector[state] = Complex64::new(1.0, 0.0);
        Ok(Self::with_state_vector(state_vector, qid_shape.to_vec()))
    }

    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the number of amplitudes does not match `qid_shape`, and
    /// [`Error::NotNormalized`] if the squared norm is not one within [`DEFAULT_ATOL`].
    pub fn from_amplitudes(amplitudes: Vec<Complex64>, qid_shape: &[usize]) -> Result<Self> {
        let expected: usize = qid_shape.iter().product();
        if amplitudes.len() != expected {
            return Err(Error::ShapeMismatch {
                qid_shape: qid_shape.to_vec(),
                expected,
                actual: amplitudes.len(),
            });
        }
        let norm = norm_squared(&amplitudes);
        if !Tolerance::with_atol(DEFAULT_ATOL).is_close_real(norm, 1.0) {
            return Err(Error::NotNormalized(norm));
        }
        Ok(Self::with_state_vector(amplitudes, qid_shape.to_vec()))
    }

    /// State from a tensor with one axis per qudit.
    ///
    /// # Errors
    /// Returns [`Error::NotNormalized`] if the tensor is not a unit vector.
    pub fn from_array(tensor: &ArrayD<Complex64>) -> Result<Self> {
        Self::from_amplitudes(tensor.iter().copied().collect(), tensor.shape())
    }

    fn with_state_vector(state_vector: Vec<Complex64>, qid_shape: Vec<usize>) -> Self {
        let buffer = vec![Complex64::new(0.0, 0.0); state_vector.len()];
        BufferedStateVector {
            state_vector,
            buffer,
            qid_shape,
        }
    }

    /// Amplitudes in big-endian order over the qudits.
    pub fn state_vector(&self) -> &[Complex64] {
        &self.state_vector
    }

    pub fn qid_shape(&self) -> &[usize] {
        &self.qid_shape
    }

    pub fn num_qudits(&self) -> usize {
        self.qid_shape.len()
    }

    /// The amplitudes as a tensor with one axis per qudit.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] if the amplitudes do not fill the qid shape.
    pub fn to_array(&self) -> Result<ArrayD<Complex64>> {
        ArrayD::from_shape_vec(IxDyn(&self.qid_shape), self.state_vector.clone()).map_err(|_| Error::ShapeMismatch {
            qid_shape: self.qid_shape.clone(),
            expected: self.qid_shape.iter().product(),
            actual: self.state_vector.len(),
        })
    }

    /// Copy of the state. Without `deep_copy_buffers` the copy gets a fresh buffer, since buffer contents are
    /// always overwritten before they are read.
    #[must_use]
    pub fn copy(&self, deep_copy_buffers: bool) -> Self {
        if deep_copy_buffers {
            self.clone()
        } else {
            Self::with_state_vector(self.state_vector.clone(), self.qid_shape.clone())
        }
    }

    fn swap_in_buffer(&mut self) {
        std::mem::swap(&mut self.state_vector, &mut self.buffer);
    }

    fn check_axes(&self, axes: &[usize]) -> Result<()> {
        if are_valid_axes(axes, self.num_qudits()) {
            Ok(())
        } else {
            Err(Error::InvalidAxes {
                axes: axes.to_vec(),
                rank: self.num_qudits(),
            })
        }
    }

    fn subspace_size(&self, axes: &[usize]) -> usize {
        axes.iter().map(|&axis| self.qid_shape[axis]).product()
    }

    fn multiply_into_buffer(&mut self, matrix: &Matrix, axes: &[usize]) {
        targeted_left_multiply(matrix, &self.state_vector, &self.qid_shape, axes, &mut self.buffer);
    }

    fn fits(&self, matrix: &Matrix, axes: &[usize]) -> bool {
        let size = self.subspace_size(axes);
        matrix.dim() == (size, size)
    }

    /// Applies the unitary of `gate` to `axes`.
    ///
    /// Returns `false`, leaving the state untouched, when the gate has no unitary of the right size.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAxes`] for repeated or out of range axes.
    pub fn apply_unitary(&mut self, gate: &dyn Gate, axes: &[usize]) -> Result<bool> {
        self.check_axes(axes)?;
        let Some(unitary) = gate.unitary() else {
            return Ok(false);
        };
        if !self.fits(&unitary, axes) {
            debug!(%gate, ?axes, "unitary does not match the targeted qudits");
            return Ok(false);
        }
        self.multiply_into_buffer(&unitary, axes);
        self.swap_in_buffer();
        Ok(true)
    }

    /// Applies one unitary of the mixture of `gate`, chosen with the mixture's probabilities.
    ///
    /// Returns the index of the applied unitary, or `None` when the gate has no mixture.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAxes`] for repeated or out of range axes, and [`Error::ShapeMismatch`] when a
    /// unitary of the mixture does not match the targeted qudits.
    pub fn apply_mixture<R: Rng + ?Sized>(
        &mut self,
        gate: &dyn Gate,
        axes: &[usize],
        rng: &mut R,
    ) -> Result<Option<usize>> {
        self.check_axes(axes)?;
        let Some(mixture) = gate.mixture() else {
            return Ok(None);
        };
        let probabilities: Vec<f64> = mixture.iter().map(|(probability, _)| *probability).collect();
        let index = sample_index(&probabilities, rng.gen::<f64>());
        let Some((_, unitary)) = mixture.get(index) else {
            return Ok(None);
        };
        self.check_fits(unitary, axes)?;
        trace!(%gate, index, "mixture sampled");
        self.multiply_into_buffer(unitary, axes);
        self.swap_in_buffer();
        Ok(Some(index))
    }

    /// Applies one Kraus operator of the channel of `gate` and renormalizes.
    ///
    /// Operators are tried in order, each weighted by the squared norm of the state it produces, until their
    /// cumulative weight exceeds a uniform draw. Returns the index of the applied operator, or `None` when the
    /// gate has no channel.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAxes`] for repeated or out of range axes, and [`Error::ShapeMismatch`] when an
    /// operator does not match the targeted qudits.
    pub fn apply_channel<R: Rng + ?Sized>(
        &mut self,
        gate: &dyn Gate,
        axes: &[usize],
        rng: &mut R,
    ) -> Result<Option<usize>> {
        self.check_axes(axes)?;
        let Some(operators) = gate.kraus() else {
            return Ok(None);
        };
        if operators.is_empty() {
            return Ok(None);
        }
        for operator in &operators {
            self.check_fits(operator, axes)?;
        }

        let mut prepared = None;
        let selection = select_kraus_index(operators.len(), rng.gen::<f64>(), |index| {
            self.multiply_into_buffer(&operators[index], axes);
            prepared = Some(index);
            norm_squared(&self.buffer)
        });
        if selection.fell_back {
            warn!(%gate, index = selection.index, "channel draw not resolved, using the heaviest operator");
        }
        if prepared != Some(selection.index) {
            self.multiply_into_buffer(&operators[selection.index], axes);
        }
        let norm = selection.weight.sqrt();
        for amplitude in &mut self.buffer {
            *amplitude /= norm;
        }
        self.swap_in_buffer();
        trace!(%gate, index = selection.index, weight = selection.weight, "kraus operator applied");
        Ok(Some(selection.index))
    }

    fn check_fits(&self, matrix: &Matrix, axes: &[usize]) -> Result<()> {
        if self.fits(matrix, axes) {
            return Ok(());
        }
        let qid_shape: Vec<usize> = axes.iter().map(|&axis| self.qid_shape[axis]).collect();
        let expected = self.subspace_size(axes);
        Err(Error::ShapeMismatch {
            qid_shape,
            expected: expected * expected,
            actual: matrix.len(),
        })
    }

    /// Probability of each outcome of measuring `axes`, indexed big-endian over the measured qudits.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAxes`] for repeated or out of range axes.
    pub fn probabilities(&self, axes: &[usize]) -> Result<Vec<f64>> {
        self.check_axes(axes)?;
        let mut probabilities = vec![0.0; self.subspace_size(axes)];
        for (outcome, amplitude) in outcomes(&self.qid_shape, axes).zip(&self.state_vector) {
            probabilities[outcome] += amplitude.norm_sqr();
        }
        Ok(probabilities)
    }

    fn outcome_digits(&self, outcome: usize, axes: &[usize]) -> Vec<usize> {
        let shape: Vec<usize> = axes.iter().map(|&axis| self.qid_shape[axis]).collect();
        digits(outcome, &shape)
    }

    /// Measures `axes` in the computational basis, collapsing and renormalizing the state.
    ///
    /// Returns one digit per axis, in the order of `axes`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAxes`] for repeated or out of range axes.
    pub fn measure<R: Rng + ?Sized>(&mut self, axes: &[usize], rng: &mut R) -> Result<Vec<usize>> {
        let probabilities = self.probabilities(axes)?;
        let outcome = sample_index(&probabilities, rng.gen::<f64>());
        let norm = probabilities[outcome].sqrt();
        let candidates = outcomes(&self.qid_shape, axes);
        for ((target, &amplitude), candidate) in self.buffer.iter_mut().zip(&self.state_vector).zip(candidates) {
            *target = if candidate == outcome {
                amplitude / norm
            } else {
                Complex64::new(0.0, 0.0)
            };
        }
        self.swap_in_buffer();
        let result = self.outcome_digits(outcome, axes);
        debug!(?axes, ?result, "measured");
        Ok(result)
    }

    /// Draws `repetitions` independent measurement outcomes of `axes` without changing the state.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAxes`] for repeated or out of range axes.
    pub fn sample<R: Rng + ?Sized>(&self, axes: &[usize], repetitions: usize, rng: &mut R) -> Result<Vec<Vec<usize>>> {
        let probabilities = self.probabilities(axes)?;
        Ok((0..repetitions)
            .map(|_| self.outcome_digits(sample_index(&probabilities, rng.gen::<f64>()), axes))
            .collect())
    }

    /// Joint state with the qudits of `self` followed by those of `other`.
    #[must_use]
    pub fn kron(&self, other: &BufferedStateVector) -> BufferedStateVector {
        let state_vector = state_vector_kronecker_product(&self.state_vector, &other.state_vector);
        let qid_shape = self.qid_shape.iter().chain(&other.qid_shape).copied().collect();
        Self::with_state_vector(state_vector, qid_shape)
    }

    /// Splits the state into the qudits at `axes`, in that order, and the remaining qudits.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAxes`] for repeated or out of range axes, and [`Error::NotSeparable`] when
    /// `validate` is set and the parts do not reproduce the state within `atol`.
    pub fn factor(&self, axes: &[usize], validate: bool, atol: f64) -> Result<(BufferedStateVector, BufferedStateVector)> {
        let ((extracted, extracted_shape), (remainder, remainder_shape)) =
            factor_state_vector(&self.state_vector, &self.qid_shape, axes, validate, atol)?;
        Ok((
            Self::with_state_vector(extracted, extracted_shape),
            Self::with_state_vector(remainder, remainder_shape),
        ))
    }

    /// The same state with qudit `k` of the result being qudit `axes[k]` of `self`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidAxes`] unless `axes` is a permutation of all qudits.
    pub fn reindex(&self, axes: &[usize]) -> Result<BufferedStateVector> {
        let (state_vector, qid_shape) = transpose_state_vector_to_axis_order(&self.state_vector, &self.qid_shape, axes)?;
        Ok(Self::with_state_vector(state_vector, qid_shape))
    }
}

/// Measurement outcome on `axes` of every basis state, in amplitude order.
fn outcomes<'a>(qid_shape: &'a [usize], axes: &'a [usize]) -> impl Iterator<Item = usize> + 'a {
    let strides = strides(qid_shape);
    let size: usize = qid_shape.iter().product();
    (0..size).map(move |index| {
        axes.iter().fold(0, |outcome, &axis| {
            let dimension = qid_shape[axis];
            outcome * dimension + (index / strides[axis]) % dimension
        })
    })
}

/// Index whose cumulative probability first exceeds `draw`, in `[0, 1)`.
///
/// The last index with positive probability absorbs rounding errors when the probabilities sum to slightly
/// less than one.
pub(crate) fn sample_index(probabilities: &[f64], draw: f64) -> usize {
    let total: f64 = probabilities.iter().sum();
    let mut threshold = draw * total;
    let mut last_possible = 0;
    for (index, &probability) in probabilities.iter().enumerate() {
        if probability > 0.0 {
            last_possible = index;
        }
        threshold -= probability;
        if threshold < 0.0 {
            return index;
        }
    }
    last_possible
}

/// Outcome of choosing a Kraus operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KrausSelection {
    pub index: usize,
    /// Squared norm of the state produced by the chosen operator.
    pub weight: f64,
    /// Whether the draw was not resolved and the heaviest operator was chosen instead.
    pub fell_back: bool,
}

/// Chooses among `count` Kraus operators given a uniform `draw` in `[0, 1)`.
///
/// `weight_of` is evaluated for each index in order until the cumulative weight exceeds `draw`. If it never
/// does, or the crossing operator has weight exactly zero, the heaviest operator seen is chosen.
#[allow(clippy::float_cmp)]
pub fn select_kraus_index(count: usize, draw: f64, mut weight_of: impl FnMut(usize) -> f64) -> KrausSelection {
    let mut remaining = draw;
    let mut fallback = (0, 0.0);
    let mut selection = (0, 0.0);
    for index in 0..count {
        let weight = weight_of(index);
        if weight > fallback.1 {
            fallback = (index, weight);
        }
        selection = (index, weight);
        remaining -= weight;
        if remaining < 0.0 {
            break;
        }
    }
    if remaining >= 0.0 || selection.1 == 0.0 {
        return KrausSelection {
            index: fallback.0,
            weight: fallback.1,
            fell_back: true,
        };
    }
    KrausSelection {
        index: selection.0,
        weight: selection.1,
        fell_back: false,
    }
}
