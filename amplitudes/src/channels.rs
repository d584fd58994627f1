//! Common single-qubit noise channels and an explicit Kraus channel.
//!
//! Channels that are mixtures of unitaries expose both [`Gate::mixture`] and [`Gate::kraus`], so a simulator
//! can sample them without computing norms.

use std::fmt;

use ndarray::array;
use num_complex::Complex64;
use quantum_core::linalg::{allclose, dagger, identity, pauli_matrix, Matrix, Tolerance};
use quantum_core::PauliMatrix;
use tableaux::Gate;

use crate::error::{Error, Result};

fn check_probability(probability: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&probability) {
        Ok(probability)
    } else {
        Err(Error::InvalidProbability(probability))
    }
}

fn kraus_of_mixture(mixture: Vec<(f64, Matrix)>) -> Vec<Matrix> {
    mixture
        .into_iter()
        .map(|(probability, unitary)| unitary * Complex64::from(probability.sqrt()))
        .collect()
}

fn real(value: f64) -> Complex64 {
    Complex64::new(value, 0.0)
}

/// Applies X with probability `p`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitFlip {
    p: f64,
}

impl BitFlip {
    /// # Errors
    /// Returns [`Error::InvalidProbability`] unless `p` is in `[0, 1]`.
    pub fn new(p: f64) -> Result<Self> {
        Ok(BitFlip { p: check_probability(p)? })
    }
}

impl fmt::Display for BitFlip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bit_flip(p={})", self.p)
    }
}

impl Gate for BitFlip {
    fn num_qubits(&self) -> usize {
        1
    }

    fn mixture(&self) -> Option<Vec<(f64, Matrix)>> {
        Some(vec![(1.0 - self.p, identity(2)), (self.p, pauli_matrix(PauliMatrix::X))])
    }

    fn kraus(&self) -> Option<Vec<Matrix>> {
        self.mixture().map(kraus_of_mixture)
    }
}

/// Applies Z with probability `p`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseFlip {
    p: f64,
}

impl PhaseFlip {
    /// # Errors
    /// Returns [`Error::InvalidProbability`] unless `p` is in `[0, 1]`.
    pub fn new(p: f64) -> Result<Self> {
        Ok(PhaseFlip { p: check_probability(p)? })
    }
}

impl fmt::Display for PhaseFlip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "phase_flip(p={})", self.p)
    }
}

impl Gate for PhaseFlip {
    fn num_qubits(&self) -> usize {
        1
    }

    fn mixture(&self) -> Option<Vec<(f64, Matrix)>> {
        Some(vec![(1.0 - self.p, identity(2)), (self.p, pauli_matrix(PauliMatrix::Z))])
    }

    fn kraus(&self) -> Option<Vec<Matrix>> {
        self.mixture().map(kraus_of_mixture)
    }
}

/// Applies one of X, Y or Z, each with probability `p / 3`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Depolarizing {
    p: f64,
}

impl Depolarizing {
    /// # Errors
    /// Returns [`Error::InvalidProbability`] unless `p` is in `[0, 1]`.
    pub fn new(p: f64) -> Result<Self> {
        Ok(Depolarizing { p: check_probability(p)? })
    }
}

impl fmt::Display for Depolarizing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "depolarize(p={})", self.p)
    }
}

impl Gate for Depolarizing {
    fn num_qubits(&self) -> usize {
        1
    }

    fn mixture(&self) -> Option<Vec<(f64, Matrix)>> {
        let third = self.p / 3.0;
        Some(vec![
            (1.0 - self.p, identity(2)),
            (third, pauli_matrix(PauliMatrix::X)),
            (third, pauli_matrix(PauliMatrix::Y)),
            (third, pauli_matrix(PauliMatrix::Z)),
        ])
    }

    fn kraus(&self) -> Option<Vec<Matrix>> {
        self.mixture().map(kraus_of_mixture)
    }
}

/// Decay of `|1⟩` to `|0⟩` with probability `gamma`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplitudeDamping {
    gamma: f64,
}

impl AmplitudeDamping {
    /// # Errors
    /// Returns [`Error::InvalidProbability`] unless `gamma` is in `[0, 1]`.
    pub fn new(gamma: f64) -> Result<Self> {
        Ok(AmplitudeDamping {
            gamma: check_probability(gamma)?,
        })
    }
}

impl fmt::Display for AmplitudeDamping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "amplitude_damp(gamma={})", self.gamma)
    }
}

impl Gate for AmplitudeDamping {
    fn num_qubits(&self) -> usize {
        1
    }

    fn kraus(&self) -> Option<Vec<Matrix>> {
        let zero = real(0.0);
        Some(vec![
            array![[real(1.0), zero], [zero, real((1.0 - self.gamma).sqrt())]],
            array![[zero, real(self.gamma.sqrt())], [zero, zero]],
        ])
    }
}

/// Resets a qubit to `|0⟩`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reset;

impl fmt::Display for Reset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("reset")
    }
}

impl Gate for Reset {
    fn num_qubits(&self) -> usize {
        1
    }

    fn kraus(&self) -> Option<Vec<Matrix>> {
        let (zero, one) = (Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0));
        Some(vec![array![[one, zero], [zero, zero]], array![[zero, one], [zero, zero]]])
    }
}

/// Channel given by explicit Kraus operators.
///
/// With a key, the channel is a measurement and the index of the applied operator is recorded under the key.
#[derive(Debug, Clone, PartialEq)]
pub struct KrausChannel {
    operators: Vec<Matrix>,
    qid_shape: Vec<usize>,
    key: Option<String>,
}

impl KrausChannel {
    /// Channel on qudits of dimensions `qid_shape`.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] when an operator does not act on `qid_shape`, and
    /// [`Error::NotTracePreserving`] when the operators do not satisfy `Σ K†K = I`.
    pub fn new(operators: Vec<Matrix>, qid_shape: Vec<usize>) -> Result<Self> {
        let side: usize = qid_shape.iter().product();
        if let Some(operator) = operators.iter().find(|operator| operator.dim() != (side, side)) {
            return Err(Error::ShapeMismatch {
                qid_shape,
                expected: side * side,
                actual: operator.len(),
            });
        }
        let total = operators
            .iter()
            .fold(Matrix::zeros((side, side)), |total, operator| total + dagger(operator).dot(operator));
        if !allclose(&total, &identity(side), Tolerance::default()) {
            return Err(Error::NotTracePreserving(format!("{total}")));
        }
        Ok(KrausChannel {
            operators,
            qid_shape,
            key: None,
        })
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn operators(&self) -> &[Matrix] {
        &self.operators
    }
}

impl fmt::Display for KrausChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KrausChannel({} operators", self.operators.len())?;
        if let Some(key) = &self.key {
            write!(f, ", key='{key}'")?;
        }
        f.write_str(")")
    }
}

impl Gate for KrausChannel {
    fn num_qubits(&self) -> usize {
        self.qid_shape.len()
    }

    fn qid_shape(&self) -> Vec<usize> {
        self.qid_shape.clone()
    }

    fn kraus(&self) -> Option<Vec<Matrix>> {
        Some(self.operators.clone())
    }

    fn is_measurement(&self) -> bool {
        self.key.is_some()
    }

    fn measurement_key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}
