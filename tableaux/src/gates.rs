use std::f64::consts::PI;
use std::fmt;

use derive_more::{Display, FromStr};
use num_complex::Complex64;
use quantum_core::linalg::{dagger, identity, is_unitary, pauli_matrix, Matrix, Tolerance};
use quantum_core::{Axis, PauliMatrix, Qid};

use crate::act_on::SimulationState;
use crate::error::{Error, Result};
use crate::gate::{ActOnOutcome, Gate};
use crate::single_qubit::SingleQubitCliffordGate;
use crate::tableau::CliffordTableau;

#[macro_export]
macro_rules! assert_1q_gate {
    ($x: expr) => {
        debug_assert_eq!($x.len(), 1);
    };
}

#[macro_export]
macro_rules! assert_2q_gate {
    ($x: expr) => {
        debug_assert_eq!($x.len(), 2);
        debug_assert!($x[0] != $x[1]);
    };
}

/// Elementary Clifford unitaries with a direct tableau update.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Display, FromStr, PartialEq, Eq, Hash)]
pub enum UnitaryOp {
    I,
    X,
    Y,
    Z,
    SqrtX,
    SqrtXInv,
    SqrtY,
    SqrtYInv,
    SqrtZ,
    SqrtZInv,
    Hadamard,
    Swap,
    ControlledX,
    ControlledZ,
}

/// Elementary operations on qubit indices, in application order.
pub type Operations = Vec<(UnitaryOp, Vec<usize>)>;

impl UnitaryOp {
    #[must_use]
    pub fn inverse(self) -> UnitaryOp {
        use UnitaryOp::{SqrtX, SqrtXInv, SqrtY, SqrtYInv, SqrtZ, SqrtZInv};
        match self {
            SqrtX => SqrtXInv,
            SqrtXInv => SqrtX,
            SqrtY => SqrtYInv,
            SqrtYInv => SqrtY,
            SqrtZ => SqrtZInv,
            SqrtZInv => SqrtZ,
            other => other,
        }
    }

    /// Conjugates the rows of `tableau` by this gate on `support`.
    pub fn apply_to(self, tableau: &mut CliffordTableau, support: &[usize]) {
        use UnitaryOp::{
            ControlledX, ControlledZ, Hadamard, SqrtX, SqrtXInv, SqrtY, SqrtYInv, SqrtZ, SqrtZInv, Swap, I, X, Y, Z,
        };
        match self {
            I => {}
            X => {
                assert_1q_gate!(support);
                tableau.apply_x(support[0]);
            }
            Y => {
                assert_1q_gate!(support);
                tableau.apply_y(support[0]);
            }
            Z => {
                assert_1q_gate!(support);
                tableau.apply_z(support[0]);
            }
            SqrtX => {
                assert_1q_gate!(support);
                tableau.apply_h(support[0]);
                tableau.apply_s(support[0]);
                tableau.apply_h(support[0]);
            }
            SqrtXInv => {
                assert_1q_gate!(support);
                tableau.apply_h(support[0]);
                tableau.apply_s(support[0]);
                tableau.apply_z(support[0]);
                tableau.apply_h(support[0]);
            }
            SqrtY => {
                assert_1q_gate!(support);
                tableau.apply_h(support[0]);
                tableau.apply_x(support[0]);
            }
            SqrtYInv => {
                assert_1q_gate!(support);
                tableau.apply_x(support[0]);
                tableau.apply_h(support[0]);
            }
            SqrtZ => {
                assert_1q_gate!(support);
                tableau.apply_s(support[0]);
            }
            SqrtZInv => {
                assert_1q_gate!(support);
                tableau.apply_s(support[0]);
                tableau.apply_z(support[0]);
            }
            Hadamard => {
                assert_1q_gate!(support);
                tableau.apply_h(support[0]);
            }
            Swap => {
                assert_2q_gate!(support);
                tableau.apply_swap(support[0], support[1]);
            }
            ControlledX => {
                assert_2q_gate!(support);
                tableau.apply_cx(support[0], support[1]);
            }
            ControlledZ => {
                assert_2q_gate!(support);
                tableau.apply_cz(support[0], support[1]);
            }
        }
    }

    fn two_qubit_matrix(self) -> Matrix {
        let one = Complex64::new(1.0, 0.0);
        let mut res = identity(4);
        match self {
            UnitaryOp::Swap => {
                res[[1, 1]] = Complex64::new(0.0, 0.0);
                res[[2, 2]] = Complex64::new(0.0, 0.0);
                res[[1, 2]] = one;
                res[[2, 1]] = one;
            }
            UnitaryOp::ControlledX => {
                res[[2, 2]] = Complex64::new(0.0, 0.0);
                res[[3, 3]] = Complex64::new(0.0, 0.0);
                res[[2, 3]] = one;
                res[[3, 2]] = one;
            }
            _ => res[[3, 3]] = -one,
        }
        res
    }
}

impl Gate for UnitaryOp {
    fn num_qubits(&self) -> usize {
        match self {
            UnitaryOp::Swap | UnitaryOp::ControlledX | UnitaryOp::ControlledZ => 2,
            _ => 1,
        }
    }

    fn unitary(&self) -> Option<Matrix> {
        use UnitaryOp::{
            ControlledX, ControlledZ, Hadamard, SqrtX, SqrtXInv, SqrtY, SqrtYInv, SqrtZ, SqrtZInv, Swap, I, X, Y, Z,
        };
        let matrix = match self {
            I => pauli_matrix(PauliMatrix::I),
            X => pauli_matrix(PauliMatrix::X),
            Y => pauli_matrix(PauliMatrix::Y),
            Z => pauli_matrix(PauliMatrix::Z),
            SqrtX => PauliPowGate::x(0.5).matrix(),
            SqrtXInv => dagger(&PauliPowGate::x(0.5).matrix()),
            SqrtY => PauliPowGate::y(0.5).matrix(),
            SqrtYInv => dagger(&PauliPowGate::y(0.5).matrix()),
            SqrtZ => PauliPowGate::z(0.5).matrix(),
            SqrtZInv => dagger(&PauliPowGate::z(0.5).matrix()),
            Hadamard => (pauli_matrix(PauliMatrix::X) + pauli_matrix(PauliMatrix::Z)) * Complex64::new(0.5f64.sqrt(), 0.0),
            Swap | ControlledX | ControlledZ => self.two_qubit_matrix(),
        };
        Some(matrix)
    }

    fn clifford_tableau(&self) -> Option<CliffordTableau> {
        let num_qubits = self.num_qubits();
        let mut tableau = CliffordTableau::new(num_qubits);
        let support: Vec<usize> = (0..num_qubits).collect();
        self.apply_to(&mut tableau, &support);
        Some(tableau)
    }

    fn act_on(&self, state: &mut dyn SimulationState, qubits: &[Qid]) -> Result<ActOnOutcome> {
        let axes = state.axes_of(qubits)?;
        match state.tableau_mut() {
            Some(tableau) => {
                self.apply_to(tableau, &axes);
                Ok(ActOnOutcome::Applied)
            }
            None => Ok(ActOnOutcome::NotImplemented),
        }
    }
}

/// Rotation `P^t` about a Pauli axis, with the global phase convention making `P^1 = P`.
///
/// ```text
/// X^t = e^{iπt/2}·| cos(πt/2)    -i·sin(πt/2)|
///                 |-i·sin(πt/2)   cos(πt/2)  |
///
/// Z^t = |1    0     |
///       |0  e^{iπt} |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PauliPowGate {
    pub axis: Axis,
    pub exponent: f64,
}

impl PauliPowGate {
    #[must_use]
    pub fn new(axis: Axis, exponent: f64) -> Self {
        PauliPowGate { axis, exponent }
    }

    #[must_use]
    pub fn x(exponent: f64) -> Self {
        Self::new(Axis::X, exponent)
    }

    #[must_use]
    pub fn y(exponent: f64) -> Self {
        Self::new(Axis::Y, exponent)
    }

    #[must_use]
    pub fn z(exponent: f64) -> Self {
        Self::new(Axis::Z, exponent)
    }

    #[must_use]
    pub fn matrix(&self) -> Matrix {
        let half_angle = PI * self.exponent / 2.0;
        let global = Complex64::from_polar(1.0, half_angle);
        let c = Complex64::new(half_angle.cos(), 0.0);
        let s = Complex64::new(half_angle.sin(), 0.0);
        let i = Complex64::new(0.0, 1.0);
        let mut res = identity(2);
        match self.axis {
            Axis::X => {
                res[[0, 0]] = global * c;
                res[[0, 1]] = -global * i * s;
                res[[1, 0]] = -global * i * s;
                res[[1, 1]] = global * c;
            }
            Axis::Y => {
                res[[0, 0]] = global * c;
                res[[0, 1]] = -global * s;
                res[[1, 0]] = global * s;
                res[[1, 1]] = global * c;
            }
            Axis::Z => {
                res[[1, 1]] = Complex64::from_polar(1.0, PI * self.exponent);
            }
        }
        res
    }

    /// Number of quarter turns when the exponent is a multiple of one half.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn quarter_turns(&self) -> Option<i64> {
        let doubled = 2.0 * self.exponent;
        let rounded = doubled.round();
        ((doubled - rounded).abs() < 1e-12).then_some(rounded as i64)
    }
}

impl fmt::Display for PauliPowGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}**{}", self.axis, self.exponent)
    }
}

impl Gate for PauliPowGate {
    fn num_qubits(&self) -> usize {
        1
    }

    fn unitary(&self) -> Option<Matrix> {
        Some(self.matrix())
    }

    fn clifford_tableau(&self) -> Option<CliffordTableau> {
        let quarter_turns = self.quarter_turns()?;
        Some(
            SingleQubitCliffordGate::from_quarter_turns(self.axis, quarter_turns)
                .tableau()
                .clone(),
        )
    }
}

/// Gate given by an explicit unitary matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixGate {
    matrix: Matrix,
    qid_shape: Vec<usize>,
    name: Option<String>,
}

impl MatrixGate {
    /// Unitary on qubits, the side of `matrix` must be a power of two.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSpecification`] when the matrix is not a unitary on qubits.
    pub fn new(matrix: Matrix) -> Result<Self> {
        let side = matrix.nrows();
        if !side.is_power_of_two() {
            return Err(Error::InvalidSpecification(format!(
                "Matrix of side {side} does not act on a whole number of qubits"
            )));
        }
        let num_qubits = side.trailing_zeros() as usize;
        Self::with_qid_shape(matrix, vec![2; num_qubits])
    }

    /// Unitary on qudits of dimensions `qid_shape`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSpecification`] when the matrix is not unitary or does not match `qid_shape`.
    pub fn with_qid_shape(matrix: Matrix, qid_shape: Vec<usize>) -> Result<Self> {
        let side: usize = qid_shape.iter().product();
        if matrix.dim() != (side, side) {
            return Err(Error::InvalidSpecification(format!(
                "Matrix of shape {:?} does not act on qudits of shape {qid_shape:?}",
                matrix.dim()
            )));
        }
        if !is_unitary(&matrix, Tolerance::default()) {
            return Err(Error::InvalidSpecification("Matrix is not unitary".to_owned()));
        }
        Ok(MatrixGate {
            matrix,
            qid_shape,
            name: None,
        })
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }
}

impl fmt::Display for MatrixGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => f.write_str(name),
            None => write!(f, "MatrixGate({:?})", self.qid_shape),
        }
    }
}

impl Gate for MatrixGate {
    fn num_qubits(&self) -> usize {
        self.qid_shape.len()
    }

    fn qid_shape(&self) -> Vec<usize> {
        self.qid_shape.clone()
    }

    fn unitary(&self) -> Option<Matrix> {
        Some(self.matrix.clone())
    }

    fn clifford_tableau(&self) -> Option<CliffordTableau> {
        if self.qid_shape != [2] {
            return None;
        }
        SingleQubitCliffordGate::from_unitary(&self.matrix).map(|gate| gate.tableau().clone())
    }
}

/// Computational basis measurement of one or more qudits, recorded under `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementGate {
    key: String,
    qid_shape: Vec<usize>,
}

impl MeasurementGate {
    #[must_use]
    pub fn new(num_qubits: usize, key: impl Into<String>) -> Self {
        Self::with_qid_shape(vec![2; num_qubits], key)
    }

    #[must_use]
    pub fn with_qid_shape(qid_shape: Vec<usize>, key: impl Into<String>) -> Self {
        MeasurementGate {
            key: key.into(),
            qid_shape,
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for MeasurementGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M('{}')", self.key)
    }
}

impl Gate for MeasurementGate {
    fn num_qubits(&self) -> usize {
        self.qid_shape.len()
    }

    fn qid_shape(&self) -> Vec<usize> {
        self.qid_shape.clone()
    }

    fn is_measurement(&self) -> bool {
        true
    }

    fn measurement_key(&self) -> Option<&str> {
        Some(&self.key)
    }

    fn act_on(&self, state: &mut dyn SimulationState, qubits: &[Qid]) -> Result<ActOnOutcome> {
        let values = state.measure(qubits)?;
        state.record_measurement(&self.key, values);
        Ok(ActOnOutcome::Applied)
    }
}
