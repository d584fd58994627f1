use std::f64::consts::PI;
use std::fmt;

use num_complex::Complex64;
use quantum_core::linalg::{identity, Matrix};
use quantum_core::Axis;

use crate::gate::Gate;
use crate::gates::PauliPowGate;

/// Single qubit gate `Z^z·Z^a·X^x·Z^-a`, any single qubit unitary up to global phase has this form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhasedXZGate {
    pub x_exponent: f64,
    pub z_exponent: f64,
    pub axis_phase_exponent: f64,
}

fn phase_matrix(angle: f64) -> Matrix {
    let mut res = identity(2);
    res[[1, 1]] = Complex64::from_polar(1.0, angle);
    res
}

fn rotation_matrix(angle: f64) -> Matrix {
    let (s, c) = angle.sin_cos();
    let mut res = identity(2);
    res[[0, 0]] = Complex64::new(c, 0.0);
    res[[0, 1]] = Complex64::new(-s, 0.0);
    res[[1, 0]] = Complex64::new(s, 0.0);
    res[[1, 1]] = Complex64::new(c, 0.0);
    res
}

/// Splits a 2×2 unitary into `(pre_phase, rotation, post_phase)` with
/// `U ~ phase(post)·rotation(rotation / 2)·phase(pre)` up to global phase.
fn deconstruct_into_angles(matrix: &Matrix) -> (f64, f64, f64) {
    let right_phase = (matrix[[0, 1]] * matrix[[0, 0]].conj()).arg() + PI;
    let matrix = matrix.dot(&phase_matrix(-right_phase));

    let bottom_phase = (matrix[[1, 0]] * matrix[[0, 0]].conj()).arg();
    let matrix = phase_matrix(-bottom_phase).dot(&matrix);

    let rotation = matrix[[1, 0]].norm().atan2(matrix[[0, 0]].norm());
    let matrix = rotation_matrix(-rotation).dot(&matrix);

    let diagonal_phase = (matrix[[1, 1]] * matrix[[0, 0]].conj()).arg();
    (right_phase + diagonal_phase, rotation * 2.0, bottom_phase)
}

impl PhasedXZGate {
    #[must_use]
    pub fn new(x_exponent: f64, z_exponent: f64, axis_phase_exponent: f64) -> Self {
        PhasedXZGate {
            x_exponent,
            z_exponent,
            axis_phase_exponent,
        }
    }

    /// Gate equal to the 2×2 unitary `matrix` up to global phase.
    #[must_use]
    pub fn from_matrix(matrix: &Matrix) -> Self {
        let (pre_phase, rotation, post_phase) = deconstruct_into_angles(matrix);
        let pre_phase = pre_phase / PI - 0.5;
        let post_phase = post_phase / PI + 0.5;
        PhasedXZGate {
            x_exponent: rotation / PI,
            z_exponent: post_phase + pre_phase,
            axis_phase_exponent: -pre_phase,
        }
    }

    #[must_use]
    pub fn matrix(&self) -> Matrix {
        let pre = PauliPowGate::new(Axis::Z, -self.axis_phase_exponent).matrix();
        let mid = PauliPowGate::new(Axis::X, self.x_exponent).matrix();
        let post = PauliPowGate::new(Axis::Z, self.axis_phase_exponent + self.z_exponent).matrix();
        post.dot(&mid).dot(&pre)
    }
}

impl fmt::Display for PhasedXZGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PhXZ(a={},x={},z={})",
            self.axis_phase_exponent, self.x_exponent, self.z_exponent
        )
    }
}

impl Gate for PhasedXZGate {
    fn num_qubits(&self) -> usize {
        1
    }

    fn unitary(&self) -> Option<Matrix> {
        Some(self.matrix())
    }
}
