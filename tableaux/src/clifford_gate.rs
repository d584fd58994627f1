use std::fmt;
use std::sync::Arc;

use ndarray::aview1;
use num_complex::Complex64;
use quantum_core::linalg::{identity, targeted_left_multiply, Matrix};
use quantum_core::Qid;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::act_on::{act_on, act_on_clifford, SimulationState, TableauSimulationState};
use crate::error::{Error, Result};
use crate::gate::{ActOnOutcome, Gate, Operation};
use crate::gates::{Operations, UnitaryOp};
use crate::tableau::{CliffordTableau, TableauRecord};

/// Clifford gate on any number of qubits, stored as its stabilizer tableau.
///
/// Equality is tableau equality and ignores the global phase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CliffordGate {
    tableau: CliffordTableau,
}

impl CliffordGate {
    /// # Errors
    /// Returns [`Error::NotSymplectic`] if `tableau` does not describe a Clifford unitary.
    pub fn from_clifford_tableau(tableau: CliffordTableau) -> Result<Self> {
        if !tableau.is_valid() {
            return Err(Error::NotSymplectic);
        }
        Ok(CliffordGate { tableau })
    }

    /// The gate applying `operations` in order, qubit `qubit_order[i]` becoming qubit `i` of the gate.
    ///
    /// # Errors
    /// Returns [`Error::NoStabilizerEffect`] if some operation is not a Clifford, and [`Error::UnknownQubit`] if an
    /// operation acts outside `qubit_order`.
    pub fn from_op_list(operations: &[Operation], qubit_order: &[Qid]) -> Result<Self> {
        if !operations.iter().all(Operation::has_stabilizer_effect) {
            return Err(Error::NoStabilizerEffect);
        }
        let mut state = TableauSimulationState::new(qubit_order.to_vec(), SmallRng::seed_from_u64(0));
        for operation in operations {
            act_on(operation, &mut state, true)?;
        }
        Ok(CliffordGate {
            tableau: state.into_tableau(),
        })
    }

    #[must_use]
    pub fn identity(num_qubits: usize) -> Self {
        CliffordGate {
            tableau: CliffordTableau::new(num_qubits),
        }
    }

    #[must_use]
    pub fn x() -> Self {
        UnitaryOp::X.into()
    }

    #[must_use]
    pub fn y() -> Self {
        UnitaryOp::Y.into()
    }

    #[must_use]
    pub fn z() -> Self {
        UnitaryOp::Z.into()
    }

    #[must_use]
    pub fn h() -> Self {
        UnitaryOp::Hadamard.into()
    }

    #[must_use]
    pub fn s() -> Self {
        UnitaryOp::SqrtZ.into()
    }

    #[must_use]
    pub fn cnot() -> Self {
        UnitaryOp::ControlledX.into()
    }

    #[must_use]
    pub fn cz() -> Self {
        UnitaryOp::ControlledZ.into()
    }

    #[must_use]
    pub fn swap() -> Self {
        UnitaryOp::Swap.into()
    }

    #[must_use]
    pub fn tableau(&self) -> &CliffordTableau {
        &self.tableau
    }

    #[must_use]
    pub fn num_qubits(&self) -> usize {
        self.tableau.num_qubits()
    }

    /// The gate applying `self` and then `second`.
    ///
    /// # Errors
    /// Returns [`Error::QubitCountMismatch`] when the gates act on different numbers of qubits.
    pub fn then(&self, second: &CliffordGate) -> Result<Self> {
        Ok(CliffordGate {
            tableau: self.tableau.then(&second.tableau)?,
        })
    }

    #[must_use]
    pub fn inverse(&self) -> Self {
        let mut tableau = CliffordTableau::new(self.num_qubits());
        for (op, support) in self.decompose_to_unitary_ops().into_iter().rev() {
            op.inverse().apply_to(&mut tableau, &support);
        }
        CliffordGate { tableau }
    }

    /// Integer power by repeated squaring, negative exponents go through the inverse.
    #[must_use]
    pub fn powi(&self, exponent: i64) -> Self {
        let mut base = if exponent < 0 { self.inverse() } else { self.clone() };
        let mut exponent = exponent.unsigned_abs();
        let mut res = CliffordGate::identity(self.num_qubits());
        while exponent > 0 {
            if exponent & 1 == 1 {
                res.tableau = res.tableau.compose_same_size(&base.tableau);
            }
            base.tableau = base.tableau.compose_same_size(&base.tableau);
            exponent >>= 1;
        }
        res
    }

    /// # Errors
    /// Returns [`Error::UnsupportedExponent`] for non-integer exponents.
    #[allow(clippy::cast_possible_truncation)]
    pub fn pow(&self, exponent: f64) -> Result<Self> {
        if exponent.fract() != 0.0 || exponent.abs() >= 1e15 {
            return Err(Error::UnsupportedExponent(exponent));
        }
        Ok(self.powi(exponent as i64))
    }

    /// Elementary operations on qubit indices that implement the gate when applied in order.
    ///
    /// The tableau is reduced to the identity qubit by qubit with Hadamard, phase, Pauli, CNOT and SWAP updates;
    /// the inverses of those updates in reverse order rebuild it.
    #[must_use]
    pub fn decompose_to_unitary_ops(&self) -> Operations {
        let n = self.num_qubits();
        let mut tableau = self.tableau.clone();
        let mut reduction: Operations = Vec::new();
        let mut apply = |tableau: &mut CliffordTableau, op: UnitaryOp, support: Vec<usize>| {
            op.apply_to(tableau, &support);
            reduction.push((op, support));
        };
        for i in 0..n {
            if !tableau.xs()[[i, i]] {
                if let Some(j) = (i + 1..n).find(|&j| tableau.xs()[[i, j]]) {
                    apply(&mut tableau, UnitaryOp::Swap, vec![i, j]);
                } else if let Some(j) = (i..n).find(|&j| tableau.zs()[[i, j]]) {
                    apply(&mut tableau, UnitaryOp::Hadamard, vec![j]);
                    if j != i {
                        apply(&mut tableau, UnitaryOp::Swap, vec![i, j]);
                    }
                }
            }
            for j in i + 1..n {
                if tableau.xs()[[i, j]] {
                    apply(&mut tableau, UnitaryOp::ControlledX, vec![i, j]);
                }
            }
            if (i..n).any(|j| tableau.zs()[[i, j]]) {
                if !tableau.zs()[[i, i]] {
                    apply(&mut tableau, UnitaryOp::SqrtZ, vec![i]);
                }
                for j in i + 1..n {
                    if tableau.zs()[[i, j]] {
                        apply(&mut tableau, UnitaryOp::ControlledX, vec![j, i]);
                    }
                }
                apply(&mut tableau, UnitaryOp::SqrtZ, vec![i]);
            }
            // row n + i anti-commutes with Xᵢ, so it holds Z or Y on qubit i
            for j in i + 1..n {
                match (tableau.xs()[[n + i, j]], tableau.zs()[[n + i, j]]) {
                    (true, true) => {
                        apply(&mut tableau, UnitaryOp::SqrtZ, vec![j]);
                        apply(&mut tableau, UnitaryOp::Hadamard, vec![j]);
                    }
                    (true, false) => apply(&mut tableau, UnitaryOp::Hadamard, vec![j]),
                    _ => {}
                }
                if tableau.zs()[[n + i, j]] {
                    apply(&mut tableau, UnitaryOp::ControlledX, vec![j, i]);
                }
            }
            if tableau.xs()[[n + i, i]] {
                apply(&mut tableau, UnitaryOp::SqrtX, vec![i]);
            }
            if tableau.rs()[i] {
                apply(&mut tableau, UnitaryOp::Z, vec![i]);
            }
            if tableau.rs()[n + i] {
                apply(&mut tableau, UnitaryOp::X, vec![i]);
            }
        }
        reduction
            .into_iter()
            .rev()
            .map(|(op, support)| (op.inverse(), support))
            .collect()
    }

    #[must_use]
    pub fn to_record(&self) -> TableauRecord {
        self.tableau.to_record()
    }

    /// # Errors
    /// Returns an error when the record is malformed or not a valid tableau.
    pub fn from_record(record: &TableauRecord) -> Result<Self> {
        Self::from_clifford_tableau(CliffordTableau::from_record(record)?)
    }
}

impl From<UnitaryOp> for CliffordGate {
    fn from(op: UnitaryOp) -> Self {
        let num_qubits = op.num_qubits();
        let mut tableau = CliffordTableau::new(num_qubits);
        let support: Vec<usize> = (0..num_qubits).collect();
        op.apply_to(&mut tableau, &support);
        CliffordGate { tableau }
    }
}

impl fmt::Display for CliffordGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CliffordGate({})", self.tableau)
    }
}

impl Gate for CliffordGate {
    fn num_qubits(&self) -> usize {
        self.tableau.num_qubits()
    }

    /// The product of the unitaries of [`CliffordGate::decompose_to_unitary_ops`], up to global phase.
    fn unitary(&self) -> Option<Matrix> {
        let num_qubits = self.num_qubits();
        let shape = vec![2; num_qubits];
        let factors = self
            .decompose_to_unitary_ops()
            .into_iter()
            .map(|(op, support)| Some((op.unitary()?, support)))
            .collect::<Option<Vec<_>>>()?;
        let mut res = identity(1 << num_qubits);
        let mut buffer = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
        for mut column in res.columns_mut() {
            let mut amplitudes = column.to_vec();
            for (matrix, support) in &factors {
                targeted_left_multiply(matrix, &amplitudes, &shape, support, &mut buffer);
                std::mem::swap(&mut amplitudes, &mut buffer);
            }
            column.assign(&aview1(&amplitudes));
        }
        Some(res)
    }

    fn clifford_tableau(&self) -> Option<CliffordTableau> {
        Some(self.tableau.clone())
    }

    fn decompose(&self, qubits: &[Qid]) -> Option<Vec<Operation>> {
        if qubits.len() != self.num_qubits() {
            return None;
        }
        self.decompose_to_unitary_ops()
            .into_iter()
            .map(|(op, support)| {
                let targets = support.iter().map(|&index| qubits[index].clone()).collect();
                Operation::new(Arc::new(op), targets).ok()
            })
            .collect()
    }

    fn act_on(&self, state: &mut dyn SimulationState, qubits: &[Qid]) -> Result<ActOnOutcome> {
        act_on_clifford(&self.tableau, self, state, qubits)
    }
}
