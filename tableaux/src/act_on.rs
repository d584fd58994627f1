//! The act-on protocol: applying an [`Operation`] to a simulation state.
//!
//! An operation is first offered to its own gate through [`Gate::act_on`], which covers fast paths such as
//! Clifford updates of a tableau. If the gate declines, the state tries its own strategies through
//! [`SimulationState::act_on_fallback`]. When both decline the operation cannot be simulated on that state.

use std::collections::BTreeMap;

use quantum_core::Qid;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::gate::{ActOnOutcome, Gate, Operation};
use crate::tableau::CliffordTableau;

/// Measurement results by key, one entry per time the key was measured.
pub type MeasurementRecords = BTreeMap<String, Vec<Vec<usize>>>;

/// A quantum state that operations can act on.
pub trait SimulationState {
    /// Qubits of the register, in axis order.
    fn qubits(&self) -> &[Qid];

    /// Axis of each of `qubits` in the register.
    ///
    /// # Errors
    /// Returns [`Error::UnknownQubit`] for qubits outside the register.
    fn axes_of(&self, qubits: &[Qid]) -> Result<Vec<usize>> {
        qubits
            .iter()
            .map(|qubit| {
                self.qubits()
                    .iter()
                    .position(|candidate| candidate == qubit)
                    .ok_or_else(|| Error::UnknownQubit(qubit.to_string()))
            })
            .collect()
    }

    /// Measures `qubits` in the computational basis and collapses the state.
    ///
    /// # Errors
    /// Returns [`Error::UnknownQubit`] for qubits outside the register.
    fn measure(&mut self, qubits: &[Qid]) -> Result<Vec<usize>>;

    fn measurements(&self) -> &MeasurementRecords;

    fn measurements_mut(&mut self) -> &mut MeasurementRecords;

    fn record_measurement(&mut self, key: &str, values: Vec<usize>) {
        self.measurements_mut().entry(key.to_owned()).or_default().push(values);
    }

    /// Direct access to a stabilizer tableau, for states that are one.
    fn tableau_mut(&mut self) -> Option<&mut CliffordTableau> {
        None
    }

    /// Whether gates without a dedicated path may act on this state through their decomposition.
    fn accepts_decomposed_operations(&self) -> bool {
        false
    }

    /// Strategies of the state itself, tried after the gate declined.
    ///
    /// # Errors
    /// Returns an error when a strategy applies but fails, or when the state knows the operation is unsupported.
    fn act_on_fallback(&mut self, operation: &Operation, allow_decompose: bool) -> Result<ActOnOutcome>;
}

/// Applies `operation` to `state`.
///
/// # Errors
/// Returns [`Error::FailedToAct`] when neither the gate nor the state can perform the action, and propagates
/// errors raised by the strategy that applied.
pub fn act_on(operation: &Operation, state: &mut dyn SimulationState, allow_decompose: bool) -> Result<()> {
    trace!(%operation, "act on");
    if operation.gate().act_on(state, operation.qubits())? == ActOnOutcome::Applied {
        return Ok(());
    }
    if state.act_on_fallback(operation, allow_decompose)? == ActOnOutcome::Applied {
        return Ok(());
    }
    Err(Error::FailedToAct(operation.to_string()))
}

/// Composes `tableau` into the state at `qubits` when the state is a tableau.
///
/// # Errors
/// Returns [`Error::UnknownQubit`] or padding errors when `qubits` does not fit the tableau.
pub fn apply_tableau(
    tableau: &CliffordTableau,
    state: &mut dyn SimulationState,
    qubits: &[Qid],
) -> Result<ActOnOutcome> {
    let axes = state.axes_of(qubits)?;
    let Some(target) = state.tableau_mut() else {
        return Ok(ActOnOutcome::NotImplemented);
    };
    let padded = tableau.pad(target.num_qubits(), &axes)?;
    *target = target.then(&padded)?;
    Ok(ActOnOutcome::Applied)
}

/// Applies each operation of the decomposition of `operation`, if the gate has one.
///
/// # Errors
/// Propagates the first failure of the decomposed operations.
pub fn act_on_decomposed(operation: &Operation, state: &mut dyn SimulationState) -> Result<ActOnOutcome> {
    let Some(operations) = operation.decompose() else {
        return Ok(ActOnOutcome::NotImplemented);
    };
    debug!(%operation, count = operations.len(), "acting through decomposition");
    for sub_operation in &operations {
        act_on(sub_operation, state, true)?;
    }
    Ok(ActOnOutcome::Applied)
}

/// Stabilizer state of a register held as a [`CliffordTableau`].
#[derive(Debug, Clone)]
pub struct TableauSimulationState<R = StdRng> {
    tableau: CliffordTableau,
    qubits: Vec<Qid>,
    rng: R,
    measurements: MeasurementRecords,
}

impl<R: Rng> TableauSimulationState<R> {
    /// Register of `qubits` in `|0…0⟩`.
    pub fn new(qubits: Vec<Qid>, rng: R) -> Self {
        let tableau = CliffordTableau::new(qubits.len());
        TableauSimulationState {
            tableau,
            qubits,
            rng,
            measurements: MeasurementRecords::new(),
        }
    }

    /// Register of `qubits` in the computational basis state `initial_state`, first qubit most significant.
    pub fn with_initial_state(qubits: Vec<Qid>, initial_state: usize, rng: R) -> Self {
        let mut res = Self::new(qubits, rng);
        res.tableau = CliffordTableau::with_initial_state(res.qubits.len(), initial_state);
        res
    }

    /// # Errors
    /// Returns [`Error::QubitCountMismatch`] when the tableau and the register have different sizes.
    pub fn with_tableau(tableau: CliffordTableau, qubits: Vec<Qid>, rng: R) -> Result<Self> {
        if tableau.num_qubits() != qubits.len() {
            return Err(Error::QubitCountMismatch {
                left: tableau.num_qubits(),
                right: qubits.len(),
            });
        }
        Ok(TableauSimulationState {
            tableau,
            qubits,
            rng,
            measurements: MeasurementRecords::new(),
        })
    }

    pub fn tableau(&self) -> &CliffordTableau {
        &self.tableau
    }

    pub fn into_tableau(self) -> CliffordTableau {
        self.tableau
    }
}

impl<R: Rng> SimulationState for TableauSimulationState<R> {
    fn qubits(&self) -> &[Qid] {
        &self.qubits
    }

    fn measure(&mut self, qubits: &[Qid]) -> Result<Vec<usize>> {
        let axes = self.axes_of(qubits)?;
        Ok(axes
            .into_iter()
            .map(|axis| usize::from(self.tableau.measure(axis, &mut self.rng)))
            .collect())
    }

    fn measurements(&self) -> &MeasurementRecords {
        &self.measurements
    }

    fn measurements_mut(&mut self) -> &mut MeasurementRecords {
        &mut self.measurements
    }

    fn tableau_mut(&mut self) -> Option<&mut CliffordTableau> {
        Some(&mut self.tableau)
    }

    fn act_on_fallback(&mut self, operation: &Operation, allow_decompose: bool) -> Result<ActOnOutcome> {
        if let Some(tableau) = operation.gate().clifford_tableau() {
            return apply_tableau(&tableau, self, operation.qubits());
        }
        if allow_decompose {
            return act_on_decomposed(operation, self);
        }
        Ok(ActOnOutcome::NotImplemented)
    }
}

/// Gate helper used by Clifford gates: compose into a tableau, otherwise decompose when the state allows it.
pub(crate) fn act_on_clifford(
    tableau: &CliffordTableau,
    gate: &dyn Gate,
    state: &mut dyn SimulationState,
    qubits: &[Qid],
) -> Result<ActOnOutcome> {
    if apply_tableau(tableau, state, qubits)? == ActOnOutcome::Applied {
        return Ok(ActOnOutcome::Applied);
    }
    if state.accepts_decomposed_operations() {
        if let Some(operations) = gate.decompose(qubits) {
            for operation in &operations {
                act_on(operation, state, true)?;
            }
            return Ok(ActOnOutcome::Applied);
        }
    }
    Ok(ActOnOutcome::NotImplemented)
}
