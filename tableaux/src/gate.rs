use std::fmt;
use std::sync::Arc;

use quantum_core::linalg::Matrix;
use quantum_core::Qid;

use crate::act_on::SimulationState;
use crate::error::{Error, Result};
use crate::tableau::CliffordTableau;

/// Result of offering an operation to one strategy of the act-on protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActOnOutcome {
    Applied,
    /// The strategy does not apply, the caller should try the next one.
    NotImplemented,
}

/// Capabilities a gate exposes to simulators.
///
/// Every capability method has a default answering "not supported", so a gate implements only the representations
/// it has. Simulators query them in a fixed order, see [`crate::act_on::act_on`].
pub trait Gate: fmt::Debug + fmt::Display + Send + Sync {
    fn num_qubits(&self) -> usize;

    /// Dimensions of the qudits the gate acts on.
    fn qid_shape(&self) -> Vec<usize> {
        vec![2; self.num_qubits()]
    }

    fn unitary(&self) -> Option<Matrix> {
        None
    }

    /// Probabilities and unitaries of a classical mixture of unitaries.
    fn mixture(&self) -> Option<Vec<(f64, Matrix)>> {
        None
    }

    /// Kraus operators of a quantum channel.
    fn kraus(&self) -> Option<Vec<Matrix>> {
        None
    }

    fn is_measurement(&self) -> bool {
        false
    }

    fn measurement_key(&self) -> Option<&str> {
        None
    }

    fn clifford_tableau(&self) -> Option<CliffordTableau> {
        None
    }

    /// Whether the action of the gate is a Pauli-transform tableau.
    fn has_stabilizer_effect(&self) -> bool {
        self.clifford_tableau().is_some()
    }

    /// Equivalent sequence of simpler operations on `qubits`.
    fn decompose(&self, _qubits: &[Qid]) -> Option<Vec<Operation>> {
        None
    }

    /// Gate-specific fast path on a simulation state.
    ///
    /// # Errors
    /// Propagates failures of the simulation state, [`ActOnOutcome::NotImplemented`] is not an error.
    fn act_on(&self, _state: &mut dyn SimulationState, _qubits: &[Qid]) -> Result<ActOnOutcome> {
        Ok(ActOnOutcome::NotImplemented)
    }

    /// Applies the gate to `qubits`.
    ///
    /// # Errors
    /// Returns [`Error::WrongQubitCount`] unless there is one qubit per qubit of the gate.
    fn on(self, qubits: &[Qid]) -> Result<Operation>
    where
        Self: Sized + 'static,
    {
        Operation::new(Arc::new(self), qubits.to_vec())
    }
}

/// A gate applied to specific qubits.
#[derive(Debug, Clone)]
pub struct Operation {
    gate: Arc<dyn Gate>,
    qubits: Vec<Qid>,
}

impl Operation {
    /// # Errors
    /// Returns [`Error::WrongQubitCount`] unless there is one qubit per qubit of the gate.
    pub fn new(gate: Arc<dyn Gate>, qubits: Vec<Qid>) -> Result<Self> {
        if gate.num_qubits() != qubits.len() {
            return Err(Error::WrongQubitCount {
                gate: gate.to_string(),
                expected: gate.num_qubits(),
                actual: qubits.len(),
            });
        }
        Ok(Operation { gate, qubits })
    }

    #[must_use]
    pub fn gate(&self) -> &dyn Gate {
        self.gate.as_ref()
    }

    #[must_use]
    pub fn qubits(&self) -> &[Qid] {
        &self.qubits
    }

    #[must_use]
    pub fn has_stabilizer_effect(&self) -> bool {
        self.gate.has_stabilizer_effect()
    }

    #[must_use]
    pub fn decompose(&self) -> Option<Vec<Operation>> {
        self.gate.decompose(&self.qubits)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.gate)?;
        for (index, qubit) in self.qubits.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{qubit}")?;
        }
        f.write_str(")")
    }
}
