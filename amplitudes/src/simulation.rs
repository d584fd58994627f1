use quantum_core::{qid_shape, Qid};
use rand::rngs::StdRng;
use rand::Rng;
use tableaux::act_on::act_on_decomposed;
use tableaux::{ActOnOutcome, Gate, MeasurementRecords, Operation, SimulationState};
use tracing::{debug, trace};

use crate::buffered::BufferedStateVector;
use crate::error::{Error, Result};

/// State vector of a register, driven by [`tableaux::act_on`].
///
/// Operations the gate does not handle itself go through the strategies of [`Self::act_on_fallback`]: the
/// unitary, then the mixture, then the channel, then the decomposition when allowed.
#[derive(Debug, Clone)]
pub struct StateVectorSimulationState<R = StdRng> {
    state: BufferedStateVector,
    qubits: Vec<Qid>,
    rng: R,
    measurements: MeasurementRecords,
}

impl<R: Rng> StateVectorSimulationState<R> {
    /// Register of `qubits` in the all-zero state.
    pub fn new(qubits: Vec<Qid>, rng: R) -> Self {
        let state = BufferedStateVector::new(&qid_shape(&qubits));
        StateVectorSimulationState {
            state,
            qubits,
            rng,
            measurements: MeasurementRecords::new(),
        }
    }

    /// Register of `qubits` in the computational basis state `initial_state`, first qubit most significant.
    ///
    /// # Errors
    /// Returns [`Error::BasisStateOutOfRange`] if the register has no such basis state.
    pub fn with_initial_state(qubits: Vec<Qid>, initial_state: usize, rng: R) -> Result<Self> {
        let state = BufferedStateVector::from_basis_state(initial_state, &qid_shape(&qubits))?;
        Self::with_state(state, qubits, rng)
    }

    /// # Errors
    /// Returns [`Error::ShapeMismatch`] when the dimensions of `qubits` differ from the qid shape of `state`.
    pub fn with_state(state: BufferedStateVector, qubits: Vec<Qid>, rng: R) -> Result<Self> {
        let shape = qid_shape(&qubits);
        if shape != state.qid_shape() {
            return Err(Error::ShapeMismatch {
                expected: shape.iter().product(),
                qid_shape: shape,
                actual: state.state_vector().len(),
            });
        }
        Ok(StateVectorSimulationState {
            state,
            qubits,
            rng,
            measurements: MeasurementRecords::new(),
        })
    }

    pub fn state(&self) -> &BufferedStateVector {
        &self.state
    }

    pub fn into_state(self) -> BufferedStateVector {
        self.state
    }

    /// Draws `repetitions` outcomes of measuring `qubits` without collapsing the register.
    ///
    /// # Errors
    /// Returns an error for qubits outside the register.
    pub fn sample(&mut self, qubits: &[Qid], repetitions: usize) -> tableaux::Result<Vec<Vec<usize>>> {
        let axes = self.axes_of(qubits)?;
        Ok(self.state.sample(&axes, repetitions, &mut self.rng)?)
    }

    /// Copy of the register, see [`BufferedStateVector::copy`] for `deep_copy_buffers`.
    #[must_use]
    pub fn copy(&self, deep_copy_buffers: bool) -> Self
    where
        R: Clone,
    {
        StateVectorSimulationState {
            state: self.state.copy(deep_copy_buffers),
            qubits: self.qubits.clone(),
            rng: self.rng.clone(),
            measurements: self.measurements.clone(),
        }
    }

    /// Joint register with the qubits of `self` followed by those of `other`.
    ///
    /// The result keeps the random source of `self` and the measurement records of both, records of `other`
    /// coming after those of `self` under a shared key.
    ///
    /// # Errors
    /// Returns [`Error::OverlappingRegisters`] when the registers share a qubit.
    pub fn kron(&self, other: &Self) -> Result<Self>
    where
        R: Clone,
    {
        if let Some(shared) = other.qubits.iter().find(|qubit| self.qubits.contains(qubit)) {
            return Err(Error::OverlappingRegisters(shared.to_string()));
        }
        let mut measurements = self.measurements.clone();
        for (key, records) in &other.measurements {
            measurements.entry(key.clone()).or_default().extend(records.iter().cloned());
        }
        Ok(StateVectorSimulationState {
            state: self.state.kron(&other.state),
            qubits: self.qubits.iter().chain(&other.qubits).cloned().collect(),
            rng: self.rng.clone(),
            measurements,
        })
    }

    /// Splits off `qubits`, in that order, from the rest of the register.
    ///
    /// Both parts start from a copy of the random source and of the measurement records.
    ///
    /// # Errors
    /// Returns an error for qubits outside the register or listed twice, and [`Error::NotSeparable`] when `validate`
    /// is set and the register is entangled across the split.
    pub fn factor(&self, qubits: &[Qid], validate: bool, atol: f64) -> Result<(Self, Self)>
    where
        R: Clone,
    {
        let axes = self.axes_of(qubits)?;
        let (extracted, remainder) = self.state.factor(&axes, validate, atol)?;
        let remaining_qubits = self.qubits.iter().filter(|qubit| !qubits.contains(qubit)).cloned().collect();
        debug!(extracted = qubits.len(), validate, "factored register");
        Ok((
            StateVectorSimulationState {
                state: extracted,
                qubits: qubits.to_vec(),
                rng: self.rng.clone(),
                measurements: self.measurements.clone(),
            },
            StateVectorSimulationState {
                state: remainder,
                qubits: remaining_qubits,
                rng: self.rng.clone(),
                measurements: self.measurements.clone(),
            },
        ))
    }

    /// The same register with its axes in the order of `qubits`.
    ///
    /// # Errors
    /// Returns an error unless `qubits` lists every qubit of the register exactly once.
    pub fn transpose_to_qubit_order(&self, qubits: &[Qid]) -> Result<Self>
    where
        R: Clone,
    {
        let axes = self.axes_of(qubits)?;
        Ok(StateVectorSimulationState {
            state: self.state.reindex(&axes)?,
            qubits: qubits.to_vec(),
            rng: self.rng.clone(),
            measurements: self.measurements.clone(),
        })
    }

    fn record_index(&mut self, gate: &dyn Gate, index: usize) {
        if let (true, Some(key)) = (gate.is_measurement(), gate.measurement_key()) {
            self.record_measurement(key, vec![index]);
        }
    }

    fn try_strategies(&mut self, gate: &dyn Gate, axes: &[usize]) -> Result<ActOnOutcome> {
        if self.state.apply_unitary(gate, axes)? {
            trace!(%gate, "applied unitary");
            return Ok(ActOnOutcome::Applied);
        }
        if let Some(index) = self.state.apply_mixture(gate, axes, &mut self.rng)? {
            trace!(%gate, index, "applied mixture");
            self.record_index(gate, index);
            return Ok(ActOnOutcome::Applied);
        }
        if let Some(index) = self.state.apply_channel(gate, axes, &mut self.rng)? {
            trace!(%gate, index, "applied channel");
            self.record_index(gate, index);
            return Ok(ActOnOutcome::Applied);
        }
        Ok(ActOnOutcome::NotImplemented)
    }
}

impl<R: Rng> SimulationState for StateVectorSimulationState<R> {
    fn qubits(&self) -> &[Qid] {
        &self.qubits
    }

    fn measure(&mut self, qubits: &[Qid]) -> tableaux::Result<Vec<usize>> {
        let axes = self.axes_of(qubits)?;
        Ok(self.state.measure(&axes, &mut self.rng)?)
    }

    fn measurements(&self) -> &MeasurementRecords {
        &self.measurements
    }

    fn measurements_mut(&mut self) -> &mut MeasurementRecords {
        &mut self.measurements
    }

    fn accepts_decomposed_operations(&self) -> bool {
        true
    }

    fn act_on_fallback(&mut self, operation: &Operation, allow_decompose: bool) -> tableaux::Result<ActOnOutcome> {
        let axes = self.axes_of(operation.qubits())?;
        if self.try_strategies(operation.gate(), &axes)? == ActOnOutcome::Applied {
            return Ok(ActOnOutcome::Applied);
        }
        if allow_decompose && act_on_decomposed(operation, self)? == ActOnOutcome::Applied {
            return Ok(ActOnOutcome::Applied);
        }
        debug!(%operation, allow_decompose, "no strategy applies");
        Err(tableaux::Error::UnsupportedOperation(operation.to_string()))
    }
}
