pub mod act_on;
pub mod clifford_gate;
pub mod error;
pub mod gate;
#[macro_use]
pub mod gates;
pub mod pauli;
pub mod phased_xz;
pub mod single_qubit;
pub mod tableau;

#[cfg(feature = "serde")]
mod serde;

pub use act_on::{act_on, MeasurementRecords, SimulationState, TableauSimulationState};
pub use clifford_gate::CliffordGate;
pub use error::{Error, Result};
pub use gate::{ActOnOutcome, Gate, Operation};
pub use gates::{MatrixGate, MeasurementGate, Operations, PauliPowGate, UnitaryOp};
pub use pauli::PauliString;
pub use phased_xz::PhasedXZGate;
pub use single_qubit::SingleQubitCliffordGate;
pub use tableau::{CliffordTableau, TableauRecord};
