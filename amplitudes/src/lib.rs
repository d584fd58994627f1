pub mod buffered;
pub mod channels;
pub mod error;
pub mod simulation;
#[cfg(test)]
pub(crate) mod statistical_testing;
pub mod transformations;

pub use buffered::{select_kraus_index, BufferedStateVector, KrausSelection, DEFAULT_ATOL};
pub use channels::{AmplitudeDamping, BitFlip, Depolarizing, KrausChannel, PhaseFlip, Reset};
pub use error::{Error, Result};
pub use simulation::StateVectorSimulationState;
