use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A partial description of a single qubit Clifford gate that does not describe any gate.
    #[error("{0}")]
    InvalidSpecification(String),

    #[error("Input is not a valid Clifford tableau.")]
    NotSymplectic,

    #[error("Clifford gates support only integer exponents, got {0}.")]
    UnsupportedExponent(f64),

    #[error("Input axes of padding should match with the number of qubits in the input tableau.")]
    PaddingAxesMismatch,

    #[error("The number of qubits in the input tableau should not be larger than num_qubits_after_padding.")]
    PaddingTooSmall,

    #[error("Tableaux acting on {left} and {right} qubits cannot be composed.")]
    QubitCountMismatch { left: usize, right: usize },

    #[error("Clifford Gate can only be constructed from the operations that has stabilizer effect.")]
    NoStabilizerEffect,

    #[error("Wrong number of qubits for {gate}. Expected {expected} qubits but got {actual}.")]
    WrongQubitCount { gate: String, expected: usize, actual: usize },

    #[error("Qubit {0} is not part of the simulated register.")]
    UnknownQubit(String),

    #[error("Can't simulate operations without a unitary, a mixture or a channel that are not measurements: {0}")]
    UnsupportedOperation(String),

    #[error("Failed to act action on state: {0}")]
    FailedToAct(String),

    /// Failure reported by a simulation state while mutating its representation.
    #[error("{0}")]
    Simulation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
