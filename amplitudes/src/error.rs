use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Tableaux(#[from] tableaux::Error),

    #[error("The tensor cannot be factored by the requested axes")]
    NotSeparable,

    #[error("Expected {expected} amplitudes for qid shape {qid_shape:?}, got {actual}.")]
    ShapeMismatch {
        qid_shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("State vector is not normalized, its squared norm is {0}.")]
    NotNormalized(f64),

    #[error("Basis state {state} is out of range for qid shape {qid_shape:?}.")]
    BasisStateOutOfRange { state: usize, qid_shape: Vec<usize> },

    #[error("Axes {axes:?} are not distinct axes of a state with {rank} qudits.")]
    InvalidAxes { axes: Vec<usize>, rank: usize },

    #[error("Qubit {0} belongs to both registers.")]
    OverlappingRegisters(String),

    #[error("Probability {0} is outside [0, 1].")]
    InvalidProbability(f64),

    #[error("Kraus operators do not sum to the identity: {0}")]
    NotTracePreserving(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for tableaux::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Tableaux(inner) => inner,
            other => tableaux::Error::Simulation(other.to_string()),
        }
    }
}
