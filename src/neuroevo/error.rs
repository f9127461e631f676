use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvolutionError>;

#[derive(Debug, Error)]
pub enum EvolutionError {
    #[error("invalid topology {0:?}: need at least 2 layers, each with at least one neuron")]
    InvalidTopology(Vec<usize>),

    #[error("topology mismatch: expected {expected:?}, got {actual:?}")]
    TopologyMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("input size mismatch: network takes {expected} inputs, got {actual}")]
    InputSizeMismatch { expected: usize, actual: usize },

    #[error("parent pool is empty, no parents to breed from")]
    EmptyParentPool,

    #[error("generation still running: {alive} agents alive")]
    GenerationInProgress { alive: usize },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse settings: {0}")]
    Config(#[from] ron::error::SpannedError),

    #[error("could not serialize: {0}")]
    Serialize(#[from] ron::Error),
}
