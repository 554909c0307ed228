use thiserror::Error;

/// Errors raised while configuring or running a simulation.
///
/// Configuration errors are detected before the first sweep. Everything else is fatal for the
/// Markov chain: a sweep either completes or the run is aborted.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A parameter is outside of its valid range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The operator string can no longer be doubled.
    #[error("operator string capacity {capacity} cannot be doubled")]
    CapacityOverflow {
        /// Capacity at the time of the failed growth.
        capacity: usize,
    },

    /// The cluster forest or operator string is internally inconsistent.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A checkpoint blob could not be encoded or decoded.
    #[error("checkpoint encoding failed: {0}")]
    Checkpoint(#[from] serde_json::Error),

    /// A checkpoint was taken for a differently sized system.
    #[error("checkpoint holds {found} sites but the lattice has {expected}")]
    CheckpointMismatch {
        /// Number of sites in the running system.
        expected: usize,
        /// Number of sites stored in the checkpoint.
        found: usize,
    },

    /// A parameter file could not be parsed.
    #[error("could not parse parameters: {0}")]
    Config(#[from] toml::de::Error),

    /// A parameter or checkpoint file could not be read or written.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// No worker is registered under the requested name.
    #[error("unknown model `{0}`")]
    UnknownModel(String),
}

impl SimulationError {
    pub(crate) fn invalid<S: Into<String>>(name: &'static str, reason: S) -> Self {
        SimulationError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimulationError>;
