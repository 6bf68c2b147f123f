use crate::core::knapsack::KnapsackError;
use crate::core::precursor::PrecursorError;
use crate::core::residues::ResidueError;
use crate::core::scoring::ScorerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(
        "Residue '{symbol}' has negative scaled mass {scaled_mass}; substitute a sentinel mass before building the knapsack"
    )]
    InvalidResidueMass { symbol: String, scaled_mass: i64 },

    #[error("Scorer failure: {source}")]
    Scorer {
        #[from]
        source: ScorerError,
    },

    #[error("Knapsack error: {0}")]
    Knapsack(KnapsackError),

    #[error("Knapsack does not match the residue set: {0}")]
    KnapsackMismatch(String),

    #[error("Invalid precursor: {0}")]
    Precursor(#[from] PrecursorError),

    #[error("Residue set error: {0}")]
    Residues(#[from] ResidueError),

    #[error("Scaled mass overflowed at search step {step}")]
    MassOverflow { step: usize },

    #[error("Decoding was cancelled after {steps} step(s)")]
    Cancelled { steps: usize },
}

impl From<KnapsackError> for EngineError {
    fn from(err: KnapsackError) -> Self {
        match err {
            KnapsackError::InvalidConfiguration(message) => EngineError::InvalidConfiguration(message),
            KnapsackError::InvalidResidueMass {
                symbol,
                scaled_mass,
            } => EngineError::InvalidResidueMass {
                symbol,
                scaled_mass,
            },
            KnapsackError::ParameterMismatch(message) => EngineError::KnapsackMismatch(message),
            other => EngineError::Knapsack(other),
        }
    }
}

impl EngineError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, EngineError::Cancelled { .. })
    }
}
