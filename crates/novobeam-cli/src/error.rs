use novobeam::core::knapsack::KnapsackError;
use novobeam::core::residues::ResidueError;
use novobeam::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Knapsack(#[from] KnapsackError),

    #[error(transparent)]
    Residues(#[from] ResidueError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid record '{id}': {reason}")]
    InvalidRecord { id: String, reason: String },

    #[error("Knapsack cache error: {0}")]
    Cache(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Decoding was interrupted")]
    Interrupted,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
