//! The boundary to the external sequencing model.
//!
//! A [`Scorer`] maps `(spectrum, precursor, prefix)` to a log-probability vector
//! over the whole vocabulary of a [`crate::core::residues::ResidueSet`],
//! `[EOS]` included. The engine treats it as opaque: it may run on an
//! accelerator and block for an arbitrary time.

use super::precursor::Precursor;
use thiserror::Error;

/// Opaque failure reported by a scorer.
#[derive(Debug, Error)]
#[error("Scorer failed: {message}")]
pub struct ScorerError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ScorerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub trait Scorer: Sync {
    /// Model-specific encoding of one spectrum.
    type Spectrum: Sync;

    /// Log-probabilities of the next token after `prefix` (residue token indices).
    fn score_next(
        &self,
        spectrum: &Self::Spectrum,
        precursor: &Precursor,
        prefix: &[usize],
    ) -> Result<Vec<f64>, ScorerError>;

    /// Scores several prefixes of the same spectrum at once.
    ///
    /// Models that batch on an accelerator should override this; the engine
    /// issues one call per search step.
    fn score_batch(
        &self,
        spectrum: &Self::Spectrum,
        precursor: &Precursor,
        prefixes: &[&[usize]],
    ) -> Result<Vec<Vec<f64>>, ScorerError> {
        prefixes
            .iter()
            .map(|prefix| self.score_next(spectrum, precursor, prefix))
            .collect()
    }
}

/// Natural log of each probability; zero and negative entries become `-inf`.
pub fn log_probabilities_from(probabilities: &[f64]) -> Vec<f64> {
    probabilities
        .iter()
        .map(|&p| if p > 0.0 { p.ln() } else { f64::NEG_INFINITY })
        .collect()
}

/// Precomputed per-step distributions for one spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct StepDistributions {
    steps: Vec<Vec<f64>>,
}

impl StepDistributions {
    pub fn from_log_probabilities(
        steps: Vec<Vec<f64>>,
        vocab_size: usize,
    ) -> Result<Self, ScorerError> {
        if let Some((step, row)) = steps
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != vocab_size)
        {
            return Err(ScorerError::new(format!(
                "step {step} has {} entries, expected {vocab_size}",
                row.len()
            )));
        }
        Ok(Self { steps })
    }

    pub fn from_probabilities(
        steps: Vec<Vec<f64>>,
        vocab_size: usize,
    ) -> Result<Self, ScorerError> {
        let steps = steps.iter().map(|row| log_probabilities_from(row)).collect();
        Self::from_log_probabilities(steps, vocab_size)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// A prefix-independent scorer backed by [`StepDistributions`].
///
/// The distribution at step `i` is used for every prefix of length `i`. Steps
/// past the end of the table have no finite entry, which ends the beam.
#[derive(Debug, Clone, Copy)]
pub struct PositionalScorer {
    vocab_size: usize,
}

impl PositionalScorer {
    pub fn new(vocab_size: usize) -> Self {
        Self { vocab_size }
    }
}

impl Scorer for PositionalScorer {
    type Spectrum = StepDistributions;

    fn score_next(
        &self,
        spectrum: &StepDistributions,
        _precursor: &Precursor,
        prefix: &[usize],
    ) -> Result<Vec<f64>, ScorerError> {
        Ok(spectrum
            .steps
            .get(prefix.len())
            .cloned()
            .unwrap_or_else(|| vec![f64::NEG_INFINITY; self.vocab_size]))
    }
}
