use crate::core::precursor::PrecursorWindow;
use crate::core::residues::ResidueSet;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    /// The beam emitted `[EOS]`.
    EndOfSequence,
    /// The beam hit the length limit or had no admissible extension.
    Truncated,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::EndOfSequence => f.write_str("eos"),
            Termination::Truncated => f.write_str("truncated"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamState {
    Active,
    Terminated(Termination),
}

/// A partial or finished hypothesis.
///
/// `tokens` holds residue tokens only; an `[EOS]` step is recorded in
/// `token_log_probabilities` and the state, never in `tokens`.
#[derive(Debug, Clone, PartialEq)]
pub struct Beam {
    pub tokens: Vec<usize>,
    pub log_probability: f64,
    pub mass: i64,
    pub token_log_probabilities: Vec<f64>,
    pub state: BeamState,
}

impl Beam {
    pub fn root() -> Self {
        Self {
            tokens: Vec::new(),
            log_probability: 0.0,
            mass: 0,
            token_log_probabilities: Vec::new(),
            state: BeamState::Active,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == BeamState::Active
    }

    /// Number of scored steps, `[EOS]` included.
    #[inline]
    pub fn step_count(&self) -> usize {
        self.token_log_probabilities.len()
    }

    pub(crate) fn extend(&self, token: usize, log_probability: f64, mass: i64) -> Self {
        let mut tokens = Vec::with_capacity(self.tokens.len() + 1);
        tokens.extend_from_slice(&self.tokens);
        tokens.push(token);
        let mut token_log_probabilities = Vec::with_capacity(self.step_count() + 1);
        token_log_probabilities.extend_from_slice(&self.token_log_probabilities);
        token_log_probabilities.push(log_probability);
        Self {
            tokens,
            log_probability: self.log_probability + log_probability,
            mass,
            token_log_probabilities,
            state: BeamState::Active,
        }
    }

    pub(crate) fn end(&self, log_probability: f64) -> Self {
        let mut beam = self.clone();
        beam.log_probability += log_probability;
        beam.token_log_probabilities.push(log_probability);
        beam.state = BeamState::Terminated(Termination::EndOfSequence);
        beam
    }

    /// Marks a still active beam as truncated; finished beams are unchanged.
    pub(crate) fn truncate(mut self) -> Self {
        if self.is_active() {
            self.state = BeamState::Terminated(Termination::Truncated);
        }
        self
    }

    pub fn termination(&self) -> Termination {
        match self.state {
            BeamState::Terminated(termination) => termination,
            BeamState::Active => Termination::Truncated,
        }
    }

    pub fn into_scored(self, residues: &ResidueSet, window: &PrecursorWindow) -> ScoredSequence {
        let termination = self.termination();
        ScoredSequence {
            sequence: residues.decode_tokens(&self.tokens),
            precursor_match: window.contains(self.mass),
            tokens: self.tokens,
            total_log_probability: self.log_probability,
            token_log_probabilities: self.token_log_probabilities,
            termination,
            residue_mass: self.mass,
        }
    }
}

/// A finished hypothesis as handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSequence {
    pub tokens: Vec<usize>,
    pub sequence: Vec<String>,
    pub total_log_probability: f64,
    pub token_log_probabilities: Vec<f64>,
    pub termination: Termination,
    /// Scaled residue mass of `tokens`.
    pub residue_mass: i64,
    pub precursor_match: bool,
}

impl ScoredSequence {
    pub fn peptide(&self) -> String {
        self.sequence.concat()
    }

    pub fn step_count(&self) -> usize {
        self.token_log_probabilities.len()
    }

    pub fn mean_log_probability(&self) -> f64 {
        if self.token_log_probabilities.is_empty() {
            return f64::NEG_INFINITY;
        }
        self.total_log_probability / self.token_log_probabilities.len() as f64
    }
}
