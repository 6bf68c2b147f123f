use super::error::EngineError;
use crate::core::precursor::MassTolerance;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Unknown decoding mode '{0}' (expected greedy, beam or knapsack-beam)")]
    UnknownMode(String),
}

/// Presets over the single beam-search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodingMode {
    /// Beam width one, no mass filter.
    Greedy,
    #[default]
    Beam,
    /// Beam search with knapsack mass pruning.
    KnapsackBeam,
}

impl DecodingMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            DecodingMode::Greedy => "greedy",
            DecodingMode::Beam => "beam",
            DecodingMode::KnapsackBeam => "knapsack-beam",
        }
    }
}

impl fmt::Display for DecodingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecodingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(DecodingMode::Greedy),
            "beam" => Ok(DecodingMode::Beam),
            "knapsack-beam" | "knapsack" => Ok(DecodingMode::KnapsackBeam),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodingConfig {
    pub beam_size: usize,
    pub max_length: usize,
    pub use_mass_filter: bool,
    pub precursor_tolerance: MassTolerance,
    pub num_results: usize,
    pub include_truncated: bool,
}

impl DecodingConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.beam_size < 1 {
            return Err(EngineError::InvalidConfiguration(
                "beam_size must be at least 1".to_string(),
            ));
        }
        if self.max_length < 1 {
            return Err(EngineError::InvalidConfiguration(
                "max_length must be at least 1".to_string(),
            ));
        }
        if self.num_results < 1 {
            return Err(EngineError::InvalidConfiguration(
                "num_results must be at least 1".to_string(),
            ));
        }
        self.precursor_tolerance.validate().map_err(|e| {
            EngineError::InvalidConfiguration(format!("precursor_tolerance: {e}"))
        })?;
        Ok(())
    }

    /// Number of sequences a decode returns at most.
    pub fn result_limit(&self) -> usize {
        self.num_results.min(self.beam_size)
    }

    pub fn mode(&self) -> DecodingMode {
        if self.use_mass_filter {
            DecodingMode::KnapsackBeam
        } else if self.beam_size == 1 {
            DecodingMode::Greedy
        } else {
            DecodingMode::Beam
        }
    }
}

#[derive(Default)]
pub struct DecodingConfigBuilder {
    mode: Option<DecodingMode>,
    beam_size: Option<usize>,
    max_length: Option<usize>,
    use_mass_filter: Option<bool>,
    precursor_tolerance: Option<MassTolerance>,
    num_results: Option<usize>,
    include_truncated: Option<bool>,
}

impl DecodingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: DecodingMode) -> Self {
        self.mode = Some(mode);
        self
    }
    pub fn beam_size(mut self, k: usize) -> Self {
        self.beam_size = Some(k);
        self
    }
    pub fn max_length(mut self, length: usize) -> Self {
        self.max_length = Some(length);
        self
    }
    pub fn use_mass_filter(mut self, enabled: bool) -> Self {
        self.use_mass_filter = Some(enabled);
        self
    }
    pub fn precursor_tolerance(mut self, tolerance: MassTolerance) -> Self {
        self.precursor_tolerance = Some(tolerance);
        self
    }
    pub fn num_results(mut self, n: usize) -> Self {
        self.num_results = Some(n);
        self
    }
    pub fn include_truncated(mut self, include: bool) -> Self {
        self.include_truncated = Some(include);
        self
    }

    /// Builds the configuration.
    ///
    /// `max_length` is always required. `beam_size` is required unless the
    /// mode is [`DecodingMode::Greedy`], which forces it to one. The
    /// knapsack-beam mode forces the mass filter on. `num_results` defaults
    /// to the beam size.
    pub fn build(self) -> Result<DecodingConfig, ConfigError> {
        let mode = self.mode.unwrap_or_default();
        let beam_size = match mode {
            DecodingMode::Greedy => 1,
            DecodingMode::Beam | DecodingMode::KnapsackBeam => self
                .beam_size
                .ok_or(ConfigError::MissingParameter("beam_size"))?,
        };
        let use_mass_filter = match mode {
            DecodingMode::KnapsackBeam => true,
            DecodingMode::Greedy | DecodingMode::Beam => self.use_mass_filter.unwrap_or(false),
        };
        Ok(DecodingConfig {
            beam_size,
            max_length: self
                .max_length
                .ok_or(ConfigError::MissingParameter("max_length"))?,
            use_mass_filter,
            precursor_tolerance: self.precursor_tolerance.unwrap_or_default(),
            num_results: self.num_results.unwrap_or(beam_size),
            include_truncated: self.include_truncated.unwrap_or(true),
        })
    }
}
