//! # Knapsack Feasibility Index
//!
//! A precomputed table answering "can some multiset of residues sum to exactly
//! mass `m`?" for every lattice mass up to a configured bound. The search engine
//! uses it to discard any beam whose remaining mass budget can never be closed.
//!
//! Construction is the expensive step (`O(max_mass × |residues|)`), so a built
//! index is immutable, shared read-only across concurrent decodes, and can be
//! persisted with [`Knapsack::save`] and restored with [`Knapsack::load`].

mod bitset;
mod persist;

use crate::core::residues::ResidueSet;
use crate::core::residues::masses::scale_mass;
use bitset::MassBitset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Backpointer value of unreachable cells and of mass zero.
const NO_RESIDUE: u8 = u8::MAX;

/// Backpointers are stored as `u8`, with [`NO_RESIDUE`] reserved.
pub const MAX_RESIDUES: usize = NO_RESIDUE as usize;

#[derive(Debug, Error)]
pub enum KnapsackError {
    #[error("Invalid knapsack configuration: {0}")]
    InvalidConfiguration(String),

    #[error(
        "Residue '{symbol}' has negative scaled mass {scaled_mass}; substitute a sentinel mass before construction"
    )]
    InvalidResidueMass { symbol: String, scaled_mass: i64 },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to encode knapsack: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Failed to decode knapsack: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Unsupported knapsack format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Corrupt knapsack data: {0}")]
    Corrupt(String),

    #[error("Knapsack parameters do not match the residue set: {0}")]
    ParameterMismatch(String),
}

/// The parameters a knapsack was built from, all on the scaled lattice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnapsackParameters {
    pub residue_masses: BTreeMap<String, i64>,
    pub residue_indices: BTreeMap<String, usize>,
    pub max_mass: i64,
    pub mass_scale: i64,
}

impl KnapsackParameters {
    /// Scales masses given in Da onto the integer lattice.
    pub fn scaled(
        residue_masses: &BTreeMap<String, f64>,
        residue_indices: &BTreeMap<String, usize>,
        max_mass: f64,
        mass_scale: i64,
    ) -> Result<Self, KnapsackError> {
        if !max_mass.is_finite() || max_mass < 0.0 {
            return Err(KnapsackError::InvalidConfiguration(format!(
                "maximum mass must be finite and non-negative, got {max_mass}"
            )));
        }
        if let Some((symbol, mass)) = residue_masses.iter().find(|(_, m)| !m.is_finite()) {
            return Err(KnapsackError::InvalidConfiguration(format!(
                "residue '{symbol}' has non-finite mass {mass}"
            )));
        }
        Ok(Self {
            residue_masses: residue_masses
                .iter()
                .map(|(s, &m)| (s.clone(), scale_mass(m, mass_scale)))
                .collect(),
            residue_indices: residue_indices
                .iter()
                .filter(|(s, _)| residue_masses.contains_key(*s))
                .map(|(s, &i)| (s.clone(), i))
                .collect(),
            max_mass: scale_mass(max_mass, mass_scale),
            mass_scale,
        })
    }

    pub fn for_residues(
        residues: &ResidueSet,
        max_mass: f64,
        sentinel_mass: f64,
    ) -> Result<Self, KnapsackError> {
        let (masses, indices) = residues.knapsack_inputs(sentinel_mass);
        Self::scaled(&masses, &indices, max_mass, residues.mass_scale())
    }

    fn validate(&self) -> Result<(), KnapsackError> {
        if self.mass_scale < 1 {
            return Err(KnapsackError::InvalidConfiguration(format!(
                "mass scale must be positive, got {}",
                self.mass_scale
            )));
        }
        if self.max_mass < 0 {
            return Err(KnapsackError::InvalidConfiguration(format!(
                "maximum mass must be non-negative, got {}",
                self.max_mass
            )));
        }
        if self.residue_masses.len() > MAX_RESIDUES {
            return Err(KnapsackError::InvalidConfiguration(format!(
                "at most {} residues are supported, got {}",
                MAX_RESIDUES,
                self.residue_masses.len()
            )));
        }
        if let Some(symbol) = self
            .residue_masses
            .keys()
            .find(|s| !self.residue_indices.contains_key(*s))
        {
            return Err(KnapsackError::InvalidConfiguration(format!(
                "residue '{symbol}' has a mass but no index"
            )));
        }
        if let Some((symbol, &scaled_mass)) = self.residue_masses.iter().find(|(_, m)| **m < 0) {
            return Err(KnapsackError::InvalidResidueMass {
                symbol: symbol.clone(),
                scaled_mass,
            });
        }
        Ok(())
    }

    /// Residues in recurrence order: ascending mass, then symbol.
    fn ordered_residues(&self) -> Vec<(String, i64)> {
        let mut residues: Vec<(String, i64)> = self
            .residue_masses
            .iter()
            .map(|(s, &m)| (s.clone(), m))
            .collect();
        residues.sort_by(|(sa, ma), (sb, mb)| ma.cmp(mb).then_with(|| sa.cmp(sb)));
        residues
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Knapsack {
    parameters: KnapsackParameters,
    residues: Vec<(String, i64)>,
    reachable: MassBitset,
    backpointers: Vec<u8>,
}

impl Knapsack {
    /// Builds the feasibility index.
    ///
    /// Masses are given in Da and scaled by `mass_scale` (rounded). Negative
    /// scaled masses fail with [`KnapsackError::InvalidResidueMass`]: loss
    /// modifications must be replaced with a sentinel mass by the caller (see
    /// [`ResidueSet::knapsack_inputs`]). Zero-mass residues never extend
    /// reachability.
    pub fn construct(
        residue_masses: &BTreeMap<String, f64>,
        residue_indices: &BTreeMap<String, usize>,
        max_mass: f64,
        mass_scale: i64,
    ) -> Result<Self, KnapsackError> {
        Self::from_parameters(KnapsackParameters::scaled(
            residue_masses,
            residue_indices,
            max_mass,
            mass_scale,
        )?)
    }

    /// Builds the index for a residue set, mapping non-positive masses to `sentinel_mass`.
    pub fn for_residues(
        residues: &ResidueSet,
        max_mass: f64,
        sentinel_mass: f64,
    ) -> Result<Self, KnapsackError> {
        Self::from_parameters(KnapsackParameters::for_residues(
            residues,
            max_mass,
            sentinel_mass,
        )?)
    }

    #[instrument(skip_all, name = "knapsack_construction", fields(max_mass = parameters.max_mass, residues = parameters.residue_masses.len()))]
    pub fn from_parameters(parameters: KnapsackParameters) -> Result<Self, KnapsackError> {
        parameters.validate()?;
        let residues = parameters.ordered_residues();
        let size = table_size(parameters.max_mass)?;

        info!("Building knapsack feasibility table with {} cells.", size);
        let mut reachable = MassBitset::new(size);
        let mut backpointers = vec![NO_RESIDUE; size];
        reachable.set(0);

        for m in 1..size {
            for (pos, &(_, mass)) in residues.iter().enumerate() {
                let mass = mass as usize;
                if mass > m {
                    break;
                }
                if mass > 0 && reachable.get(m - mass) {
                    reachable.set(m);
                    backpointers[m] = pos as u8;
                    break;
                }
            }
        }

        debug!("Knapsack feasibility table complete.");
        Ok(Self {
            parameters,
            residues,
            reachable,
            backpointers,
        })
    }

    pub fn parameters(&self) -> &KnapsackParameters {
        &self.parameters
    }

    pub fn max_mass(&self) -> i64 {
        self.parameters.max_mass
    }

    pub fn mass_scale(&self) -> i64 {
        self.parameters.mass_scale
    }

    /// Whether some multiset of residues sums exactly to the scaled `mass`.
    pub fn is_reachable(&self, mass: i64) -> bool {
        mass >= 0 && mass <= self.max_mass() && self.reachable.get(mass as usize)
    }

    /// Whether the mass still missing from `current_mass` can be closed by residues.
    ///
    /// True iff some reachable mass lies in
    /// `[target - current - tolerance, target - current + tolerance] ∩ [0, max_mass]`.
    pub fn feasible_remaining(&self, current_mass: i64, target_mass: i64, tolerance: i64) -> bool {
        let remaining = target_mass.saturating_sub(current_mass);
        let lo = remaining.saturating_sub(tolerance).max(0);
        let hi = remaining.saturating_add(tolerance).min(self.max_mass());
        lo <= hi && self.reachable.any_in(lo as usize, hi as usize)
    }

    /// One residue decomposition of `mass`, reconstructed from the backpointers.
    ///
    /// Returns `None` for unreachable masses and for backpointers that do not
    /// lead back to mass zero.
    pub fn decompose(&self, mass: i64) -> Option<Vec<String>> {
        if !self.is_reachable(mass) {
            return None;
        }
        let mut composition = Vec::new();
        let mut m = mass as usize;
        while m > 0 {
            let (symbol, residue_mass) = self.backpointer_step(m)?;
            composition.push(symbol.to_string());
            m -= residue_mass;
        }
        Some(composition)
    }

    /// The residue recorded for reachable cell `m > 0`, if it is a valid step
    /// to another reachable cell.
    fn backpointer_step(&self, m: usize) -> Option<(&str, usize)> {
        let (symbol, mass) = self.residues.get(*self.backpointers.get(m)? as usize)?;
        let mass = usize::try_from(*mass).ok().filter(|&mass| mass > 0 && mass <= m)?;
        self.reachable
            .get(m - mass)
            .then_some((symbol.as_str(), mass))
    }

    /// Verifies that every reachable cell steps back to mass zero.
    fn check_backpointers(&self) -> Result<(), KnapsackError> {
        match (1..self.reachable.len())
            .find(|&m| self.reachable.get(m) && self.backpointer_step(m).is_none())
        {
            Some(m) => Err(KnapsackError::Corrupt(format!(
                "backpointer {} of reachable mass {m} does not lead to a reachable mass",
                self.backpointers[m]
            ))),
            None => Ok(()),
        }
    }

    /// Checks that this index was built for `residues`.
    ///
    /// The mass scale and symbol-to-index mapping must agree. Residues with a
    /// positive mass must have the same scaled mass; residues the set carries
    /// with a non-positive mass must have been replaced by a positive sentinel.
    pub fn check_compatible(&self, residues: &ResidueSet) -> Result<(), KnapsackError> {
        if self.mass_scale() != residues.mass_scale() {
            return Err(KnapsackError::ParameterMismatch(format!(
                "mass scale {} differs from residue set scale {}",
                self.mass_scale(),
                residues.mass_scale()
            )));
        }
        if self.parameters.residue_masses.len() != residues.residue_count() {
            return Err(KnapsackError::ParameterMismatch(format!(
                "knapsack has {} residues, residue set has {}",
                self.parameters.residue_masses.len(),
                residues.residue_count()
            )));
        }
        for (index, symbol, mass) in residues.residues() {
            let knapsack_index = self.parameters.residue_indices.get(symbol);
            let knapsack_mass = self.parameters.residue_masses.get(symbol);
            let (Some(&knapsack_index), Some(&knapsack_mass)) = (knapsack_index, knapsack_mass)
            else {
                return Err(KnapsackError::ParameterMismatch(format!(
                    "residue '{symbol}' is missing from the knapsack"
                )));
            };
            if knapsack_index != index {
                return Err(KnapsackError::ParameterMismatch(format!(
                    "residue '{symbol}' has index {knapsack_index} in the knapsack but {index} in the residue set"
                )));
            }
            let scaled = residues.scale(mass);
            let consistent = if scaled > 0 {
                knapsack_mass == scaled
            } else {
                knapsack_mass > 0
            };
            if !consistent {
                return Err(KnapsackError::ParameterMismatch(format!(
                    "residue '{symbol}' has scaled mass {knapsack_mass} in the knapsack but {scaled} in the residue set"
                )));
            }
        }
        Ok(())
    }
}

fn table_size(max_mass: i64) -> Result<usize, KnapsackError> {
    usize::try_from(max_mass)
        .ok()
        .and_then(|m| m.checked_add(1))
        .ok_or_else(|| {
            KnapsackError::InvalidConfiguration(format!("maximum mass {max_mass} is out of range"))
        })
}
