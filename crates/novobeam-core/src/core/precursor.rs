use super::residues::masses::{H2O_MASS, PROTON_MASS_AMU};
use super::residues::ResidueSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PrecursorError {
    #[error("Precursor m/z must be finite and positive, got {0}")]
    InvalidMz(f64),

    #[error("Precursor charge must be at least 1")]
    ZeroCharge,

    #[error("Mass tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),

    #[error("Scaled precursor mass {0} is outside the integer mass lattice")]
    OutOfRange(f64),
}

/// Largest magnitude a scaled mass may have; every such `f64` is an exact integer.
const MAX_LATTICE_MASS: f64 = 9_007_199_254_740_992.0;

fn to_lattice(scaled: f64) -> Result<i64, PrecursorError> {
    if !scaled.is_finite() || scaled.abs() > MAX_LATTICE_MASS {
        return Err(PrecursorError::OutOfRange(scaled));
    }
    Ok(scaled as i64)
}

/// Precursor mass tolerance, either relative (ppm) or absolute (Da).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MassTolerance {
    Ppm(f64),
    Da(f64),
}

impl MassTolerance {
    fn value(self) -> f64 {
        match self {
            MassTolerance::Ppm(v) | MassTolerance::Da(v) => v,
        }
    }

    pub fn validate(self) -> Result<(), PrecursorError> {
        let value = self.value();
        if !value.is_finite() || value < 0.0 {
            return Err(PrecursorError::InvalidTolerance(value));
        }
        Ok(())
    }

    /// Absolute tolerance in Da around `mass`.
    pub fn absolute(self, mass: f64) -> f64 {
        match self {
            MassTolerance::Ppm(ppm) => mass * ppm / 1e6,
            MassTolerance::Da(da) => da,
        }
    }
}

impl Default for MassTolerance {
    fn default() -> Self {
        MassTolerance::Ppm(50.0)
    }
}

impl fmt::Display for MassTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MassTolerance::Ppm(v) => write!(f, "{v} ppm"),
            MassTolerance::Da(v) => write!(f, "{v} Da"),
        }
    }
}

/// The observed precursor ion of a spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Precursor {
    pub mz: f64,
    pub charge: u8,
}

impl Precursor {
    pub fn new(mz: f64, charge: u8) -> Result<Self, PrecursorError> {
        if !mz.is_finite() || mz <= 0.0 {
            return Err(PrecursorError::InvalidMz(mz));
        }
        if charge == 0 {
            return Err(PrecursorError::ZeroCharge);
        }
        Ok(Self { mz, charge })
    }

    /// Neutral monoisotopic mass of the precursor.
    pub fn neutral_mass(&self) -> f64 {
        let z = f64::from(self.charge);
        self.mz * z - z * PROTON_MASS_AMU
    }

    /// Sum of residue masses the peptide must add up to.
    pub fn residue_mass(&self) -> f64 {
        self.neutral_mass() - H2O_MASS
    }

    /// Builds the scaled search window for this precursor.
    ///
    /// Fails with [`PrecursorError::OutOfRange`] when the target or its upper
    /// bound does not fit the integer lattice.
    pub fn window(
        &self,
        residues: &ResidueSet,
        tolerance: MassTolerance,
    ) -> Result<PrecursorWindow, PrecursorError> {
        tolerance.validate()?;
        let scale = residues.mass_scale() as f64;
        let target = to_lattice((self.residue_mass() * scale).round())?;
        let tolerance_da = tolerance.absolute(self.neutral_mass());
        let tolerance = to_lattice((tolerance_da * scale).ceil())?;
        target
            .checked_add(tolerance)
            .ok_or(PrecursorError::OutOfRange(tolerance_da * scale))?;
        Ok(PrecursorWindow { target, tolerance })
    }
}

/// Target residue mass and tolerance on the integer mass lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrecursorWindow {
    pub target: i64,
    pub tolerance: i64,
}

impl PrecursorWindow {
    pub fn upper(&self) -> i64 {
        self.target.saturating_add(self.tolerance)
    }

    /// Mass still needed to reach the target; negative once it is overshot.
    pub fn remaining(&self, mass: i64) -> i64 {
        self.target.saturating_sub(mass)
    }

    pub fn contains(&self, mass: i64) -> bool {
        u64::try_from(self.tolerance).is_ok_and(|tolerance| mass.abs_diff(self.target) <= tolerance)
    }

    pub fn exceeded_by(&self, mass: i64) -> bool {
        mass > self.upper()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn residues() -> ResidueSet {
        ResidueSet::new([("G", 57.02), ("A", 71.04)], 100).unwrap()
    }

    #[test]
    fn new_rejects_invalid_precursors() {
        assert_eq!(Precursor::new(0.0, 2), Err(PrecursorError::InvalidMz(0.0)));
        assert!(matches!(
            Precursor::new(f64::NAN, 2),
            Err(PrecursorError::InvalidMz(_))
        ));
        assert_eq!(Precursor::new(500.0, 0), Err(PrecursorError::ZeroCharge));
    }

    #[test]
    fn neutral_mass_removes_charge_protons() {
        let precursor = Precursor::new(500.0, 2).unwrap();
        assert!((precursor.neutral_mass() - (1000.0 - 2.0 * PROTON_MASS_AMU)).abs() < 1e-9);
        assert!((precursor.residue_mass() - (precursor.neutral_mass() - H2O_MASS)).abs() < 1e-9);
    }

    #[test]
    fn window_scales_target_and_tolerance() {
        let residue_mass = 2.0 * 71.04;
        let mz = residue_mass + H2O_MASS + PROTON_MASS_AMU;
        let precursor = Precursor::new(mz, 1).unwrap();

        let window = precursor
            .window(&residues(), MassTolerance::Da(0.02))
            .unwrap();
        assert_eq!(window.target, 14208);
        assert_eq!(window.tolerance, 2);
        assert!(window.contains(14208));
        assert!(window.contains(14210));
        assert!(!window.contains(14211));
        assert!(window.exceeded_by(14211));
        assert!(!window.exceeded_by(14000));
        assert_eq!(window.remaining(7104), 7104);
        assert_eq!(window.remaining(14300), -92);
    }

    #[test]
    fn ppm_tolerance_is_relative_to_neutral_mass() {
        let tolerance = MassTolerance::Ppm(10.0);
        assert!((tolerance.absolute(1000.0) - 0.01).abs() < 1e-12);
        assert_eq!(MassTolerance::Da(0.5).absolute(1000.0), 0.5);
    }

    #[test]
    fn window_rejects_values_beyond_the_lattice() {
        let precursor = Precursor::new(100.0, 1).unwrap();
        assert!(matches!(
            precursor.window(&residues(), MassTolerance::Da(1e300)),
            Err(PrecursorError::OutOfRange(_))
        ));

        let heavy = Precursor::new(1e300, 1).unwrap();
        assert!(matches!(
            heavy.window(&residues(), MassTolerance::Ppm(50.0)),
            Err(PrecursorError::OutOfRange(_))
        ));
    }

    #[test]
    fn window_bounds_saturate_instead_of_overflowing() {
        let window = PrecursorWindow {
            target: i64::MAX - 1,
            tolerance: 10,
        };
        assert_eq!(window.upper(), i64::MAX);
        assert!(!window.exceeded_by(i64::MAX));
        assert!(window.contains(i64::MAX));
        assert!(!window.contains(i64::MIN));
        assert_eq!(window.remaining(i64::MIN), i64::MAX);
    }

    #[test]
    fn window_rejects_negative_tolerance() {
        let precursor = Precursor::new(500.0, 2).unwrap();
        assert!(matches!(
            precursor.window(&residues(), MassTolerance::Ppm(-1.0)),
            Err(PrecursorError::InvalidTolerance(_))
        ));
    }
}
