//! # Core Module
//!
//! Stateless building blocks for mass-constrained peptide decoding.
//!
//! - **Residues** ([`residues`]) - Monoisotopic mass table and the ordered token vocabulary
//! - **Precursor** ([`precursor`]) - Observed precursor mass and its scaled tolerance window
//! - **Knapsack** ([`knapsack`]) - Precomputed mass feasibility index and its persistence format
//! - **Scoring** ([`scoring`]) - The boundary to the external next-token model
//!
//! Masses that take part in feasibility decisions live on an integer lattice
//! (`round(mass × mass_scale)`), so accumulation over long sequences is exact.

pub mod knapsack;
pub mod precursor;
pub mod residues;
pub mod scoring;
