//! # novobeam Core Library
//!
//! Mass-constrained beam-search decoding for de novo peptide sequencing. Given a
//! model that scores the next residue of a peptide from a spectrum and a prefix,
//! the library searches for the highest-probability sequences, optionally pruning
//! any branch whose remaining mass can never close the observed precursor mass.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data: the residue mass table and
//!   vocabulary (`ResidueSet`), the precursor mass window, the knapsack
//!   feasibility index with its on-disk format, and the `Scorer` boundary to the
//!   external sequencing model.
//!
//! - **[`engine`]: The Logic Core.** The stateful search: decoding configuration,
//!   beams, the beam-search engine itself, the sequence aggregator, progress
//!   reporting and cooperative cancellation.
//!
//! - **[`workflows`]: The Public API.** Batch entry points that decode many
//!   spectra in parallel while sharing one read-only knapsack and scorer.

pub mod core;
pub mod engine;
pub mod workflows;
