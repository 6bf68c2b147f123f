//! # Engine Module
//!
//! The stateful decoding layer. It drives the iterative extension of candidate
//! peptides against an external [`crate::core::scoring::Scorer`], prunes
//! branches with the knapsack feasibility index, and ranks the finished
//! hypotheses.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Beam width, length limit, mass filter and result policy
//! - **Beams** ([`beam`]) - Partial and finished hypotheses and the scored results handed outward
//! - **Search** ([`search`]) - The beam-search engine; greedy decoding is the width-one case
//! - **Aggregation** ([`aggregate`]) - Ranking and deduplication of terminated beams
//! - **Progress Monitoring** ([`progress`]) - Progress reporting for long batches
//! - **Cancellation** ([`cancel`]) - Cooperative cancellation checked between search steps
//! - **Error Handling** ([`error`]) - Engine-specific error types and error propagation

pub mod aggregate;
pub mod beam;
pub mod cancel;
pub mod config;
pub mod error;
pub mod progress;
pub mod search;
