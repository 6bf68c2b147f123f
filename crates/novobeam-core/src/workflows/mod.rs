//! # Workflows Module
//!
//! High-level entry points that run the decoding engine over whole batches of
//! spectra.
//!
//! ## Architecture
//!
//! - **Decode Workflow** ([`decode`]) - Decodes a batch of spectra against one
//!   shared engine, isolating per-spectrum failures and reporting progress.

pub mod decode;
