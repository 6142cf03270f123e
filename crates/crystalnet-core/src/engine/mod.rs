//! # Engine Module
//!
//! The stateful layer between the crystal models and the workflows: molecular
//! neighbor search, the symmetry-aware dimer mapping table, and the
//! configuration, error and progress types they share.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Analysis parameters assembled through a validating builder
//! - **Neighbor Search** ([`neighbors`]) - Translated molecule pairs within an interaction radius
//! - **Dimer Mapping** ([`mapping`]) - Canonicalization of dimers and their symmetry orbits
//! - **Progress Monitoring** ([`progress`]) - Callback-based phase and task reporting
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! The neighbor search runs one task per unit-cell molecule and is
//! parallelized with rayon when the `parallel` feature is enabled.

pub mod config;
pub mod error;
pub mod mapping;
pub mod neighbors;
pub mod progress;
