//! Readers for the files that describe a crystal and its connectivity overrides.
//!
//! Crystals are exchanged as TOML documents (cell, symmetry operations and the
//! asymmetric unit); bond overrides as CSV tables keyed by unit-cell atom index
//! and lattice offset.

pub mod crystal;
pub mod error;
pub mod overrides;

pub use error::LoadError;
