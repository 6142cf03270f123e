//! # Core Module
//!
//! The stateless foundation of the library: crystal models, periodic
//! connectivity perception and file exchange.
//!
//! ## Architecture
//!
//! - **Crystal Representation** ([`models`]) - Cells, symmetry, atoms, molecules and dimers
//! - **Connectivity** ([`connectivity`]) - Periodic bond graph construction and molecule extraction
//! - **File I/O** ([`io`]) - TOML crystal descriptions and CSV bond overrides
//! - **Geometry** ([`utils`]) - Fractional wrapping, minimum image and centroid helpers

pub mod connectivity;
pub mod io;
pub mod models;
pub mod utils;
