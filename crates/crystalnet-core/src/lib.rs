//! # CrystalNet Core Library
//!
//! Periodic connectivity perception and symmetry-unique dimer enumeration for
//! molecular crystals.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless crystal models (`UnitCell`,
//!   `SymmetryOperation`, `Crystal`, `Molecule`), the periodic bond graph and its
//!   builder, and the TOML/CSV readers for crystals and bond overrides.
//!
//! - **[`engine`]: The Logic Core.** Molecular neighbor search and the
//!   `DimerMappingTable`, which collapses every discovered molecular pair onto a
//!   single representative under lattice translation, member exchange and the
//!   crystal's symmetry operations.
//!
//! - **[`workflows`]: The Public API.** Complete analyses that load inputs, run
//!   the engine and report progress, returning everything they computed in one
//!   value.

pub mod core;
pub mod engine;
pub mod workflows;
