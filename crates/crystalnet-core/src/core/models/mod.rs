//! # Core Models Module
//!
//! Data structures describing a molecular crystal, from lattice indices up to
//! molecules and molecular pairs.
//!
//! ## Key Components
//!
//! - [`hkl`] - Lattice translations and periodic site / dimer indices
//! - [`cell`] - Unit cell parameters and fractional/Cartesian conversion
//! - [`symmetry`] - Space-group symmetry operations in CIF triplet notation
//! - [`element`] - Static element table with covalent and van der Waals radii
//! - [`asymmetric_unit`] - The symmetry-independent atoms of a structure
//! - [`crystal`] - The expanded unit cell, slab generation and cached connectivity
//! - [`molecule`] - Covalently bonded fragments, whole in Cartesian space
//! - [`dimer`] - Pairs of molecules
//!
//! ## Usage
//!
//! ```ignore
//! use crystalnet::core::models::{asymmetric_unit::AsymmetricUnit, cell::UnitCell, crystal::Crystal};
//!
//! let mut asym = AsymmetricUnit::new();
//! asym.add_atom_by_symbol("O1", "O", Vector3::new(0.1, 0.2, 0.3))?;
//! let crystal = Crystal::from_symops_str(asym, UnitCell::cubic(8.0)?, &["x,y,z", "-x,-y,-z"])?;
//! let molecules = crystal.unit_cell_molecules();
//! ```

pub mod asymmetric_unit;
pub mod cell;
pub mod crystal;
pub mod dimer;
pub mod element;
pub mod hkl;
pub mod molecule;
pub mod symmetry;
