use super::asymmetric_unit::AsymmetricUnit;
use super::cell::{CellError, UnitCell};
use super::element::ElementError;
use super::hkl::HKL;
use super::molecule::Molecule;
use super::symmetry::{SymmetryOperation, SymmetryParseError};
use crate::core::connectivity::builder::{ConnectivityParams, UnitCellConnectivityBuilder};
use crate::core::connectivity::fragments;
use crate::core::connectivity::graph::PeriodicBondGraph;
use crate::core::connectivity::overrides::BondOverrides;
use crate::core::utils::geometry;
use itertools::iproduct;
use nalgebra::{Point3, Vector3};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

/// Cartesian distance below which two symmetry images are the same site.
pub const SITE_MERGE_TOLERANCE: f64 = 1e-2;

#[derive(Debug, Error)]
pub enum CrystalError {
    #[error("Invalid unit cell: {0}")]
    Cell(#[from] CellError),
    #[error("Invalid symmetry operation: {0}")]
    Symmetry(#[from] SymmetryParseError),
    #[error("Element lookup failed: {0}")]
    Element(#[from] ElementError),
    #[error("The asymmetric unit contains no atoms")]
    EmptyAsymmetricUnit,
}

/// All atoms inside one unit cell, generated from the asymmetric unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitCellAtoms {
    pub frac_pos: Vec<Vector3<f64>>,
    pub cart_pos: Vec<Point3<f64>>,
    pub asym_idx: Vec<usize>,
    pub atomic_numbers: Vec<u8>,
    /// Index of the symmetry operation that generated each atom.
    pub symop_idx: Vec<usize>,
}

impl UnitCellAtoms {
    pub fn len(&self) -> usize {
        self.frac_pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frac_pos.is_empty()
    }
}

/// The unit-cell atoms replicated over a block of lattice translations.
///
/// Entries are stored cell-major: slab index `i` is unit-cell atom
/// `i % unit_cell_size` in cell `hkl[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrystalAtomRegion {
    pub frac_pos: Vec<Vector3<f64>>,
    pub cart_pos: Vec<Point3<f64>>,
    pub asym_idx: Vec<usize>,
    pub atomic_numbers: Vec<u8>,
    pub hkl: Vec<HKL>,
    unit_cell_size: usize,
}

impl CrystalAtomRegion {
    pub fn len(&self) -> usize {
        self.frac_pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frac_pos.is_empty()
    }

    pub fn unit_cell_size(&self) -> usize {
        self.unit_cell_size
    }

    /// Folds a slab index back onto the unit-cell atom it is an image of.
    pub fn unit_cell_index(&self, slab_idx: usize) -> usize {
        slab_idx % self.unit_cell_size
    }
}

#[derive(Debug, Clone)]
pub struct Crystal {
    asymmetric_unit: AsymmetricUnit,
    unit_cell: UnitCell,
    symmetry_operations: Vec<SymmetryOperation>,
    unit_cell_atoms: UnitCellAtoms,
    connectivity_params: ConnectivityParams,
    bond_overrides: BondOverrides,
    connectivity: OnceLock<PeriodicBondGraph>,
    molecules: OnceLock<Vec<Molecule>>,
}

impl Crystal {
    /// Assembles a crystal and expands the asymmetric unit into the unit cell.
    ///
    /// The identity operation is prepended when missing so the asymmetric
    /// unit itself is always part of the unit cell.
    pub fn new(
        asymmetric_unit: AsymmetricUnit,
        unit_cell: UnitCell,
        symmetry_operations: Vec<SymmetryOperation>,
    ) -> Result<Self, CrystalError> {
        if asymmetric_unit.is_empty() {
            return Err(CrystalError::EmptyAsymmetricUnit);
        }
        let mut symmetry_operations = symmetry_operations;
        if !symmetry_operations.iter().any(SymmetryOperation::is_identity) {
            symmetry_operations.insert(0, SymmetryOperation::identity());
        }

        let unit_cell_atoms =
            generate_unit_cell_atoms(&asymmetric_unit, &unit_cell, &symmetry_operations);
        debug!(
            asymmetric_atoms = asymmetric_unit.len(),
            symmetry_operations = symmetry_operations.len(),
            unit_cell_atoms = unit_cell_atoms.len(),
            "Generated unit cell atoms."
        );

        Ok(Self {
            asymmetric_unit,
            unit_cell,
            symmetry_operations,
            unit_cell_atoms,
            connectivity_params: ConnectivityParams::default(),
            bond_overrides: BondOverrides::new(),
            connectivity: OnceLock::new(),
            molecules: OnceLock::new(),
        })
    }

    /// Parses CIF-style operation strings and assembles the crystal.
    pub fn from_symops_str<S: AsRef<str>>(
        asymmetric_unit: AsymmetricUnit,
        unit_cell: UnitCell,
        symops: &[S],
    ) -> Result<Self, CrystalError> {
        let ops = symops
            .iter()
            .map(|s| s.as_ref().parse::<SymmetryOperation>())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(asymmetric_unit, unit_cell, ops)
    }

    pub fn with_bond_overrides(mut self, overrides: BondOverrides) -> Self {
        self.bond_overrides = overrides;
        self.reset_caches();
        self
    }

    pub fn with_connectivity_params(mut self, params: ConnectivityParams) -> Self {
        self.connectivity_params = params;
        self.reset_caches();
        self
    }

    fn reset_caches(&mut self) {
        self.connectivity = OnceLock::new();
        self.molecules = OnceLock::new();
    }

    pub fn asymmetric_unit(&self) -> &AsymmetricUnit {
        &self.asymmetric_unit
    }

    pub fn unit_cell(&self) -> &UnitCell {
        &self.unit_cell
    }

    pub fn symmetry_operations(&self) -> &[SymmetryOperation] {
        &self.symmetry_operations
    }

    pub fn unit_cell_atoms(&self) -> &UnitCellAtoms {
        &self.unit_cell_atoms
    }

    pub fn connectivity_params(&self) -> &ConnectivityParams {
        &self.connectivity_params
    }

    pub fn bond_overrides(&self) -> &BondOverrides {
        &self.bond_overrides
    }

    /// Replicates the unit-cell atoms over every cell from `lower` to `upper` inclusive.
    pub fn slab(&self, lower: HKL, upper: HKL) -> CrystalAtomRegion {
        let atoms = &self.unit_cell_atoms;
        let cells: Vec<HKL> = iproduct!(lower.h..=upper.h, lower.k..=upper.k, lower.l..=upper.l)
            .map(|(h, k, l)| HKL::new(h, k, l))
            .collect();

        let n = cells.len() * atoms.len();
        let mut region = CrystalAtomRegion {
            frac_pos: Vec::with_capacity(n),
            cart_pos: Vec::with_capacity(n),
            asym_idx: Vec::with_capacity(n),
            atomic_numbers: Vec::with_capacity(n),
            hkl: Vec::with_capacity(n),
            unit_cell_size: atoms.len(),
        };
        for hkl in cells {
            let shift = hkl.to_vector();
            for i in 0..atoms.len() {
                let frac = atoms.frac_pos[i] + shift;
                region.cart_pos.push(self.unit_cell.to_cartesian(&frac));
                region.frac_pos.push(frac);
                region.asym_idx.push(atoms.asym_idx[i]);
                region.atomic_numbers.push(atoms.atomic_numbers[i]);
                region.hkl.push(hkl);
            }
        }
        region
    }

    /// The periodic bond graph of the unit cell, built on first use.
    pub fn unit_cell_connectivity(&self) -> &PeriodicBondGraph {
        self.connectivity.get_or_init(|| {
            UnitCellConnectivityBuilder::new(self, self.connectivity_params)
                .build(self.bond_overrides.clone())
        })
    }

    /// Molecules of the unit cell, extracted from the covalent bond graph on first use.
    pub fn unit_cell_molecules(&self) -> &[Molecule] {
        self.molecules.get_or_init(|| {
            fragments::extract_molecules(
                &self.unit_cell,
                &self.unit_cell_atoms,
                self.unit_cell_connectivity(),
            )
        })
    }

    /// Number of symmetry-independent molecules.
    pub fn num_asymmetric_molecules(&self) -> usize {
        self.unit_cell_molecules()
            .iter()
            .map(|m| m.asymmetric_idx + 1)
            .max()
            .unwrap_or(0)
    }
}

fn generate_unit_cell_atoms(
    asym: &AsymmetricUnit,
    cell: &UnitCell,
    symops: &[SymmetryOperation],
) -> UnitCellAtoms {
    let mut atoms = UnitCellAtoms::default();
    let tolerance_sq = SITE_MERGE_TOLERANCE * SITE_MERGE_TOLERANCE;

    for (symop_idx, op) in symops.iter().enumerate() {
        for (asym_idx, pos) in asym.positions.iter().enumerate() {
            let (frac, _) = geometry::wrap_fractional(&op.apply(pos));

            let duplicate = atoms
                .frac_pos
                .iter()
                .zip(atoms.asym_idx.iter())
                .any(|(existing, &existing_asym)| {
                    existing_asym == asym_idx && {
                        let delta = geometry::minimum_image(&(frac - existing));
                        cell.displacement_to_cartesian(&delta).norm_squared() < tolerance_sq
                    }
                });
            if duplicate {
                continue;
            }

            atoms.cart_pos.push(cell.to_cartesian(&frac));
            atoms.frac_pos.push(frac);
            atoms.asym_idx.push(asym_idx);
            atoms.atomic_numbers.push(asym.atomic_numbers[asym_idx]);
            atoms.symop_idx.push(symop_idx);
        }
    }
    atoms
}
