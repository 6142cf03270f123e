use super::cell::UnitCell;
use super::hkl::HKL;
use crate::core::utils::geometry;
use nalgebra::Point3;

/// A covalently bonded group of unit-cell atoms, whole in Cartesian space.
///
/// Each atom remembers the unit-cell atom it is an image of and the lattice
/// shift that places it next to its bonded neighbors.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub uc_atom_indices: Vec<usize>,
    pub shifts: Vec<HKL>,
    pub asym_atom_indices: Vec<usize>,
    pub atomic_numbers: Vec<u8>,
    pub positions: Vec<Point3<f64>>,
    /// Index of this molecule among the unit-cell molecules.
    pub unit_cell_idx: usize,
    /// Index of the symmetry-independent molecule this one is a copy of.
    pub asymmetric_idx: usize,
    /// Lattice translation applied relative to the unit-cell molecule.
    pub cell_shift: HKL,
    centroid: Point3<f64>,
}

impl Molecule {
    pub fn new(
        uc_atom_indices: Vec<usize>,
        shifts: Vec<HKL>,
        asym_atom_indices: Vec<usize>,
        atomic_numbers: Vec<u8>,
        positions: Vec<Point3<f64>>,
        unit_cell_idx: usize,
    ) -> Self {
        let centroid = geometry::centroid(&positions).unwrap_or_else(Point3::origin);
        Self {
            uc_atom_indices,
            shifts,
            asym_atom_indices,
            atomic_numbers,
            positions,
            unit_cell_idx,
            asymmetric_idx: 0,
            cell_shift: HKL::ZERO,
            centroid,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn centroid(&self) -> Point3<f64> {
        self.centroid
    }

    pub fn bounding_radius(&self) -> f64 {
        geometry::bounding_radius(&self.centroid, &self.positions)
    }

    /// A copy of this molecule moved by a lattice translation.
    pub fn translated(&self, cell: &UnitCell, hkl: HKL) -> Self {
        let t = cell.translation(hkl);
        let mut moved = self.clone();
        for p in moved.positions.iter_mut() {
            *p += t;
        }
        for s in moved.shifts.iter_mut() {
            *s += hkl;
        }
        moved.centroid += t;
        moved.cell_shift += hkl;
        moved
    }

    /// Sorted asymmetric-unit atom indices; equal for symmetry copies.
    pub fn composition_key(&self) -> Vec<usize> {
        let mut key = self.asym_atom_indices.clone();
        key.sort_unstable();
        key
    }
}
