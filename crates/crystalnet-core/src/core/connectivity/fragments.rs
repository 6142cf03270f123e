use super::graph::{ConnectionType, PeriodicBondGraph};
use crate::core::models::cell::UnitCell;
use crate::core::models::crystal::UnitCellAtoms;
use crate::core::models::hkl::HKL;
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, instrument, warn};

/// Splits the unit cell into molecules along its covalent bonds.
///
/// Components are discovered in unit-cell atom order. Each atom is placed at
/// the lattice image reached by walking bonds from the first atom of its
/// component, so molecules spanning a cell face come out whole; the whole
/// molecule is then shifted so its centroid lies inside the reference cell.
/// Molecules with the same multiset of asymmetric-unit atoms share an
/// `asymmetric_idx`, numbered in order of first appearance.
#[instrument(skip_all, name = "extract_molecules")]
pub fn extract_molecules(
    cell: &UnitCell,
    atoms: &UnitCellAtoms,
    graph: &PeriodicBondGraph,
) -> Vec<Molecule> {
    let num_atoms = atoms.len();
    let mut shift_of: Vec<Option<HKL>> = vec![None; num_atoms];
    let mut molecules = Vec::new();
    let mut classes: HashMap<Vec<usize>, usize> = HashMap::new();
    let mut polymeric = 0usize;

    for seed in 0..num_atoms {
        if shift_of[seed].is_some() {
            continue;
        }
        shift_of[seed] = Some(HKL::ZERO);
        let mut members = vec![(seed, HKL::ZERO)];
        let mut queue = VecDeque::from([seed]);

        while let Some(current) = queue.pop_front() {
            let Some(current_shift) = shift_of[current] else {
                continue;
            };
            for edge in graph
                .edges_from(current)
                .filter(|e| e.connection_type == ConnectionType::CovalentBond)
            {
                let target_shift = current_shift + edge.hkl;
                match shift_of[edge.target] {
                    None => {
                        shift_of[edge.target] = Some(target_shift);
                        members.push((edge.target, target_shift));
                        queue.push_back(edge.target);
                    }
                    Some(existing) if existing != target_shift => polymeric += 1,
                    Some(_) => {}
                }
            }
        }

        let mut molecule = assemble(cell, atoms, &members, molecules.len());
        let next_class = classes.len();
        molecule.asymmetric_idx = *classes.entry(molecule.composition_key()).or_insert(next_class);
        molecules.push(molecule);
    }

    if polymeric > 0 {
        warn!(
            closures = polymeric,
            "Covalent network is periodic; molecules were cut where a bond closes around the lattice."
        );
    }
    debug!(
        molecules = molecules.len(),
        asymmetric_molecules = classes.len(),
        "Extracted unit cell molecules."
    );
    molecules
}

fn assemble(
    cell: &UnitCell,
    atoms: &UnitCellAtoms,
    members: &[(usize, HKL)],
    unit_cell_idx: usize,
) -> Molecule {
    let raw: Vec<_> = members
        .iter()
        .map(|&(i, shift)| atoms.frac_pos[i] + shift.to_vector())
        .collect();
    let mean = raw.iter().sum::<nalgebra::Vector3<f64>>() / raw.len() as f64;
    let (_, recenter) = geometry::wrap_fractional(&mean);

    let mut uc_atom_indices = Vec::with_capacity(members.len());
    let mut shifts = Vec::with_capacity(members.len());
    let mut asym_atom_indices = Vec::with_capacity(members.len());
    let mut atomic_numbers = Vec::with_capacity(members.len());
    let mut positions = Vec::with_capacity(members.len());
    for (&(i, shift), frac) in members.iter().zip(raw) {
        uc_atom_indices.push(i);
        shifts.push(shift - recenter);
        asym_atom_indices.push(atoms.asym_idx[i]);
        atomic_numbers.push(atoms.atomic_numbers[i]);
        positions.push(cell.to_cartesian(&(frac - recenter.to_vector())));
    }

    Molecule::new(
        uc_atom_indices,
        shifts,
        asym_atom_indices,
        atomic_numbers,
        positions,
        unit_cell_idx,
    )
}
