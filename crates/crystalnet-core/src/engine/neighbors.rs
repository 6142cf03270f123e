use crate::core::models::crystal::Crystal;
use crate::core::models::dimer::Dimer;
use crate::core::models::hkl::HKL;
use crate::core::models::molecule::Molecule;
use crate::core::utils::geometry;
use crate::engine::progress::{Progress, ProgressReporter};
use itertools::iproduct;
use std::cmp::Ordering;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Molecular pairs found around every unit-cell molecule.
#[derive(Debug, Clone, Default)]
pub struct CrystalDimers {
    pub radius: f64,
    /// For each unit-cell molecule, its neighbors as `(dimer, asymmetric index of b)`,
    /// nearest first.
    pub molecule_neighbors: Vec<Vec<(Dimer, usize)>>,
}

impl CrystalDimers {
    pub fn len(&self) -> usize {
        self.molecule_neighbors.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.molecule_neighbors.iter().all(Vec::is_empty)
    }

    pub fn dimers(&self) -> impl Iterator<Item = &Dimer> + '_ {
        self.molecule_neighbors
            .iter()
            .flat_map(|neighbors| neighbors.iter().map(|(dimer, _)| dimer))
    }
}

/// Finds every translated unit-cell molecule whose closest atom lies within
/// `radius` of some atom of each unit-cell molecule.
#[instrument(skip_all, name = "molecule_neighbor_search")]
pub fn find_molecule_neighbors(
    crystal: &Crystal,
    radius: f64,
    reporter: &ProgressReporter,
) -> CrystalDimers {
    let molecules = crystal.unit_cell_molecules();
    info!(
        molecules = molecules.len(),
        radius, "Searching for molecular neighbors."
    );
    if molecules.is_empty() {
        return CrystalDimers {
            radius,
            molecule_neighbors: Vec::new(),
        };
    }

    let max_extent = molecules
        .iter()
        .map(Molecule::bounding_radius)
        .fold(0.0, f64::max);
    let cutoff = radius + 2.0 * max_extent;
    let spacings = crystal.unit_cell().plane_spacings();
    let span = |d: f64| (cutoff / d).ceil() as i32 + 2;
    let (sh, sk, sl) = (span(spacings.x), span(spacings.y), span(spacings.z));
    let shifts: Vec<HKL> = iproduct!(-sh..=sh, -sk..=sk, -sl..=sl)
        .map(|(h, k, l)| HKL::new(h, k, l))
        .collect();

    reporter.report(Progress::TaskStart {
        total_steps: molecules.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = molecules.iter();

    #[cfg(feature = "parallel")]
    let iterator = molecules.par_iter();

    let molecule_neighbors: Vec<Vec<(Dimer, usize)>> = iterator
        .map(|reference| {
            let neighbors = neighbors_of(crystal, reference, molecules, &shifts, radius);
            reporter.report(Progress::TaskIncrement);
            neighbors
        })
        .collect();

    reporter.report(Progress::TaskFinish);

    let dimers = CrystalDimers {
        radius,
        molecule_neighbors,
    };
    info!(dimers = dimers.len(), "Molecular neighbor search complete.");
    dimers
}

fn neighbors_of(
    crystal: &Crystal,
    reference: &Molecule,
    molecules: &[Molecule],
    shifts: &[HKL],
    radius: f64,
) -> Vec<(Dimer, usize)> {
    let cell = crystal.unit_cell();
    let radius_sq = radius * radius;
    let ref_extent = reference.bounding_radius();
    let mut found = Vec::new();

    for (other, &shift) in iproduct!(molecules.iter(), shifts.iter()) {
        if other.unit_cell_idx == reference.unit_cell_idx && shift.is_zero() {
            continue;
        }
        let t = cell.translation(shift);
        let centroid = other.centroid() + t;
        let reach = radius + ref_extent + other.bounding_radius();
        if (centroid - reference.centroid()).norm_squared() > reach * reach {
            continue;
        }

        let moved: Vec<_> = other.positions.iter().map(|p| p + t).collect();
        if geometry::closest_distance_sq(&reference.positions, &moved) < radius_sq {
            let dimer = Dimer::new(reference.clone(), other.translated(cell, shift));
            found.push((dimer, other.asymmetric_idx));
        }
    }

    found.sort_by(|(a, _), (b, _)| {
        a.nearest_distance()
            .partial_cmp(&b.nearest_distance())
            .unwrap_or(Ordering::Equal)
    });
    found
}
