use super::config::DEFAULT_POSITION_TOLERANCE;
use super::error::DimerError;
use super::neighbors::CrystalDimers;
use crate::core::models::cell::UnitCell;
use crate::core::models::crystal::Crystal;
use crate::core::models::dimer::Dimer;
use crate::core::models::hkl::{DimerIndex, HKL, SiteIndex};
use crate::core::models::symmetry::SymmetryOperation;
use crate::core::utils::geometry;
use nalgebra::Vector3;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Outcome of resolving a fractional point against the unit-cell molecule centroids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionMatch {
    Matched(SiteIndex),
    /// No centroid within tolerance; `hkl` is the cell containing the point.
    Unmatched { hkl: HKL },
}

impl PositionMatch {
    pub fn site(&self) -> Option<SiteIndex> {
        match self {
            Self::Matched(site) => Some(*site),
            Self::Unmatched { .. } => None,
        }
    }

    pub fn hkl(&self) -> HKL {
        match self {
            Self::Matched(site) => site.hkl,
            Self::Unmatched { hkl } => *hkl,
        }
    }
}

/// Identifies which reference centroid, and which periodic image of it, `point` sits on.
///
/// `centroids` are fractional positions inside the reference cell. The nearest
/// centroid under the minimum-image convention is accepted when its fractional
/// distance is below `tolerance`; the returned lattice offset takes that
/// centroid onto `point`.
pub fn find_matching_position(
    centroids: &[Vector3<f64>],
    point: &Vector3<f64>,
    tolerance: f64,
) -> PositionMatch {
    let tolerance_sq = tolerance * tolerance;
    let nearest = centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (i, geometry::minimum_image(&(point - c)).norm_squared()))
        .min_by(|(_, a), (_, b)| a.total_cmp(b));

    match nearest {
        Some((i, dist_sq)) if dist_sq < tolerance_sq => {
            let hkl = HKL::round(&(point - centroids[i]));
            PositionMatch::Matched(SiteIndex::new(i, hkl))
        }
        _ => PositionMatch::Unmatched {
            hkl: HKL::floor(point),
        },
    }
}

/// Moves `a` into the reference cell, keeping the relative offset of `b`.
pub fn normalized_dimer_index(idx: &DimerIndex) -> DimerIndex {
    DimerIndex::new(
        SiteIndex::new(idx.a.offset, HKL::ZERO),
        SiteIndex::new(idx.b.offset, idx.hkl_difference()),
    )
}

/// Maps molecular dimers onto symmetry-unique representatives.
///
/// Built once per crystal from the dimers of a neighbor search. Every input
/// dimer is reduced to a canonical index (translation removed, and optionally
/// the `a`/`b` order), then the orbit of each new canonical dimer under the
/// crystal's symmetry operations is registered against it. The table is
/// immutable after construction.
#[derive(Debug, Clone)]
pub struct DimerMappingTable {
    unit_cell: UnitCell,
    centroids: Vec<Vector3<f64>>,
    unique_dimer_map: HashMap<DimerIndex, DimerIndex>,
    symmetry_unique_dimer_map: HashMap<DimerIndex, DimerIndex>,
    symmetry_related_dimers: HashMap<DimerIndex, Vec<DimerIndex>>,
    unique_dimers: Vec<DimerIndex>,
    consider_inversion: bool,
    position_tolerance: f64,
    unresolved_dimers: usize,
}

impl DimerMappingTable {
    pub fn build_dimer_table(
        crystal: &Crystal,
        dimers: &CrystalDimers,
        consider_inversion: bool,
    ) -> Self {
        Self::build_dimer_table_with_tolerance(
            crystal,
            dimers,
            consider_inversion,
            DEFAULT_POSITION_TOLERANCE,
        )
    }

    #[instrument(skip_all, name = "build_dimer_table")]
    pub fn build_dimer_table_with_tolerance(
        crystal: &Crystal,
        dimers: &CrystalDimers,
        consider_inversion: bool,
        position_tolerance: f64,
    ) -> Self {
        let molecules = crystal.unit_cell_molecules();
        let unit_cell = crystal.unit_cell().clone();
        let centroids = molecules
            .iter()
            .map(|m| geometry::wrap_fractional(&unit_cell.to_fractional(&m.centroid())).0)
            .collect();

        let mut table = Self {
            unit_cell,
            centroids,
            unique_dimer_map: HashMap::new(),
            symmetry_unique_dimer_map: HashMap::new(),
            symmetry_related_dimers: HashMap::new(),
            unique_dimers: Vec::new(),
            consider_inversion,
            position_tolerance,
            unresolved_dimers: 0,
        };

        for dimer in dimers.dimers() {
            match table.dimer_index(dimer) {
                Ok(ab) => table.register(ab, crystal.symmetry_operations()),
                Err(e) => {
                    warn!(error = %e, "Skipping dimer that matches no unit-cell molecules.");
                    table.unresolved_dimers += 1;
                }
            }
        }

        info!(
            input_dimers = dimers.len(),
            unresolved_dimers = table.unresolved_dimers,
            unique_dimers = table.unique_dimers.len(),
            symmetry_unique_dimers = table.symmetry_unique_dimers().len(),
            "Dimer mapping table complete."
        );
        table
    }

    fn register(&mut self, ab: DimerIndex, symmetry_operations: &[SymmetryOperation]) {
        let normalized_ab = normalized_dimer_index(&ab);
        let canonical_ab = self.canonical_dimer_index(&ab);
        debug_assert_ne!(
            canonical_ab.a, canonical_ab.b,
            "a dimer must join two distinct sites"
        );

        if !self.unique_dimer_map.contains_key(&canonical_ab) {
            debug!(dimer = %canonical_ab, "New symmetry-unique dimer.");
            self.unique_dimers.push(canonical_ab);
            self.unique_dimer_map.insert(canonical_ab, canonical_ab);
            self.symmetry_unique_dimer_map
                .insert(canonical_ab, canonical_ab);

            let mut related = Vec::with_capacity(symmetry_operations.len());
            for op in symmetry_operations {
                let Some(image) = self.symmetry_image(&canonical_ab, op) else {
                    warn!(
                        dimer = %canonical_ab,
                        operation = %op,
                        "Symmetry image of dimer matches no unit-cell molecule; skipping."
                    );
                    continue;
                };
                if !self.unique_dimer_map.contains_key(&image) {
                    self.unique_dimers.push(image);
                    self.symmetry_unique_dimer_map.insert(image, canonical_ab);
                }
                self.unique_dimer_map.insert(image, image);
                related.push(image);
            }
            self.symmetry_related_dimers.insert(canonical_ab, related);
        }

        let representative = self
            .symmetry_unique_dimer_map
            .get(&canonical_ab)
            .copied()
            .unwrap_or(canonical_ab);
        for form in [ab, normalized_ab] {
            self.unique_dimer_map.insert(form, canonical_ab);
            self.symmetry_unique_dimer_map.insert(form, representative);
        }
    }

    /// Fractional centroids of the two molecules of a dimer.
    pub fn dimer_positions(&self, dimer: &Dimer) -> (Vector3<f64>, Vector3<f64>) {
        (
            self.unit_cell.to_fractional(&dimer.a().centroid()),
            self.unit_cell.to_fractional(&dimer.b().centroid()),
        )
    }

    pub fn find_matching_position(&self, point: &Vector3<f64>) -> PositionMatch {
        find_matching_position(&self.centroids, point, self.position_tolerance)
    }

    /// Resolves both molecules of a dimer to unit-cell molecule images.
    pub fn dimer_index(&self, dimer: &Dimer) -> Result<DimerIndex, DimerError> {
        let (pos_a, pos_b) = self.dimer_positions(dimer);
        let a = self.resolve(&pos_a, "a")?;
        let b = self.resolve(&pos_b, "b")?;
        Ok(DimerIndex::new(a, b))
    }

    fn resolve(&self, position: &Vector3<f64>, which: &'static str) -> Result<SiteIndex, DimerError> {
        match self.find_matching_position(position) {
            PositionMatch::Matched(site) => Ok(site),
            PositionMatch::Unmatched { hkl } => Err(DimerError::UnmatchedPosition {
                which,
                position: [position.x, position.y, position.z],
                hkl,
            }),
        }
    }

    pub fn normalized_dimer_index(&self, idx: &DimerIndex) -> DimerIndex {
        normalized_dimer_index(idx)
    }

    /// The single representative of `idx` under lattice translation and,
    /// when inversion is considered, exchange of the two molecules.
    pub fn canonical_dimer_index(&self, idx: &DimerIndex) -> DimerIndex {
        let normalized = normalized_dimer_index(idx);
        if !self.consider_inversion {
            return normalized;
        }
        normalized.min(normalized_dimer_index(&idx.swapped()))
    }

    /// Canonical index of the dimer obtained by applying `op` to both molecules of `idx`.
    pub fn symmetry_image(&self, idx: &DimerIndex, op: &SymmetryOperation) -> Option<DimerIndex> {
        let pos_a = op.apply(&self.site_position(&idx.a)?);
        let pos_b = op.apply(&self.site_position(&idx.b)?);
        let a = self.find_matching_position(&pos_a).site()?;
        let b = self.find_matching_position(&pos_b).site()?;
        Some(self.canonical_dimer_index(&DimerIndex::new(a, b)))
    }

    fn site_position(&self, site: &SiteIndex) -> Option<Vector3<f64>> {
        let centroid = self.centroids.get(site.offset)?;
        Some(centroid + site.hkl.to_vector())
    }

    /// The representative whose properties stand for `idx`; unknown dimers map to themselves.
    pub fn symmetry_unique_dimer(&self, idx: &DimerIndex) -> DimerIndex {
        self.symmetry_unique_dimer_map
            .get(idx)
            .or_else(|| {
                self.symmetry_unique_dimer_map
                    .get(&self.canonical_dimer_index(idx))
            })
            .copied()
            .unwrap_or(*idx)
    }

    /// Every symmetry image registered for the canonical form of `idx`, or `[idx]`.
    pub fn symmetry_related_dimers(&self, idx: &DimerIndex) -> Vec<DimerIndex> {
        self.symmetry_related_dimers
            .get(&self.canonical_dimer_index(idx))
            .cloned()
            .unwrap_or_else(|| vec![*idx])
    }

    pub fn have_dimer(&self, idx: &DimerIndex) -> bool {
        self.unique_dimer_map
            .contains_key(&self.canonical_dimer_index(idx))
    }

    /// Canonical dimers in order of registration, symmetry images included.
    pub fn unique_dimers(&self) -> &[DimerIndex] {
        &self.unique_dimers
    }

    /// Unique dimers that represent their own symmetry class.
    pub fn symmetry_unique_dimers(&self) -> Vec<DimerIndex> {
        self.unique_dimers
            .iter()
            .filter(|d| self.symmetry_unique_dimer_map.get(d) == Some(d))
            .copied()
            .collect()
    }

    pub fn consider_inversion(&self) -> bool {
        self.consider_inversion
    }

    pub fn unit_cell(&self) -> &UnitCell {
        &self.unit_cell
    }

    pub fn centroids(&self) -> &[Vector3<f64>] {
        &self.centroids
    }

    /// Input dimers left out of the table because a molecule matched no centroid.
    pub fn unresolved_dimers(&self) -> usize {
        self.unresolved_dimers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::asymmetric_unit::AsymmetricUnit;
    use crate::core::models::molecule::Molecule;
    use crate::engine::neighbors::find_molecule_neighbors;
    use crate::engine::progress::ProgressReporter;

    fn site(offset: usize, h: i32, k: i32, l: i32) -> SiteIndex {
        SiteIndex::new(offset, HKL::new(h, k, l))
    }

    /// Single-atom molecules on a general position of P2_1/c.
    fn monoclinic_crystal() -> Crystal {
        let mut asym = AsymmetricUnit::new();
        asym.add_atom_by_symbol("Kr1", "Kr", Vector3::new(0.15, 0.20, 0.35))
            .unwrap();
        Crystal::from_symops_str(
            asym,
            UnitCell::new(5.2, 6.1, 7.3, 90.0, 104.0, 90.0).unwrap(),
            &["x,y,z", "-x,y+1/2,-z+1/2", "-x,-y,-z", "x,-y+1/2,z+1/2"],
        )
        .unwrap()
    }

    /// Two different single-atom molecules in a P1 cell.
    fn two_molecule_crystal() -> Crystal {
        let mut asym = AsymmetricUnit::new();
        asym.add_atom_by_symbol("Ne1", "Ne", Vector3::new(0.1, 0.1, 0.1))
            .unwrap();
        asym.add_atom_by_symbol("Ar1", "Ar", Vector3::new(0.6, 0.5, 0.4))
            .unwrap();
        Crystal::new(asym, UnitCell::cubic(6.0).unwrap(), vec![]).unwrap()
    }

    fn table_for(crystal: &Crystal, radius: f64, consider_inversion: bool) -> DimerMappingTable {
        let dimers = find_molecule_neighbors(crystal, radius, &ProgressReporter::new());
        DimerMappingTable::build_dimer_table(crystal, &dimers, consider_inversion)
    }

    fn dimer(crystal: &Crystal, a: (usize, HKL), b: (usize, HKL)) -> Dimer {
        let cell = crystal.unit_cell();
        let molecules = crystal.unit_cell_molecules();
        Dimer::new(
            molecules[a.0].translated(cell, a.1),
            molecules[b.0].translated(cell, b.1),
        )
    }

    #[test]
    fn find_matching_position_returns_site_and_lattice_offset() {
        let centroids = vec![Vector3::new(0.1, 0.2, 0.3), Vector3::new(0.7, 0.7, 0.7)];
        let matched = find_matching_position(&centroids, &Vector3::new(1.1, -0.8, 0.305), 1e-2);
        assert_eq!(matched, PositionMatch::Matched(site(0, 1, -1, 0)));
        assert_eq!(matched.site(), Some(site(0, 1, -1, 0)));
    }

    #[test]
    fn find_matching_position_handles_centroids_on_cell_faces() {
        let centroids = vec![Vector3::new(0.0, 0.5, 0.5)];
        let matched = find_matching_position(&centroids, &Vector3::new(0.999, 0.5, 0.5), 1e-2);
        assert_eq!(matched, PositionMatch::Matched(site(0, 1, 0, 0)));
    }

    #[test]
    fn find_matching_position_reports_unmatched_with_cell_offset() {
        let centroids = vec![Vector3::new(0.1, 0.2, 0.3)];
        let result = find_matching_position(&centroids, &Vector3::new(-0.5, 2.5, 0.5), 1e-2);
        assert_eq!(
            result,
            PositionMatch::Unmatched {
                hkl: HKL::new(-1, 2, 0)
            }
        );
        assert_eq!(result.site(), None);
        assert_eq!(result.hkl(), HKL::new(-1, 2, 0));
        assert!(matches!(
            find_matching_position(&[], &Vector3::zeros(), 1e-2),
            PositionMatch::Unmatched { .. }
        ));
    }

    #[test]
    fn normalization_moves_a_into_reference_cell() {
        let idx = DimerIndex::new(site(2, 1, -1, 0), site(0, 2, 0, 3));
        assert_eq!(
            normalized_dimer_index(&idx),
            DimerIndex::new(site(2, 0, 0, 0), site(0, 1, 1, 3))
        );
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let crystal = monoclinic_crystal();
        for inversion in [false, true] {
            let table = table_for(&crystal, 5.0, inversion);
            for d in [
                DimerIndex::new(site(3, 1, 0, -2), site(1, 0, 1, 0)),
                DimerIndex::new(site(0, 0, 0, 0), site(2, -1, 0, 0)),
                DimerIndex::new(site(1, 5, 5, 5), site(1, 4, 5, 5)),
            ] {
                let once = table.canonical_dimer_index(&d);
                assert_eq!(table.canonical_dimer_index(&once), once);
            }
        }
    }

    #[test]
    fn canonicalization_is_translation_invariant() {
        let crystal = monoclinic_crystal();
        let table = table_for(&crystal, 5.0, true);
        let d = DimerIndex::new(site(3, 0, 1, 0), site(1, 1, 0, 0));
        for t in [HKL::new(1, 0, 0), HKL::new(-2, 3, 1), HKL::new(0, 0, -7)] {
            let shifted = d.translated(t);
            assert_eq!(
                table.canonical_dimer_index(&shifted),
                table.canonical_dimer_index(&d)
            );
            assert_eq!(
                normalized_dimer_index(&shifted).hkl_difference(),
                d.hkl_difference()
            );
        }
    }

    #[test]
    fn canonicalization_ignores_member_order_with_inversion() {
        let crystal = monoclinic_crystal();
        let with = table_for(&crystal, 5.0, true);
        let without = table_for(&crystal, 5.0, false);
        let d = DimerIndex::new(site(2, 0, 0, 0), site(0, 1, -1, 0));

        assert_eq!(
            with.canonical_dimer_index(&d),
            with.canonical_dimer_index(&d.swapped())
        );
        assert_eq!(
            with.canonical_dimer_index(&d),
            DimerIndex::new(site(0, 0, 0, 0), site(2, -1, 1, 0))
        );
        assert_ne!(
            without.canonical_dimer_index(&d),
            without.canonical_dimer_index(&d.swapped())
        );
    }

    #[test]
    fn symmetry_images_of_unique_dimers_are_related() {
        let crystal = monoclinic_crystal();
        for inversion in [false, true] {
            let table = table_for(&crystal, 5.0, inversion);
            let unique = table.symmetry_unique_dimers();
            assert!(!unique.is_empty());

            for u in &unique {
                let related = table.symmetry_related_dimers(u);
                assert!(related.contains(u));
                for op in crystal.symmetry_operations() {
                    let image = table.symmetry_image(u, op).unwrap();
                    assert!(related.contains(&image), "{image} missing from orbit of {u}");
                    assert!(table.have_dimer(&image));
                    assert_eq!(table.symmetry_unique_dimer(&image), *u);
                }
            }
        }
    }

    #[test]
    fn every_input_dimer_resolves_to_a_representative() {
        let crystal = monoclinic_crystal();
        let dimers = find_molecule_neighbors(&crystal, 5.0, &ProgressReporter::new());
        let table = DimerMappingTable::build_dimer_table(&crystal, &dimers, true);
        let unique = table.symmetry_unique_dimers();

        for d in dimers.dimers() {
            let idx = table.dimer_index(d).unwrap();
            assert!(table.have_dimer(&idx));
            let rep = table.symmetry_unique_dimer(&idx);
            assert!(unique.contains(&rep));
            assert_eq!(table.symmetry_unique_dimer(&normalized_dimer_index(&idx)), rep);
        }
        assert!(unique.len() < dimers.len());
    }

    #[test]
    fn dimer_discovered_twice_is_registered_once() {
        let crystal = two_molecule_crystal();
        let mut dimers = CrystalDimers {
            radius: 6.0,
            molecule_neighbors: vec![Vec::new(), Vec::new()],
        };
        let first = dimer(&crystal, (0, HKL::ZERO), (1, HKL::new(1, 0, 0)));
        dimers.molecule_neighbors[0].push((first, 1));

        let single = DimerMappingTable::build_dimer_table(&crystal, &dimers, true);
        assert_eq!(single.unique_dimers().len(), 1);

        // the same pair found again from another cell and from molecule b's side
        let again = dimer(&crystal, (0, HKL::new(0, 2, 0)), (1, HKL::new(1, 2, 0)));
        let swapped = dimer(&crystal, (1, HKL::new(1, 0, 0)), (0, HKL::ZERO));
        dimers.molecule_neighbors[0].push((again, 1));
        dimers.molecule_neighbors[1].push((swapped, 0));

        let table = DimerMappingTable::build_dimer_table(&crystal, &dimers, true);
        assert_eq!(table.unique_dimers().len(), 1);
        assert_eq!(table.symmetry_unique_dimers().len(), 1);

        let expected = DimerIndex::new(site(0, 0, 0, 0), site(1, 1, 0, 0));
        for d in dimers.dimers() {
            let idx = table.dimer_index(d).unwrap();
            assert_eq!(table.canonical_dimer_index(&idx), expected);
            assert_eq!(table.symmetry_unique_dimer(&idx), expected);
        }
    }

    #[test]
    fn unknown_dimers_fall_back_to_identity() {
        let crystal = two_molecule_crystal();
        let table = DimerMappingTable::build_dimer_table(&crystal, &CrystalDimers::default(), false);
        let d = DimerIndex::new(site(0, 3, 0, 0), site(1, 0, 0, 9));

        assert!(!table.have_dimer(&d));
        assert_eq!(table.symmetry_unique_dimer(&d), d);
        assert_eq!(table.symmetry_related_dimers(&d), vec![d]);
        assert!(table.unique_dimers().is_empty());
    }

    #[test]
    fn dimer_far_from_any_molecule_is_skipped() {
        let crystal = two_molecule_crystal();
        let molecules = crystal.unit_cell_molecules();
        let displaced = &molecules[1];
        let stray = Molecule::new(
            displaced.uc_atom_indices.clone(),
            displaced.shifts.clone(),
            displaced.asym_atom_indices.clone(),
            displaced.atomic_numbers.clone(),
            vec![displaced.positions[0] + Vector3::new(1.5, 0.0, 0.0)],
            displaced.unit_cell_idx,
        );
        let stray_dimer = Dimer::new(molecules[0].clone(), stray);
        let valid = dimer(&crystal, (0, HKL::ZERO), (1, HKL::ZERO));
        let dimers = CrystalDimers {
            radius: 6.0,
            molecule_neighbors: vec![vec![(stray_dimer.clone(), 1), (valid, 1)]],
        };

        let table = DimerMappingTable::build_dimer_table(&crystal, &dimers, false);
        assert_eq!(table.unresolved_dimers(), 1);
        assert_eq!(table.unique_dimers().len(), 1);
        assert!(table.have_dimer(&DimerIndex::new(site(0, 0, 0, 0), site(1, 0, 0, 0))));
        assert!(matches!(
            table.dimer_index(&stray_dimer),
            Err(DimerError::UnmatchedPosition { which: "b", .. })
        ));
    }

    #[test]
    fn symmetry_image_of_foreign_site_is_none() {
        let crystal = two_molecule_crystal();
        let table = DimerMappingTable::build_dimer_table(&crystal, &CrystalDimers::default(), false);
        let foreign = DimerIndex::new(site(0, 0, 0, 0), site(7, 1, 0, 0));
        let identity = SymmetryOperation::identity();
        assert_eq!(table.symmetry_image(&foreign, &identity), None);

        let known = DimerIndex::new(site(0, 0, 0, 0), site(1, 1, 0, 0));
        assert_eq!(table.symmetry_image(&known, &identity), Some(known));
    }
}
