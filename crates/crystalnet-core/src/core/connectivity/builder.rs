use super::graph::{ConnectionType, PeriodicBondGraph, PeriodicEdge};
use super::overrides::{BondOverrides, EdgeKey};
use super::spatial::SlabIndex;
use crate::core::models::asymmetric_unit::AsymmetricUnit;
use crate::core::models::cell::UnitCell;
use crate::core::models::crystal::{Crystal, CrystalAtomRegion, UnitCellAtoms};
use crate::core::models::element;
use crate::core::models::hkl::HKL;
use tracing::{debug, info, instrument, trace, warn};

/// Distance criteria for bond and contact perception, in Angstroms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectivityParams {
    /// Added to the sum of covalent radii.
    pub covalent_tolerance: f64,
    /// Added to the sum of van der Waals radii.
    pub vdw_margin: f64,
    /// Minimum number of neighboring cells replicated in each direction.
    pub slab_extent: i32,
}

impl Default for ConnectivityParams {
    fn default() -> Self {
        Self {
            covalent_tolerance: 0.4,
            vdw_margin: 0.6,
            slab_extent: 2,
        }
    }
}

/// Perceives covalent bonds, close contacts and hydrogen bonds between the
/// atoms of a unit cell and their periodic images.
pub struct UnitCellConnectivityBuilder<'a> {
    unit_cell: &'a UnitCell,
    asymmetric_unit: &'a AsymmetricUnit,
    uc_atoms: &'a UnitCellAtoms,
    slab: CrystalAtomRegion,
    params: ConnectivityParams,
}

#[derive(Debug, Default)]
struct EdgeCounts {
    covalent: usize,
    contacts: usize,
    hydrogen_bonds: usize,
    overridden: usize,
}

impl<'a> UnitCellConnectivityBuilder<'a> {
    pub fn new(crystal: &'a Crystal, params: ConnectivityParams) -> Self {
        let extent = slab_extent_for(crystal.unit_cell(), crystal.asymmetric_unit(), &params);
        let slab = crystal.slab(
            HKL::new(-extent, -extent, -extent),
            HKL::new(extent, extent, extent),
        );
        Self {
            unit_cell: crystal.unit_cell(),
            asymmetric_unit: crystal.asymmetric_unit(),
            uc_atoms: crystal.unit_cell_atoms(),
            slab,
            params,
        }
    }

    /// Classifies every pair within range and materializes the bond graph.
    ///
    /// `overrides` is a working copy: entries matched during the search are
    /// removed from it, and whatever remains afterwards is applied directly.
    #[instrument(skip_all, name = "unit_cell_connectivity")]
    pub fn build(&self, overrides: BondOverrides) -> PeriodicBondGraph {
        let mut overrides = overrides;
        let num_atoms = self.uc_atoms.len();
        let mut graph = PeriodicBondGraph::with_vertices(num_atoms);
        if num_atoms == 0 {
            return graph;
        }

        let index = SlabIndex::new(&self.slab.cart_pos);
        let search_radius = search_radius(self.asymmetric_unit, &self.params);
        let search_radius_sq = search_radius * search_radius;
        debug!(
            num_atoms,
            slab_size = self.slab.len(),
            search_radius,
            "Searching for neighbors in periodic slab."
        );

        let mut counts = EdgeCounts::default();
        for uc_idx_l in 0..num_atoms {
            let pos_l = &self.uc_atoms.cart_pos[uc_idx_l];
            for neighbor in index.within(pos_l, search_radius_sq) {
                let uc_idx_r = self.slab.unit_cell_index(neighbor.slab_idx);
                let hkl = self.slab.hkl[neighbor.slab_idx];

                if uc_idx_r < uc_idx_l {
                    continue;
                }
                if uc_idx_r == uc_idx_l && !hkl.is_positive() {
                    // zero offset is the atom itself; a negative one is the
                    // mirror of a positive offset that is visited as well
                    continue;
                }

                let key = EdgeKey::new(uc_idx_l, uc_idx_r, hkl);
                let connection_type = match overrides.take(&key) {
                    Some(forced) => {
                        counts.overridden += 1;
                        forced
                    }
                    None => self.classify(uc_idx_l, uc_idx_r, neighbor.distance_sq),
                };
                if connection_type == ConnectionType::DontBond {
                    continue;
                }

                let edge = self.make_edge(key, neighbor.distance_sq.sqrt(), connection_type);
                self.insert_edges(&mut graph, edge, &mut counts);
            }
        }

        if !overrides.is_empty() {
            debug!(
                remaining = overrides.len(),
                "Applying overrides not matched by the neighbor search."
            );
        }
        for (key, connection_type) in overrides {
            self.apply_unmatched_override(&mut graph, key, connection_type, &mut counts);
        }

        info!(
            covalent_bonds = counts.covalent,
            close_contacts = counts.contacts,
            hydrogen_bonds = counts.hydrogen_bonds,
            overridden = counts.overridden,
            "Unit cell connectivity complete."
        );
        graph
    }

    fn classify(&self, uc_idx_l: usize, uc_idx_r: usize, distance_sq: f64) -> ConnectionType {
        let asym_l = self.uc_atoms.asym_idx[uc_idx_l];
        let asym_r = self.uc_atoms.asym_idx[uc_idx_r];

        let covalent = self.asymmetric_unit.covalent_radii();
        let cov_cutoff = covalent[asym_l] + covalent[asym_r] + self.params.covalent_tolerance;
        if distance_sq < cov_cutoff * cov_cutoff {
            return ConnectionType::CovalentBond;
        }

        let vdw = self.asymmetric_unit.vdw_radii();
        let vdw_cutoff = vdw[asym_l] + vdw[asym_r] + self.params.vdw_margin;
        if distance_sq < vdw_cutoff * vdw_cutoff {
            return ConnectionType::CloseContact;
        }
        ConnectionType::DontBond
    }

    fn make_edge(&self, key: EdgeKey, dist: f64, connection_type: ConnectionType) -> PeriodicEdge {
        PeriodicEdge {
            dist,
            source: key.source,
            target: key.target,
            source_asym_idx: self.uc_atoms.asym_idx[key.source],
            target_asym_idx: self.uc_atoms.asym_idx[key.target],
            hkl: key.hkl,
            connection_type,
        }
    }

    /// Adds the edge pair, plus a hydrogen-bond pair for H···N/O/F contacts.
    fn insert_edges(&self, graph: &mut PeriodicBondGraph, edge: PeriodicEdge, counts: &mut EdgeCounts) {
        let z_source = self.uc_atoms.atomic_numbers[edge.source];
        let z_target = self.uc_atoms.atomic_numbers[edge.target];
        trace!(
            source = edge.source,
            target = edge.target,
            hkl = %edge.hkl,
            dist = edge.dist,
            connection = %edge.connection_type,
            "Adding edge."
        );

        match edge.connection_type {
            ConnectionType::CovalentBond => counts.covalent += 1,
            ConnectionType::CloseContact => counts.contacts += 1,
            ConnectionType::HydrogenBond => counts.hydrogen_bonds += 1,
            ConnectionType::DontBond => return,
        }

        let hydrogen_bond = (edge.connection_type == ConnectionType::CloseContact
            && element::is_hbond_pair(z_source, z_target))
        .then(|| PeriodicEdge {
            connection_type: ConnectionType::HydrogenBond,
            ..edge.clone()
        });

        graph.add_edge_pair(edge);
        if let Some(hb) = hydrogen_bond {
            counts.hydrogen_bonds += 1;
            graph.add_edge_pair(hb);
        }
    }

    fn apply_unmatched_override(
        &self,
        graph: &mut PeriodicBondGraph,
        key: EdgeKey,
        connection_type: ConnectionType,
        counts: &mut EdgeCounts,
    ) {
        let num_atoms = self.uc_atoms.len();
        if key.source >= num_atoms || key.target >= num_atoms {
            warn!(
                source = key.source,
                target = key.target,
                num_atoms,
                "Ignoring bond override that references a non-existent atom."
            );
            return;
        }
        if key.source == key.target && key.hkl.is_zero() {
            warn!(atom = key.source, "Ignoring bond override from an atom to itself.");
            return;
        }
        if connection_type == ConnectionType::DontBond {
            return;
        }

        let frac_source = self.uc_atoms.frac_pos[key.source];
        let frac_target = self.uc_atoms.frac_pos[key.target] + key.hkl.to_vector();
        let dist = self
            .unit_cell
            .displacement_to_cartesian(&(frac_target - frac_source))
            .norm();

        counts.overridden += 1;
        let edge = self.make_edge(key, dist, connection_type);
        self.insert_edges(graph, edge, counts);
    }
}

/// Largest separation at which any pair can still classify as a bond or contact.
fn search_radius(asym: &AsymmetricUnit, params: &ConnectivityParams) -> f64 {
    let contact_reach = 2.0 * asym.max_vdw_radius() + params.vdw_margin;
    let covalent_reach = 2.0 * asym.max_covalent_radius() + params.covalent_tolerance;
    contact_reach.max(covalent_reach)
}

/// Cells to replicate so the widest search sphere around any unit-cell atom is covered.
fn slab_extent_for(cell: &UnitCell, asym: &AsymmetricUnit, params: &ConnectivityParams) -> i32 {
    let min_spacing = cell.plane_spacings().min();
    let required = (search_radius(asym, params) / min_spacing).ceil() as i32;
    params.slab_extent.max(required)
}
