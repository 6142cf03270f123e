use crate::core::connectivity::builder::ConnectivityParams;
use crate::core::connectivity::graph::ConnectionType;
use crate::core::connectivity::overrides::BondOverrides;
use crate::core::io::{crystal::load_crystal, overrides::load_bond_overrides};
use crate::core::models::crystal::Crystal;
use crate::core::models::hkl::DimerIndex;
use crate::engine::config::{AnalysisConfig, DimerConfig, InputConfig};
use crate::engine::error::AnalysisError;
use crate::engine::mapping::DimerMappingTable;
use crate::engine::neighbors::{CrystalDimers, find_molecule_neighbors};
use crate::engine::progress::{Progress, ProgressReporter};
use std::collections::HashMap;
use tracing::{info, instrument};

/// One symmetry-unique dimer and how often the neighbor search met it.
#[derive(Debug, Clone, PartialEq)]
pub struct DimerSummary {
    pub representative: DimerIndex,
    /// Number of discovered dimers that resolve to this representative.
    pub multiplicity: usize,
    /// Number of distinct canonical images in its symmetry orbit.
    pub orbit_size: usize,
    pub nearest_distance: f64,
    pub centroid_distance: f64,
}

#[derive(Debug, Clone)]
pub struct CrystalAnalysis {
    pub crystal: Crystal,
    pub dimers: CrystalDimers,
    pub table: DimerMappingTable,
    /// Symmetry-unique dimers, closest first.
    pub summaries: Vec<DimerSummary>,
}

/// Loads a crystal and its bond overrides and attaches the connectivity criteria.
#[instrument(skip_all, name = "prepare_crystal")]
pub fn prepare_crystal(
    input: &InputConfig,
    connectivity: ConnectivityParams,
) -> Result<Crystal, AnalysisError> {
    let crystal = load_crystal(&input.crystal_path)?;
    let overrides = match &input.overrides_path {
        Some(path) => load_bond_overrides(path)?,
        None => BondOverrides::new(),
    };
    Ok(crystal
        .with_connectivity_params(connectivity)
        .with_bond_overrides(overrides))
}

#[instrument(skip_all, name = "analysis_workflow")]
pub fn run(
    config: &AnalysisConfig,
    reporter: &ProgressReporter,
) -> Result<CrystalAnalysis, AnalysisError> {
    let crystal = reporter.phase("Loading Input", || {
        prepare_crystal(&config.input, config.connectivity)
    })?;
    analyze_crystal(crystal, &config.dimers, reporter)
}

/// Runs connectivity, molecule extraction, neighbor search and dimer mapping on a loaded crystal.
pub fn analyze_crystal(
    crystal: Crystal,
    config: &DimerConfig,
    reporter: &ProgressReporter,
) -> Result<CrystalAnalysis, AnalysisError> {
    reporter.phase("Perceiving Connectivity", || {
        let graph = crystal.unit_cell_connectivity();
        reporter.report(Progress::Message(format!(
            "{} covalent bonds, {} close contacts, {} hydrogen bonds",
            graph.count_of_type(ConnectionType::CovalentBond),
            graph.count_of_type(ConnectionType::CloseContact),
            graph.count_of_type(ConnectionType::HydrogenBond),
        )));
    });

    reporter.phase("Extracting Molecules", || {
        let molecules = crystal.unit_cell_molecules();
        info!(
            molecules = molecules.len(),
            asymmetric_molecules = crystal.num_asymmetric_molecules(),
            "Molecules extracted."
        );
    });

    let dimers = reporter.phase("Searching Neighbors", || {
        find_molecule_neighbors(&crystal, config.radius, reporter)
    });

    let table = reporter.phase("Mapping Dimers", || {
        DimerMappingTable::build_dimer_table_with_tolerance(
            &crystal,
            &dimers,
            config.consider_inversion,
            config.position_tolerance,
        )
    });

    let summaries = summarize(&dimers, &table);
    info!(
        dimers = dimers.len(),
        symmetry_unique = summaries.len(),
        "Analysis complete."
    );

    Ok(CrystalAnalysis {
        crystal,
        dimers,
        table,
        summaries,
    })
}

fn summarize(dimers: &CrystalDimers, table: &DimerMappingTable) -> Vec<DimerSummary> {
    let mut by_representative: HashMap<DimerIndex, DimerSummary> = HashMap::new();
    // unresolved dimers were already reported while the table was built
    for dimer in dimers.dimers() {
        let Ok(idx) = table.dimer_index(dimer) else {
            continue;
        };
        let representative = table.symmetry_unique_dimer(&idx);
        by_representative
            .entry(representative)
            .and_modify(|s| s.multiplicity += 1)
            .or_insert_with(|| DimerSummary {
                representative,
                multiplicity: 1,
                orbit_size: orbit_size(table, &representative),
                nearest_distance: dimer.nearest_distance(),
                centroid_distance: dimer.centroid_distance(),
            });
    }

    let mut summaries: Vec<DimerSummary> = by_representative.into_values().collect();
    summaries.sort_by(|a, b| {
        a.nearest_distance
            .total_cmp(&b.nearest_distance)
            .then_with(|| a.representative.cmp(&b.representative))
    });
    summaries
}

fn orbit_size(table: &DimerMappingTable, representative: &DimerIndex) -> usize {
    let mut related = table.symmetry_related_dimers(representative);
    related.sort();
    related.dedup();
    related.len()
}
