use super::{connectivity_params, emit, input_config};
use crate::cli::BondsArgs;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use crystalnet::core::connectivity::graph::{ConnectionType, PeriodicEdge};
use crystalnet::core::models::crystal::Crystal;
use crystalnet::engine::progress::ProgressReporter;
use crystalnet::workflows::analyze::prepare_crystal;
use std::fmt::Write;
use tracing::info;

pub fn run(args: BondsArgs, progress: &CliProgressHandler) -> Result<()> {
    let reporter = ProgressReporter::with_callback(progress.get_callback());
    let params = connectivity_params(&args.crystal);
    let input = input_config(&args.crystal);

    let crystal = reporter.phase("Loading Input", || prepare_crystal(&input, params))?;
    let report = reporter.phase("Perceiving Connectivity", || {
        render_edge_table(&crystal, args.connection_type)
    });

    info!(
        edges = crystal.unit_cell_connectivity().unique_edges().count(),
        "Edge table rendered."
    );
    emit(&report, args.output.as_deref())
}

fn atom_label(crystal: &Crystal, uc_idx: usize, asym_idx: usize) -> String {
    let label = crystal
        .asymmetric_unit()
        .labels
        .get(asym_idx)
        .map(String::as_str)
        .unwrap_or("?");
    format!("{label}({uc_idx})")
}

/// One line per connection, ordered by source, target, cell offset and type.
pub fn render_edge_table(crystal: &Crystal, filter: Option<ConnectionType>) -> String {
    let graph = crystal.unit_cell_connectivity();
    let mut edges: Vec<&PeriodicEdge> = graph
        .unique_edges()
        .filter(|e| filter.is_none_or(|ty| e.connection_type == ty))
        .collect();
    edges.sort_by(|x, y| {
        (x.source, x.target, x.hkl, x.connection_type)
            .cmp(&(y.source, y.target, y.hkl, y.connection_type))
    });

    let mut out = String::new();
    let _ = writeln!(
        out,
        "# {} atoms in the unit cell, {} covalent bonds, {} hydrogen bonds, {} close contacts",
        crystal.unit_cell_atoms().len(),
        graph.count_of_type(ConnectionType::CovalentBond),
        graph.count_of_type(ConnectionType::HydrogenBond),
        graph.count_of_type(ConnectionType::CloseContact),
    );
    let _ = writeln!(
        out,
        "{:<12} {:<12} {:>4} {:>4} {:>4}  {:<13} {:>8}",
        "source", "target", "h", "k", "l", "type", "distance"
    );
    for edge in edges {
        let _ = writeln!(
            out,
            "{:<12} {:<12} {:>4} {:>4} {:>4}  {:<13} {:>8.4}",
            atom_label(crystal, edge.source, edge.source_asym_idx),
            atom_label(crystal, edge.target, edge.target_asym_idx),
            edge.hkl.h,
            edge.hkl.k,
            edge.hkl.l,
            edge.connection_type.to_string(),
            edge.dist,
        );
    }
    out
}
