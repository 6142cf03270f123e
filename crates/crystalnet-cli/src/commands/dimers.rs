use super::{connectivity_params, emit, input_config};
use crate::cli::DimersArgs;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use crystalnet::engine::config::AnalysisConfigBuilder;
use crystalnet::engine::progress::ProgressReporter;
use crystalnet::workflows::analyze::{self, CrystalAnalysis};
use std::fmt::Write;
use tracing::{debug, info};

pub fn run(args: DimersArgs, progress: &CliProgressHandler) -> Result<()> {
    let input = input_config(&args.crystal);
    let mut builder = AnalysisConfigBuilder::new()
        .crystal_path(input.crystal_path)
        .overrides_path(input.overrides_path)
        .connectivity(connectivity_params(&args.crystal))
        .dimer_radius(args.radius)
        .consider_inversion(args.inversion);
    if let Some(tolerance) = args.position_tolerance {
        builder = builder.position_tolerance(tolerance);
    }
    let config = builder.build()?;
    debug!(?config, "Analysis configuration assembled.");

    let reporter = ProgressReporter::with_callback(progress.get_callback());
    let analysis = analyze::run(&config, &reporter)?;
    info!(
        dimers = analysis.dimers.len(),
        symmetry_unique = analysis.summaries.len(),
        "Dimer analysis finished."
    );

    let mut report = render_summary(&analysis);
    if args.all {
        report.push_str(&render_neighbors(&analysis));
    }
    emit(&report, args.output.as_deref())
}

/// Table of symmetry-unique dimers, closest first.
pub fn render_summary(analysis: &CrystalAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "# {} molecules in the unit cell ({} symmetry-independent)",
        analysis.crystal.unit_cell_molecules().len(),
        analysis.crystal.num_asymmetric_molecules(),
    );
    let _ = writeln!(
        out,
        "# {} dimers within {:.2} A, {} symmetry-unique (member exchange {})",
        analysis.dimers.len(),
        analysis.dimers.radius,
        analysis.summaries.len(),
        if analysis.table.consider_inversion() {
            "on"
        } else {
            "off"
        },
    );
    let unresolved = analysis.table.unresolved_dimers();
    if unresolved > 0 {
        let _ = writeln!(
            out,
            "# {unresolved} dimers skipped: no matching unit-cell molecule"
        );
    }
    let _ = writeln!(
        out,
        "{:>4}  {:<28} {:>5} {:>6} {:>9} {:>9}",
        "rank", "representative", "mult", "orbit", "r_nearest", "r_center"
    );
    for (rank, summary) in analysis.summaries.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:<28} {:>5} {:>6} {:>9.4} {:>9.4}",
            rank + 1,
            summary.representative.to_string(),
            summary.multiplicity,
            summary.orbit_size,
            summary.nearest_distance,
            summary.centroid_distance,
        );
    }
    out
}

/// Every dimer around each unit-cell molecule with the representative it maps to.
pub fn render_neighbors(analysis: &CrystalAnalysis) -> String {
    let mut out = String::new();
    for (molecule, neighbors) in analysis.dimers.molecule_neighbors.iter().enumerate() {
        let _ = writeln!(out, "\n# molecule {molecule}: {} neighbors", neighbors.len());
        for (dimer, asym_idx) in neighbors {
            let (idx, representative) = match analysis.table.dimer_index(dimer) {
                Ok(idx) => (
                    idx.to_string(),
                    analysis.table.symmetry_unique_dimer(&idx).to_string(),
                ),
                Err(_) => ("unmatched".to_string(), "-".to_string()),
            };
            let _ = writeln!(
                out,
                "  {:<28} -> {:<28} asym {:>3} {:>9.4}",
                idx,
                representative,
                asym_idx,
                dimer.nearest_distance(),
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CrystalArgs;
    use std::fs;
    use std::path::{Path, PathBuf};

    const CUBIC_ARGON: &str = r#"
symmetry = ["x,y,z"]

[cell]
a = 4.0
b = 4.0
c = 4.0

[[atoms]]
label = "Ar1"
element = "Ar"
position = [0.0, 0.0, 0.0]
"#;

    fn args_for(input: PathBuf, output: &Path, inversion: bool, all: bool) -> DimersArgs {
        DimersArgs {
            crystal: CrystalArgs {
                input,
                overrides: None,
                covalent_tolerance: None,
                vdw_margin: None,
                slab_extent: None,
            },
            radius: 4.5,
            inversion,
            position_tolerance: None,
            all,
            output: Some(output.to_path_buf()),
        }
    }

    fn run_on_argon(inversion: bool, all: bool) -> String {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ar.toml");
        let output = dir.path().join("dimers.txt");
        fs::write(&input, CUBIC_ARGON).unwrap();
        run(
            args_for(input, &output, inversion, all),
            &CliProgressHandler::new(false),
        )
        .unwrap();
        fs::read_to_string(output).unwrap()
    }

    fn multiplicities(report: &str) -> Vec<usize> {
        report
            .lines()
            .filter(|l| !l.starts_with('#') && !l.trim_start().starts_with("rank"))
            .map(|l| l.split_whitespace().rev().nth(3).unwrap().parse().unwrap())
            .collect()
    }

    #[test]
    fn face_neighbors_pair_up_under_member_exchange() {
        let report = run_on_argon(true, false);
        assert!(report.contains("# 6 dimers within 4.50 A, 3 symmetry-unique (member exchange on)"));
        assert_eq!(multiplicities(&report), vec![2, 2, 2]);
    }

    #[test]
    fn without_member_exchange_every_face_neighbor_is_unique() {
        let report = run_on_argon(false, false);
        assert!(report.contains("6 symmetry-unique (member exchange off)"));
        assert_eq!(multiplicities(&report), vec![1; 6]);
    }

    #[test]
    fn all_flag_lists_each_neighbor() {
        let report = run_on_argon(true, true);
        assert!(report.contains("# molecule 0: 6 neighbors"));
        assert_eq!(report.lines().filter(|l| l.contains("->")).count(), 6);
    }

    #[test]
    fn non_positive_radius_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dimers.txt");
        let mut args = args_for(dir.path().join("ar.toml"), &output, false, false);
        args.radius = 0.0;
        let result = run(args, &CliProgressHandler::new(false));
        assert!(matches!(result, Err(crate::error::CliError::Config(_))));
    }
}
