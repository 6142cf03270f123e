pub mod bonds;
pub mod dimers;

use crate::cli::CrystalArgs;
use crate::error::{CliError, Result};
use crystalnet::core::connectivity::builder::ConnectivityParams;
use crystalnet::engine::config::InputConfig;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Default connectivity criteria with any command-line overrides applied.
pub fn connectivity_params(args: &CrystalArgs) -> ConnectivityParams {
    let defaults = ConnectivityParams::default();
    ConnectivityParams {
        covalent_tolerance: args
            .covalent_tolerance
            .unwrap_or(defaults.covalent_tolerance),
        vdw_margin: args.vdw_margin.unwrap_or(defaults.vdw_margin),
        slab_extent: args.slab_extent.unwrap_or(defaults.slab_extent),
    }
}

pub fn input_config(args: &CrystalArgs) -> InputConfig {
    InputConfig {
        crystal_path: args.input.clone(),
        overrides_path: args.overrides.clone(),
    }
}

/// Writes a rendered report to `output`, or to stdout when no path is given.
pub fn emit(report: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, report).map_err(|source| CliError::Output {
                path: path.to_path_buf(),
                source,
            })?;
            info!(path = %path.display(), "Report written.");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(report.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn crystal_args() -> CrystalArgs {
        CrystalArgs {
            input: PathBuf::from("crystal.toml"),
            overrides: Some(PathBuf::from("overrides.csv")),
            covalent_tolerance: None,
            vdw_margin: Some(0.25),
            slab_extent: None,
        }
    }

    #[test]
    fn connectivity_params_keep_defaults_for_unset_flags() {
        let params = connectivity_params(&crystal_args());
        let defaults = ConnectivityParams::default();
        assert_eq!(params.covalent_tolerance, defaults.covalent_tolerance);
        assert_eq!(params.vdw_margin, 0.25);
        assert_eq!(params.slab_extent, defaults.slab_extent);
    }

    #[test]
    fn input_config_carries_both_paths() {
        let input = input_config(&crystal_args());
        assert_eq!(input.crystal_path, PathBuf::from("crystal.toml"));
        assert_eq!(input.overrides_path, Some(PathBuf::from("overrides.csv")));
    }

    #[test]
    fn emit_writes_report_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        emit("line\n", Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "line\n");
    }

    #[test]
    fn emit_reports_the_failing_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.txt");
        let result = emit("line\n", Some(&path));
        assert!(matches!(result, Err(CliError::Output { path: p, .. }) if p == path));
    }
}
