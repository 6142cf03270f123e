use clap::{Args, Parser, Subcommand};
use crystalnet::core::connectivity::graph::ConnectionType;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "CrystalNet CLI - Periodic bond graphs and symmetry-unique molecular dimers for molecular crystals.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress output and all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for the molecular neighbor search.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Perceive bonds and contacts in the unit cell and print the periodic edge table.
    Bonds(BondsArgs),
    /// Enumerate molecular dimers and reduce them to symmetry-unique representatives.
    Dimers(DimersArgs),
}

/// Input files and connectivity criteria shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct CrystalArgs {
    /// Path to the crystal description in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// CSV file of forced classifications (source,target,h,k,l,connection).
    #[arg(long, value_name = "PATH")]
    pub overrides: Option<PathBuf>,

    /// Tolerance added to the sum of covalent radii, in Angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub covalent_tolerance: Option<f64>,

    /// Margin added to the sum of van der Waals radii, in Angstroms.
    #[arg(long, value_name = "FLOAT")]
    pub vdw_margin: Option<f64>,

    /// Minimum number of neighboring cells searched in each direction.
    #[arg(long, value_name = "INT")]
    pub slab_extent: Option<i32>,
}

/// Arguments for the `bonds` subcommand.
#[derive(Args, Debug)]
pub struct BondsArgs {
    #[command(flatten)]
    pub crystal: CrystalArgs,

    /// Only list edges of this type (covalent, hbond, contact).
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub connection_type: Option<ConnectionType>,

    /// Write the edge table to a file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

/// Arguments for the `dimers` subcommand.
#[derive(Args, Debug)]
pub struct DimersArgs {
    #[command(flatten)]
    pub crystal: CrystalArgs,

    /// Closest-atom distance below which two molecules form a dimer, in Angstroms.
    #[arg(short, long, default_value_t = 3.8, value_name = "FLOAT")]
    pub radius: f64,

    /// Treat a dimer and its member-swapped form as the same pair.
    #[arg(long)]
    pub inversion: bool,

    /// Fractional tolerance for matching molecule centroids.
    #[arg(long, value_name = "FLOAT")]
    pub position_tolerance: Option<f64>,

    /// Also list every dimer found around each unit-cell molecule.
    #[arg(long)]
    pub all: bool,

    /// Write the dimer table to a file instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bonds_arguments_are_parsed() {
        let cli = Cli::try_parse_from([
            "crystalnet",
            "-vv",
            "bonds",
            "-i",
            "urea.toml",
            "--type",
            "hbond",
            "--vdw-margin",
            "0.5",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Bonds(args) = cli.command else {
            panic!("expected bonds subcommand");
        };
        assert_eq!(args.crystal.input, PathBuf::from("urea.toml"));
        assert_eq!(args.connection_type, Some(ConnectionType::HydrogenBond));
        assert_eq!(args.crystal.vdw_margin, Some(0.5));
        assert_eq!(args.crystal.covalent_tolerance, None);
    }

    #[test]
    fn dimers_arguments_use_defaults() {
        let cli = Cli::try_parse_from(["crystalnet", "dimers", "-i", "x.toml", "--inversion"])
            .unwrap();
        let Commands::Dimers(args) = cli.command else {
            panic!("expected dimers subcommand");
        };
        assert_eq!(args.radius, 3.8);
        assert!(args.inversion);
        assert!(!args.all);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["crystalnet", "-q", "-v", "bonds", "-i", "x.toml"]);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_connection_type_is_rejected() {
        let result = Cli::try_parse_from(["crystalnet", "bonds", "-i", "x.toml", "-t", "ionic"]);
        assert!(result.is_err());
    }
}
