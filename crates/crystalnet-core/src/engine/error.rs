use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::LoadError;
use crate::core::models::hkl::HKL;

#[derive(Debug, Error)]
pub enum DimerError {
    #[error(
        "Dimer endpoint {which} at fractional position {position:?} matches no unit-cell molecule (nearest lattice cell {hkl})"
    )]
    UnmatchedPosition {
        which: &'static str,
        position: [f64; 3],
        hkl: HKL,
    },
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Failed to load input: {source}")]
    Load {
        #[from]
        source: LoadError,
    },
}
