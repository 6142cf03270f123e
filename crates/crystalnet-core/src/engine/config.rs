use crate::core::connectivity::builder::ConnectivityParams;
use std::path::PathBuf;
use thiserror::Error;

/// Fractional distance under which a dimer endpoint matches a molecule centroid.
pub const DEFAULT_POSITION_TOLERANCE: f64 = 1e-2;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Parameter '{name}' must be positive")]
    NonPositive { name: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputConfig {
    pub crystal_path: PathBuf,
    pub overrides_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimerConfig {
    /// Closest-atom distance below which two molecules form a dimer, in Angstroms.
    pub radius: f64,
    /// Treat a dimer and its swapped form as the same pair.
    pub consider_inversion: bool,
    pub position_tolerance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub input: InputConfig,
    pub connectivity: ConnectivityParams,
    pub dimers: DimerConfig,
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    crystal_path: Option<PathBuf>,
    overrides_path: Option<PathBuf>,
    dimer_radius: Option<f64>,
    consider_inversion: Option<bool>,
    position_tolerance: Option<f64>,
    connectivity: Option<ConnectivityParams>,
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn crystal_path(mut self, path: PathBuf) -> Self {
        self.crystal_path = Some(path);
        self
    }
    pub fn overrides_path(mut self, path: Option<PathBuf>) -> Self {
        self.overrides_path = path;
        self
    }
    pub fn dimer_radius(mut self, radius: f64) -> Self {
        self.dimer_radius = Some(radius);
        self
    }
    pub fn consider_inversion(mut self, enabled: bool) -> Self {
        self.consider_inversion = Some(enabled);
        self
    }
    pub fn position_tolerance(mut self, tolerance: f64) -> Self {
        self.position_tolerance = Some(tolerance);
        self
    }
    pub fn connectivity(mut self, params: ConnectivityParams) -> Self {
        self.connectivity = Some(params);
        self
    }

    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let input = InputConfig {
            crystal_path: self
                .crystal_path
                .ok_or(ConfigError::MissingParameter("crystal_path"))?,
            overrides_path: self.overrides_path,
        };
        let radius = self
            .dimer_radius
            .ok_or(ConfigError::MissingParameter("dimer_radius"))?;
        if !(radius > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "dimer_radius",
            });
        }
        let position_tolerance = self
            .position_tolerance
            .unwrap_or(DEFAULT_POSITION_TOLERANCE);
        if !(position_tolerance > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "position_tolerance",
            });
        }
        let dimers = DimerConfig {
            radius,
            consider_inversion: self
                .consider_inversion
                .ok_or(ConfigError::MissingParameter("consider_inversion"))?,
            position_tolerance,
        };
        Ok(AnalysisConfig {
            input,
            connectivity: self.connectivity.unwrap_or_default(),
            dimers,
        })
    }
}
