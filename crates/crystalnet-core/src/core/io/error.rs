use crate::core::models::crystal::CrystalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("CSV parsing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Invalid record {record} in '{path}': {message}")]
    InvalidRecord {
        path: String,
        record: usize,
        message: String,
    },
    #[error("Invalid crystal in '{path}': {source}")]
    Crystal { path: String, source: CrystalError },
}
