//! Error types for annotation analysis
//!
//! Only configuration and category-table problems are fatal. Data anomalies
//! inside an annotation file are reported through `tracing::warn!` and never
//! surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring or feeding the analysis
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Malformed option values (fatal before any file is processed)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Malformed category table
    #[error("Invalid category table: {0}")]
    CategoryTable(String),

    /// An annotation document or configuration file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An annotation document is not valid JSON of the expected shape
    #[error("Failed to decode annotation document {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A configuration or category file is not valid TOML
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AnalysisError {
    /// True for the error classes that must abort the run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AnalysisError::Config(_) | AnalysisError::CategoryTable(_) | AnalysisError::Toml(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_is_fatal() {
        assert!(AnalysisError::Config("bad".to_string()).is_fatal());
        assert!(AnalysisError::CategoryTable("bad".to_string()).is_fatal());
    }

    #[test]
    fn test_io_error_is_not_fatal() {
        let err = AnalysisError::Io {
            path: PathBuf::from("missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("missing.json"));
    }
}
