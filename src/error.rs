//! Error types for engine configuration

use thiserror::Error;

/// Misconfiguration is fatal: it is raised once when the engine is built,
/// never per technology.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid weight for {source_id} in {profile} profile: {value}")]
    InvalidWeight {
        profile: &'static str,
        source_id: String,
        value: f64,
    },

    #[error("Weight profile {0} has no positive weight")]
    EmptyWeights(&'static str),

    #[error("Threshold table {0} is empty, unordered or non-finite")]
    InvalidLadder(String),

    #[error("Invalid parameter {name}: {value}")]
    InvalidParameter { name: String, value: f64 },

    #[error("Classifier tier bounds must be four ascending values within [0, 10]")]
    InvalidTierBounds,

    #[error("Commentary needs at least one bucket")]
    NoCommentaryBuckets,

    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
