pub mod analysis;
pub mod commands;
pub mod error;
pub mod models;

pub use commands::batch::{score_batch, BatchOutcome};
pub use commands::scoring::ScoringEngine;
pub use error::ConfigError;
pub use models::config::EngineConfig;
pub use models::metrics::{RawSourceMetrics, SourceId, TechMetrics};
pub use models::snapshot::{Snapshot, Verdict};
