use crate::analysis::{composite, confidence, normalize, trend, verdict};
use crate::error::ConfigError;
use crate::models::config::EngineConfig;
use crate::models::metrics::{SourceId, TechMetrics};
use crate::models::snapshot::{clamp_score, Maturity, Snapshot, SourceReading};
use chrono::Datelike;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Pure scoring pipeline: raw payloads in, one snapshot out.
///
/// The engine holds no mutable state, so one instance can be shared across
/// threads and scoring the same input twice gives the same snapshot.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: Arc<EngineConfig>,
}

impl ScoringEngine {
    pub fn new(config: Arc<EngineConfig>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn score(&self, tech: &TechMetrics) -> Snapshot {
        let config = &self.config;
        let age = trend::tech_age_years(tech.snapshot_date.year(), tech.creation_year);
        let maturity = trend::maturity_for(age, &config.maturity);
        let factor = trend::maturity_factor(maturity, &config.maturity);
        let profile = match maturity {
            Maturity::Young => &config.weights.young,
            _ => &config.weights.base,
        };

        let readings = self.read_sources(tech);
        let (components, raw_score) = composite::aggregate(readings, profile);
        let deaditude_score = raw_score.map(|score| clamp_score(score * factor));

        let confidence = if components.is_empty() {
            0.0
        } else {
            confidence::estimate_confidence(&components, profile, &config.confidence)
        };
        let score_band = deaditude_score
            .map(|score| confidence::score_band(score, &components, &config.confidence));

        let snapshot = Snapshot {
            tech_id: tech.tech_id.clone(),
            snapshot_date: tech.snapshot_date,
            deaditude_score,
            confidence,
            verdict: verdict::classify(deaditude_score, &config.classifier),
            commentary_bucket: verdict::commentary_bucket(
                deaditude_score,
                config.classifier.commentary_buckets,
            ),
            score_band,
            dimension_scores: composite::dimension_scores(&components, factor),
            highlights: composite::highlights(&components, &config.classifier),
            component_scores: components,
            maturity,
            tech_age_years: age,
            config_version: config.version,
        };

        match snapshot.deaditude_score {
            Some(score) => log::debug!(
                "{}: {:.2} from {} sources ({})",
                snapshot.tech_id,
                score,
                snapshot.component_scores.len(),
                snapshot.verdict.label()
            ),
            None => log::warn!("{}: no usable sources, nothing to score", snapshot.tech_id),
        }

        snapshot
    }

    fn read_sources(&self, tech: &TechMetrics) -> BTreeMap<SourceId, SourceReading> {
        tech.sources
            .iter()
            .filter_map(|(source, raw)| match normalize(*source, raw, &self.config) {
                Some(reading) => {
                    log::debug!("{} {source}: {:.2}", tech.tech_id, reading.sub_score);
                    Some((*source, reading))
                }
                None => {
                    log::warn!("{} {source}: payload unusable, treating as missing", tech.tech_id);
                    None
                }
            })
            .collect()
    }
}
