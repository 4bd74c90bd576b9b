use crate::models::metrics::SourceId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// Clamp a score into [0, 10]. Non-finite input never escapes as NaN.
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return MAX_SCORE / 2.0;
    }
    value.clamp(MIN_SCORE, MAX_SCORE)
}

/// What one normalizer concluded from one source payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReading {
    pub sub_score: f64,
    pub sample_size: u64,
    pub details: Vec<String>,
}

impl SourceReading {
    pub fn new(sub_score: f64, sample_size: f64, details: Vec<String>) -> Self {
        Self {
            sub_score: clamp_score(sub_score),
            sample_size: to_sample_size(sample_size),
            details,
        }
    }
}

fn to_sample_size(volume: f64) -> u64 {
    if volume.is_finite() && volume > 0.0 {
        volume.round() as u64
    } else {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub source_id: SourceId,
    pub sub_score: f64,
    /// Weight actually applied after renormalization over present sources.
    pub weight: f64,
    pub base_weight: f64,
    pub sample_size: u64,
    pub details: Vec<String>,
}

impl ComponentScore {
    pub fn contribution(&self) -> f64 {
        self.sub_score * self.weight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    VeryActive,
    Active,
    Stable,
    Declining,
    Abandoned,
    InsufficientData,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::VeryActive => "very_active",
            Verdict::Active => "active",
            Verdict::Stable => "stable",
            Verdict::Declining => "declining",
            Verdict::Abandoned => "abandoned",
            Verdict::InsufficientData => "insufficient_data",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::VeryActive => "Very Active",
            Verdict::Active => "Active",
            Verdict::Stable => "Stable",
            Verdict::Declining => "Declining",
            Verdict::Abandoned => "Abandoned",
            Verdict::InsufficientData => "Not enough data",
        }
    }
}

/// Display groupings of sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Codebase,
    Community,
    Support,
    Learning,
    Adoption,
    Jobs,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Codebase,
        Dimension::Community,
        Dimension::Support,
        Dimension::Learning,
        Dimension::Adoption,
        Dimension::Jobs,
    ];

    pub fn sources(self) -> &'static [SourceId] {
        match self {
            Dimension::Codebase => &[SourceId::CodeHosting],
            Dimension::Community => &[SourceId::CommunityForum, SourceId::LinkAggregator],
            Dimension::Support => &[SourceId::Qa],
            Dimension::Learning => &[SourceId::VideoPlatform],
            Dimension::Adoption => &[SourceId::AdoptionDirectory],
            Dimension::Jobs => &[SourceId::JobMarket],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Maturity {
    Young,
    Maturing,
    Established,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBand {
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tech_id: String,
    pub snapshot_date: NaiveDate,
    /// `None` when no source produced a usable reading.
    pub deaditude_score: Option<f64>,
    pub component_scores: BTreeMap<SourceId, ComponentScore>,
    pub confidence: f64,
    pub verdict: Verdict,
    pub commentary_bucket: Option<usize>,
    pub score_band: Option<ScoreBand>,
    pub dimension_scores: BTreeMap<Dimension, f64>,
    pub highlights: Vec<String>,
    pub maturity: Maturity,
    pub tech_age_years: Option<u32>,
    pub config_version: u32,
}

impl Snapshot {
    pub fn has_score(&self) -> bool {
        self.deaditude_score.is_some()
    }

    pub fn applied_weight_total(&self) -> f64 {
        self.component_scores.values().map(|c| c.weight).sum()
    }
}
