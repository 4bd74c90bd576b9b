use crate::error::{ConfigError, Result};
use crate::models::metrics::SourceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CONFIG_SCHEMA_VERSION: u32 = 2;

/// How a [`Ladder`] compares an input against each step bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compare {
    Below,
    AtLeast,
    Above,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub bound: f64,
    pub value: f64,
}

/// Tiered threshold table. The first matching step wins, so `Below` steps
/// are listed with ascending bounds and `AtLeast`/`Above` steps descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ladder {
    pub compare: Compare,
    pub steps: Vec<Step>,
    #[serde(default)]
    pub otherwise: f64,
}

impl Ladder {
    fn build(compare: Compare, steps: &[(f64, f64)]) -> Self {
        Self {
            compare,
            steps: steps
                .iter()
                .map(|&(bound, value)| Step { bound, value })
                .collect(),
            otherwise: 0.0,
        }
    }

    pub fn below(steps: &[(f64, f64)]) -> Self {
        Self::build(Compare::Below, steps)
    }

    pub fn at_least(steps: &[(f64, f64)]) -> Self {
        Self::build(Compare::AtLeast, steps)
    }

    pub fn above(steps: &[(f64, f64)]) -> Self {
        Self::build(Compare::Above, steps)
    }

    pub fn otherwise(mut self, value: f64) -> Self {
        self.otherwise = value;
        self
    }

    pub fn value(&self, input: f64) -> f64 {
        self.steps
            .iter()
            .find(|step| match self.compare {
                Compare::Below => input < step.bound,
                Compare::AtLeast => input >= step.bound,
                Compare::Above => input > step.bound,
            })
            .map(|step| step.value)
            .unwrap_or(self.otherwise)
    }

    fn validate(&self, name: &str) -> Result<()> {
        let finite = self.otherwise.is_finite()
            && self
                .steps
                .iter()
                .all(|s| s.bound.is_finite() && s.value.is_finite());
        let ordered = self.steps.windows(2).all(|pair| match self.compare {
            Compare::Below => pair[0].bound < pair[1].bound,
            Compare::AtLeast | Compare::Above => pair[0].bound > pair[1].bound,
        });

        if self.steps.is_empty() || !finite || !ordered {
            return Err(ConfigError::InvalidLadder(name.to_string()));
        }
        Ok(())
    }
}

/// Symmetric growth-rate adjustment: one ladder for rising volume, one for
/// falling volume. At most one of them matches a given rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthAdjustment {
    pub rising: Ladder,
    pub falling: Ladder,
}

impl GrowthAdjustment {
    pub fn value(&self, growth_rate: f64) -> f64 {
        self.rising.value(growth_rate) + self.falling.value(growth_rate)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.rising.compare == Compare::Below || self.falling.compare != Compare::Below {
            return Err(ConfigError::InvalidLadder(name.to_string()));
        }
        self.rising.validate(&format!("{name}.rising"))?;
        self.falling.validate(&format!("{name}.falling"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceWeights(BTreeMap<SourceId, f64>);

impl SourceWeights {
    pub fn from_pairs(pairs: &[(SourceId, f64)]) -> Self {
        Self(pairs.iter().copied().collect())
    }

    pub fn get(&self, source: SourceId) -> f64 {
        self.0.get(&source).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceId, f64)> + '_ {
        self.0.iter().map(|(source, weight)| (*source, *weight))
    }

    fn validate(&self, profile: &'static str) -> Result<()> {
        for (source, weight) in self.iter() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight {
                    profile,
                    source_id: source.to_string(),
                    value: weight,
                });
            }
        }
        if self.total() <= f64::EPSILON {
            return Err(ConfigError::EmptyWeights(profile));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    pub base: SourceWeights,
    /// Used for technologies no older than `maturity.young_max_years`.
    pub young: SourceWeights,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            base: SourceWeights::from_pairs(&[
                (SourceId::CodeHosting, 0.20),
                (SourceId::JobMarket, 0.20),
                (SourceId::CommunityForum, 0.15),
                (SourceId::AdoptionDirectory, 0.15),
                (SourceId::VideoPlatform, 0.15),
                (SourceId::Qa, 0.10),
                (SourceId::LinkAggregator, 0.05),
            ]),
            young: SourceWeights::from_pairs(&[
                (SourceId::CodeHosting, 0.25),
                (SourceId::JobMarket, 0.10),
                (SourceId::CommunityForum, 0.20),
                (SourceId::AdoptionDirectory, 0.10),
                (SourceId::VideoPlatform, 0.20),
                (SourceId::Qa, 0.10),
                (SourceId::LinkAggregator, 0.05),
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaturityConfig {
    pub young_max_years: u32,
    pub maturing_max_years: u32,
    pub young_factor: f64,
    pub maturing_factor: f64,
}

impl Default for MaturityConfig {
    fn default() -> Self {
        Self {
            young_max_years: 2,
            maturing_max_years: 10,
            young_factor: 0.90,
            maturing_factor: 0.95,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    pub answered_ratio: Ladder,
    /// Accepted answers as a share of answered questions.
    pub accepted_ratio: Ladder,
    pub zero_answer_ratio: Ladder,
    pub response_hours: Ladder,
    pub duplicate_ratio: Ladder,
    pub avg_views: Ladder,
    pub views_per_answer: Ladder,
    pub volume: Ladder,
    pub days_since_activity: Ladder,
    pub high_view_share: f64,
    pub high_view_answered_below: f64,
    pub high_view_points: f64,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            answered_ratio: Ladder::below(&[(0.30, 3.0), (0.60, 2.0), (0.85, 1.0)]),
            accepted_ratio: Ladder::below(&[(0.10, 2.0), (0.30, 1.0)]),
            zero_answer_ratio: Ladder::at_least(&[(0.50, 2.0), (0.30, 1.0)]),
            response_hours: Ladder::at_least(&[(48.0, 2.0), (24.0, 1.0)]),
            duplicate_ratio: Ladder::at_least(&[(0.30, 1.0)]),
            avg_views: Ladder::below(&[(10.0, 2.0), (30.0, 1.0)]),
            views_per_answer: Ladder::at_least(&[(1000.0, 1.0), (500.0, 0.5)]),
            volume: Ladder::below(&[(10.0, 3.0), (25.0, 2.0), (50.0, 1.0)]),
            days_since_activity: Ladder::above(&[(180.0, 2.0), (60.0, 1.0)]),
            high_view_share: 0.25,
            high_view_answered_below: 0.50,
            high_view_points: 1.0,
        }
    }
}

/// Penalty added to the forum score when post volume is shrinking fast:
/// `min(max_penalty, steepness * (onset - growth)^2)` below `onset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclineCurve {
    pub onset: f64,
    pub steepness: f64,
    pub max_penalty: f64,
}

impl Default for DeclineCurve {
    fn default() -> Self {
        Self {
            onset: -0.2,
            steepness: 5.0,
            max_penalty: 2.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForumTrendConfig {
    pub sustained_base: f64,
    pub stable_base: f64,
    pub declining_base: f64,
    /// Growth below this rate counts as a declining community.
    pub declining_below: f64,
    pub growth: GrowthAdjustment,
    pub max: f64,
    pub scale: f64,
}

impl Default for ForumTrendConfig {
    fn default() -> Self {
        Self {
            sustained_base: 1.5,
            stable_base: 0.8,
            declining_base: 0.0,
            declining_below: -0.2,
            growth: GrowthAdjustment {
                rising: Ladder::above(&[(1.0, 1.0), (0.5, 0.3), (0.2, 0.2)]),
                falling: Ladder::below(&[(-0.2, -0.3)]),
            },
            max: 3.0,
            scale: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForumConfig {
    pub subscribers: Ladder,
    pub subscribers_max: f64,
    pub subscriber_weight: f64,
    pub posts: Ladder,
    pub posts_max: f64,
    pub post_weight: f64,
    pub engagement: Ladder,
    pub engagement_max: f64,
    pub engagement_weight: f64,
    pub trend: ForumTrendConfig,
    pub trend_weight: f64,
    pub activity_blend: f64,
    pub sentiment_blend: f64,
    pub migration_blend: f64,
    pub migration_cap: f64,
    pub neutral_sentiment: f64,
    /// Alive scores at or below the knee count `low_alive_multiplier` times.
    pub alive_knee: f64,
    pub low_alive_multiplier: f64,
    /// Ceiling for communities whose post growth exceeds `growth_cap_rate`.
    pub growth_cap: f64,
    pub growth_cap_rate: f64,
    pub decline: DeclineCurve,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            subscribers: Ladder::at_least(&[
                (100_000.0, 3.0),
                (20_000.0, 2.0),
                (5_000.0, 1.0),
                (1_000.0, 0.5),
            ]),
            subscribers_max: 3.0,
            subscriber_weight: 0.15,
            posts: Ladder::at_least(&[(50.0, 3.0), (20.0, 2.0), (10.0, 1.0), (5.0, 0.5)]),
            posts_max: 3.0,
            post_weight: 0.15,
            engagement: Ladder::at_least(&[(50.0, 2.0), (20.0, 1.5), (10.0, 1.0), (5.0, 0.5)]),
            engagement_max: 2.0,
            engagement_weight: 0.10,
            trend: ForumTrendConfig::default(),
            trend_weight: 0.35,
            activity_blend: 0.5,
            sentiment_blend: 0.35,
            migration_blend: 0.2,
            migration_cap: 5.0,
            neutral_sentiment: 5.0,
            alive_knee: 7.0,
            low_alive_multiplier: 1.5,
            growth_cap: 3.0,
            growth_cap_rate: 0.5,
            decline: DeclineCurve::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkAggregatorConfig {
    pub volume_divisor: f64,
    pub karma_divisor: f64,
    pub fresh_within_days: f64,
    pub recency_horizon_days: f64,
    pub volume_weight: f64,
    pub karma_weight: f64,
    pub recency_weight: f64,
}

impl Default for LinkAggregatorConfig {
    fn default() -> Self {
        Self {
            volume_divisor: 2.0,
            karma_divisor: 5.0,
            fresh_within_days: 7.0,
            recency_horizon_days: 120.0,
            volume_weight: 0.4,
            karma_weight: 0.4,
            recency_weight: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobMarketConfig {
    pub tiers: Ladder,
}

impl Default for JobMarketConfig {
    fn default() -> Self {
        Self {
            tiers: Ladder::at_least(&[
                (100_000.0, 1.0),
                (50_000.0, 2.5),
                (20_000.0, 4.0),
                (5_000.0, 5.5),
                (1_000.0, 7.0),
                (100.0, 8.5),
            ])
            .otherwise(10.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeHostingConfig {
    pub baseline: f64,
    pub commits_penalty: Ladder,
    pub commits_bonus: Ladder,
    pub pr_age_days: Ladder,
    pub release_age_days: Ladder,
    pub no_release_penalty: f64,
    pub push_age_days: Ladder,
    pub stars: Ladder,
    pub contributors: Ladder,
}

impl Default for CodeHostingConfig {
    fn default() -> Self {
        Self {
            baseline: 5.0,
            commits_penalty: Ladder::below(&[(1.0, 3.0), (10.0, 2.0), (30.0, 1.0)]),
            commits_bonus: Ladder::above(&[(100.0, -2.0), (50.0, -1.5)]),
            pr_age_days: Ladder::above(&[(180.0, 2.0), (90.0, 1.0)]),
            release_age_days: Ladder::above(&[(365.0, 2.0), (60.0, 1.0)]),
            no_release_penalty: 2.0,
            push_age_days: Ladder::above(&[(365.0, 2.0), (180.0, 1.0)]),
            stars: Ladder::above(&[(100_000.0, -3.0), (50_000.0, -2.0), (10_000.0, -1.0)]),
            contributors: Ladder::above(&[(50.0, -2.0), (20.0, -1.5), (5.0, -1.0)]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub count_multiplier: f64,
    pub count_max: f64,
    pub avg_views: Ladder,
    pub recency_max: f64,
    pub recency_horizon_days: f64,
    pub trend: GrowthAdjustment,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            count_multiplier: 1.2,
            count_max: 2.5,
            avg_views: Ladder::at_least(&[
                (100_000.0, 4.0),
                (30_000.0, 3.0),
                (10_000.0, 2.0),
                (3_000.0, 1.0),
                (1.0, 0.5),
            ]),
            recency_max: 1.5,
            recency_horizon_days: 60.0,
            trend: GrowthAdjustment {
                rising: Ladder::above(&[(0.5, 2.0), (0.2, 1.4), (0.0, 0.8)]),
                falling: Ladder::below(&[(-0.5, -1.0), (-0.2, -0.7), (0.0, -0.4)]),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdoptionConfig {
    /// log10 of the company count that maps to a fully alive score.
    pub log_scale: f64,
    pub max_alive: f64,
}

impl Default for AdoptionConfig {
    fn default() -> Self {
        Self {
            log_scale: 4.0,
            max_alive: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Share of a source's weight credited for merely being present.
    pub coverage_floor: f64,
    /// Volume at which a source reaches half of its volume credit.
    pub half_saturation: SourceWeights,
    pub sigma_base: f64,
    pub z: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            coverage_floor: 0.5,
            half_saturation: SourceWeights::from_pairs(&[
                (SourceId::CodeHosting, 30.0),
                (SourceId::JobMarket, 1_000.0),
                (SourceId::CommunityForum, 15.0),
                (SourceId::AdoptionDirectory, 3.0),
                (SourceId::VideoPlatform, 10.0),
                (SourceId::Qa, 30.0),
                (SourceId::LinkAggregator, 10.0),
            ]),
            sigma_base: 0.5,
            z: 1.96,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Inclusive upper bounds for very active, active, stable and declining.
    pub tier_bounds: Vec<f64>,
    pub commentary_buckets: usize,
    pub highlight_active_max: f64,
    pub highlight_abandoned_min: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            tier_bounds: vec![2.0, 4.0, 6.0, 8.0],
            commentary_buckets: 4,
            highlight_active_max: 2.0,
            highlight_abandoned_min: 8.0,
        }
    }
}

/// Every weight and threshold the engine uses. Loaded once per run and
/// shared read-only between scoring tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub schema_version: u32,
    /// Revision of the tuning, stamped on every snapshot.
    pub version: u32,
    pub weights: WeightConfig,
    pub maturity: MaturityConfig,
    pub qa: QaConfig,
    pub forum: ForumConfig,
    pub link_aggregator: LinkAggregatorConfig,
    pub jobs: JobMarketConfig,
    pub code_hosting: CodeHostingConfig,
    pub video: VideoConfig,
    pub adoption: AdoptionConfig,
    pub confidence: ConfidenceConfig,
    pub classifier: ClassifierConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            version: 1,
            weights: WeightConfig::default(),
            maturity: MaturityConfig::default(),
            qa: QaConfig::default(),
            forum: ForumConfig::default(),
            link_aggregator: LinkAggregatorConfig::default(),
            jobs: JobMarketConfig::default(),
            code_hosting: CodeHostingConfig::default(),
            video: VideoConfig::default(),
            adoption: AdoptionConfig::default(),
            confidence: ConfidenceConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.weights.base.validate("base")?;
        self.weights.young.validate("young")?;
        self.confidence.half_saturation.validate("half_saturation")?;

        let qa = &self.qa;
        for (name, ladder) in [
            ("qa.answered_ratio", &qa.answered_ratio),
            ("qa.accepted_ratio", &qa.accepted_ratio),
            ("qa.zero_answer_ratio", &qa.zero_answer_ratio),
            ("qa.response_hours", &qa.response_hours),
            ("qa.duplicate_ratio", &qa.duplicate_ratio),
            ("qa.avg_views", &qa.avg_views),
            ("qa.views_per_answer", &qa.views_per_answer),
            ("qa.volume", &qa.volume),
            ("qa.days_since_activity", &qa.days_since_activity),
            ("forum.subscribers", &self.forum.subscribers),
            ("forum.posts", &self.forum.posts),
            ("forum.engagement", &self.forum.engagement),
            ("jobs.tiers", &self.jobs.tiers),
            ("code_hosting.commits_penalty", &self.code_hosting.commits_penalty),
            ("code_hosting.commits_bonus", &self.code_hosting.commits_bonus),
            ("code_hosting.pr_age_days", &self.code_hosting.pr_age_days),
            ("code_hosting.release_age_days", &self.code_hosting.release_age_days),
            ("code_hosting.push_age_days", &self.code_hosting.push_age_days),
            ("code_hosting.stars", &self.code_hosting.stars),
            ("code_hosting.contributors", &self.code_hosting.contributors),
            ("video.avg_views", &self.video.avg_views),
        ] {
            ladder.validate(name)?;
        }
        self.forum.trend.growth.validate("forum.trend.growth")?;
        self.video.trend.validate("video.trend")?;

        for (name, value) in [
            ("forum.subscribers_max", self.forum.subscribers_max),
            ("forum.posts_max", self.forum.posts_max),
            ("forum.engagement_max", self.forum.engagement_max),
            ("forum.trend.scale", self.forum.trend.scale),
            ("link_aggregator.volume_divisor", self.link_aggregator.volume_divisor),
            ("link_aggregator.karma_divisor", self.link_aggregator.karma_divisor),
            ("link_aggregator.recency_horizon_days", self.link_aggregator.recency_horizon_days),
            ("video.recency_horizon_days", self.video.recency_horizon_days),
            ("adoption.log_scale", self.adoption.log_scale),
            ("confidence.sigma_base", self.confidence.sigma_base),
        ] {
            require_positive(name, value)?;
        }

        for (name, value) in [
            ("maturity.young_factor", self.maturity.young_factor),
            ("maturity.maturing_factor", self.maturity.maturing_factor),
            ("forum.decline.steepness", self.forum.decline.steepness),
            ("forum.decline.max_penalty", self.forum.decline.max_penalty),
            ("forum.migration_cap", self.forum.migration_cap),
            ("forum.alive_knee", self.forum.alive_knee),
            ("forum.low_alive_multiplier", self.forum.low_alive_multiplier),
            ("forum.growth_cap", self.forum.growth_cap),
            ("confidence.z", self.confidence.z),
        ] {
            require_non_negative(name, value)?;
        }

        let floor = self.confidence.coverage_floor;
        if !(0.0..=1.0).contains(&floor) {
            return Err(ConfigError::InvalidParameter {
                name: "confidence.coverage_floor".to_string(),
                value: floor,
            });
        }

        let bounds = &self.classifier.tier_bounds;
        let ascending = bounds.windows(2).all(|pair| pair[0] < pair[1]);
        let in_range = bounds.iter().all(|b| (0.0..=10.0).contains(b));
        if bounds.len() != 4 || !ascending || !in_range {
            return Err(ConfigError::InvalidTierBounds);
        }
        if self.classifier.commentary_buckets == 0 {
            return Err(ConfigError::NoCommentaryBuckets);
        }

        Ok(())
    }
}

fn require_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name: name.to_string(),
            value,
        })
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name: name.to_string(),
            value,
        })
    }
}
