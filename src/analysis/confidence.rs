use crate::models::config::{ConfidenceConfig, SourceWeights};
use crate::models::metrics::SourceId;
use crate::models::snapshot::{clamp_score, ComponentScore, ScoreBand};
use std::collections::BTreeMap;

/// Share of a source's volume credit earned by `sample_size`: 0 with no
/// data, 0.5 at the half-saturation point, approaching 1 with more.
pub fn volume_factor(sample_size: u64, half_saturation: f64) -> f64 {
    let n = sample_size as f64;
    let denominator = n + half_saturation.max(0.0);
    if denominator <= 0.0 {
        return 0.0;
    }
    n / denominator
}

/// How much of the possible evidence backed a score, in [0, 1].
///
/// Each present source contributes its share of the weight profile, scaled
/// between `coverage_floor` (present but thin) and 1 (large sample). Adding a
/// source or growing a sample never lowers the result. Metadata only: the
/// composite score does not depend on it.
pub fn estimate_confidence(
    components: &BTreeMap<SourceId, ComponentScore>,
    profile: &SourceWeights,
    config: &ConfidenceConfig,
) -> f64 {
    let total = profile.total();
    if total <= 0.0 {
        return 0.0;
    }

    let floor = config.coverage_floor;
    let confidence: f64 = components
        .values()
        .map(|component| {
            let coverage = profile.get(component.source_id) / total;
            let volume = volume_factor(
                component.sample_size,
                config.half_saturation.get(component.source_id),
            );
            coverage * (floor + (1.0 - floor) * volume)
        })
        .sum();

    confidence.clamp(0.0, 1.0)
}

/// Approximate 95% band around `score`. Sources backed by thin samples
/// widen it; the band is clamped to the score range.
pub fn score_band(
    score: f64,
    components: &BTreeMap<SourceId, ComponentScore>,
    config: &ConfidenceConfig,
) -> ScoreBand {
    let variance: f64 = components
        .values()
        .map(|component| {
            let quality = volume_factor(
                component.sample_size,
                config.half_saturation.get(component.source_id),
            )
            .max(0.25);
            let sigma = config.sigma_base / quality.sqrt();
            component.weight * component.weight * sigma * sigma
        })
        .sum();
    let margin = config.z * variance.sqrt();

    ScoreBand {
        low: clamp_score(score - margin),
        high: clamp_score(score + margin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::WeightConfig;

    fn component(source_id: SourceId, weight: f64, sample_size: u64) -> ComponentScore {
        ComponentScore {
            source_id,
            sub_score: 5.0,
            weight,
            base_weight: weight,
            sample_size,
            details: vec![],
        }
    }

    fn components(entries: &[(SourceId, u64)]) -> BTreeMap<SourceId, ComponentScore> {
        let profile = WeightConfig::default().base;
        entries
            .iter()
            .map(|&(source, n)| (source, component(source, profile.get(source), n)))
            .collect()
    }

    #[test]
    fn no_sources_means_no_confidence() {
        let config = ConfidenceConfig::default();
        let profile = WeightConfig::default().base;
        assert_eq!(estimate_confidence(&BTreeMap::new(), &profile, &config), 0.0);
    }

    #[test]
    fn full_coverage_with_huge_samples_approaches_one() {
        let config = ConfidenceConfig::default();
        let profile = WeightConfig::default().base;
        let all: Vec<(SourceId, u64)> = SourceId::ALL.iter().map(|s| (*s, 10_000_000)).collect();

        let confidence = estimate_confidence(&components(&all), &profile, &config);
        assert!(confidence > 0.99 && confidence <= 1.0);
    }

    #[test]
    fn adding_a_source_never_lowers_confidence() {
        let config = ConfidenceConfig::default();
        let profile = WeightConfig::default().base;
        let one = components(&[(SourceId::Qa, 40)]);
        let two = components(&[(SourceId::Qa, 40), (SourceId::JobMarket, 0)]);

        assert!(
            estimate_confidence(&two, &profile, &config)
                >= estimate_confidence(&one, &profile, &config)
        );
    }

    #[test]
    fn larger_samples_raise_confidence() {
        let config = ConfidenceConfig::default();
        let profile = WeightConfig::default().base;
        let thin = components(&[(SourceId::CodeHosting, 3)]);
        let thick = components(&[(SourceId::CodeHosting, 300)]);

        let low = estimate_confidence(&thin, &profile, &config);
        let high = estimate_confidence(&thick, &profile, &config);
        assert!(low < high);
        assert!(low >= 0.2 * 0.5);
    }

    #[test]
    fn band_tightens_with_volume_and_stays_in_range() {
        let config = ConfidenceConfig::default();
        let mut thin = BTreeMap::new();
        thin.insert(SourceId::Qa, component(SourceId::Qa, 1.0, 0));
        let mut thick = BTreeMap::new();
        thick.insert(SourceId::Qa, component(SourceId::Qa, 1.0, 10_000));

        let wide = score_band(9.5, &thin, &config);
        let narrow = score_band(5.0, &thick, &config);

        assert_eq!(wide.high, 10.0);
        assert!(wide.low < 9.5);
        assert!(narrow.high - narrow.low < 2.0);
        assert!(narrow.low <= 5.0 && narrow.high >= 5.0);
    }
}
