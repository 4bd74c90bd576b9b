use crate::models::config::{ClassifierConfig, SourceWeights};
use crate::models::metrics::SourceId;
use crate::models::snapshot::{clamp_score, ComponentScore, Dimension, SourceReading};
use std::collections::BTreeMap;

/// Turn readings into weighted components.
///
/// Weights are renormalized over the sources that are actually present, so
/// applied weights always sum to 1. Sources without weight in the profile
/// are dropped. Returns no composite when nothing carries weight.
pub fn aggregate(
    readings: BTreeMap<SourceId, SourceReading>,
    profile: &SourceWeights,
) -> (BTreeMap<SourceId, ComponentScore>, Option<f64>) {
    let present_total: f64 = readings
        .keys()
        .map(|source| profile.get(*source))
        .filter(|w| *w > 0.0)
        .sum();
    if present_total <= 0.0 {
        return (BTreeMap::new(), None);
    }

    let components: BTreeMap<SourceId, ComponentScore> = readings
        .into_iter()
        .filter(|(source, _)| profile.get(*source) > 0.0)
        .map(|(source, reading)| {
            let base_weight = profile.get(source);
            let component = ComponentScore {
                source_id: source,
                sub_score: reading.sub_score,
                weight: base_weight / present_total,
                base_weight,
                sample_size: reading.sample_size,
                details: reading.details,
            };
            (source, component)
        })
        .collect();

    let score = components.values().map(ComponentScore::contribution).sum();
    (components, Some(clamp_score(score)))
}

/// Weighted mean per display dimension, scaled by the maturity factor.
/// Dimensions with no present source are left out.
pub fn dimension_scores(
    components: &BTreeMap<SourceId, ComponentScore>,
    factor: f64,
) -> BTreeMap<Dimension, f64> {
    Dimension::ALL
        .iter()
        .filter_map(|dimension| {
            let members: Vec<&ComponentScore> = dimension
                .sources()
                .iter()
                .filter_map(|source| components.get(source))
                .collect();
            let weight: f64 = members.iter().map(|c| c.weight).sum();
            if weight <= 0.0 {
                return None;
            }
            let mean = members.iter().map(|c| c.contribution()).sum::<f64>() / weight;
            Some((*dimension, clamp_score(mean * factor)))
        })
        .collect()
}

pub fn highlights(
    components: &BTreeMap<SourceId, ComponentScore>,
    config: &ClassifierConfig,
) -> Vec<String> {
    components
        .values()
        .filter_map(|c| {
            if c.sub_score <= config.highlight_active_max {
                Some(format!("{} looks very active ({:.1})", c.source_id, c.sub_score))
            } else if c.sub_score >= config.highlight_abandoned_min {
                Some(format!("{} looks abandoned ({:.1})", c.source_id, c.sub_score))
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::WeightConfig;

    fn reading(sub_score: f64) -> SourceReading {
        SourceReading::new(sub_score, 10.0, vec![])
    }

    #[test]
    fn two_sources_renormalize_their_weights() {
        let profile = WeightConfig::default().base;
        let mut readings = BTreeMap::new();
        readings.insert(SourceId::Qa, reading(8.0));
        readings.insert(SourceId::JobMarket, reading(2.0));

        let (components, score) = aggregate(readings, &profile);

        let qa = &components[&SourceId::Qa];
        let jobs = &components[&SourceId::JobMarket];
        assert!((qa.weight - 0.10 / 0.30).abs() < 1e-9);
        assert!((jobs.weight - 0.20 / 0.30).abs() < 1e-9);
        assert_eq!(qa.base_weight, 0.10);
        assert!((score.unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn nothing_present_means_no_composite() {
        let profile = WeightConfig::default().base;
        let (components, score) = aggregate(BTreeMap::new(), &profile);
        assert!(components.is_empty());
        assert_eq!(score, None);
    }

    #[test]
    fn zero_weight_sources_are_dropped() {
        let profile = SourceWeights::from_pairs(&[(SourceId::Qa, 1.0), (SourceId::JobMarket, 0.0)]);
        let mut readings = BTreeMap::new();
        readings.insert(SourceId::Qa, reading(6.0));
        readings.insert(SourceId::JobMarket, reading(1.0));

        let (components, score) = aggregate(readings, &profile);
        assert_eq!(components.len(), 1);
        assert_eq!(score, Some(6.0));

        let mut only_unweighted = BTreeMap::new();
        only_unweighted.insert(SourceId::JobMarket, reading(1.0));
        assert_eq!(aggregate(only_unweighted, &profile).1, None);
    }

    #[test]
    fn community_dimension_blends_forum_and_link_aggregator() {
        let profile = WeightConfig::default().base;
        let mut readings = BTreeMap::new();
        readings.insert(SourceId::CommunityForum, reading(6.0));
        readings.insert(SourceId::LinkAggregator, reading(0.0));
        readings.insert(SourceId::Qa, reading(9.0));

        let (components, _) = aggregate(readings, &profile);
        let dimensions = dimension_scores(&components, 1.0);

        // forum 0.15 and link 0.05 weigh 3:1
        assert!((dimensions[&Dimension::Community] - 4.5).abs() < 1e-9);
        assert!((dimensions[&Dimension::Support] - 9.0).abs() < 1e-9);
        assert!(!dimensions.contains_key(&Dimension::Jobs));

        let young = dimension_scores(&components, 0.9);
        assert!((young[&Dimension::Support] - 8.1).abs() < 1e-9);
    }

    #[test]
    fn highlights_flag_extremes_only() {
        let profile = WeightConfig::default().base;
        let mut readings = BTreeMap::new();
        readings.insert(SourceId::CodeHosting, reading(1.0));
        readings.insert(SourceId::JobMarket, reading(5.0));
        readings.insert(SourceId::VideoPlatform, reading(9.0));

        let (components, _) = aggregate(readings, &profile);
        let notes = highlights(&components, &ClassifierConfig::default());

        assert_eq!(notes.len(), 2);
        assert!(notes[0].starts_with("code_hosting looks very active"));
        assert!(notes[1].starts_with("video_platform looks abandoned"));
    }
}
