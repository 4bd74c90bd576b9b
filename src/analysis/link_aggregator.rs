use crate::analysis::trend;
use crate::models::config::LinkAggregatorConfig;
use crate::models::metrics::RawSourceMetrics;
use crate::models::snapshot::SourceReading;

/// Score link-aggregator buzz from post volume, average points and recency.
/// No posts at all is read as fully dead. A missing or malformed field adds
/// nothing to the alive score; `None` means no field was usable.
pub fn score_link_aggregator(
    raw: &RawSourceMetrics,
    config: &LinkAggregatorConfig,
) -> Option<SourceReading> {
    let posts = raw.count("post_count");
    let points = raw.count("avg_points");
    let last_post = raw.count("days_since_last_post");
    if posts.is_none() && points.is_none() && last_post.is_none() {
        return None;
    }
    if posts == Some(0.0) {
        return Some(SourceReading::new(10.0, 0.0, vec!["no posts in window".to_string()]));
    }

    let volume = posts
        .map(|posts| (posts / config.volume_divisor).min(10.0))
        .unwrap_or(0.0);
    let karma = points
        .map(|points| (points / config.karma_divisor).min(10.0))
        .unwrap_or(0.0);
    let recency = match last_post {
        Some(days) if days <= config.fresh_within_days => 10.0,
        Some(days) => trend::linear_recency(days, 10.0, config.recency_horizon_days),
        None => 0.0,
    };

    let alive = volume * config.volume_weight
        + karma * config.karma_weight
        + recency * config.recency_weight;

    Some(SourceReading::new(
        10.0 - alive,
        posts.unwrap_or(0.0),
        vec![format!(
            "volume {volume:.1}, karma {karma:.1}, recency {recency:.1}"
        )],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn score(payload: serde_json::Value) -> f64 {
        score_link_aggregator(&RawSourceMetrics::from(payload), &LinkAggregatorConfig::default())
            .expect("usable payload")
            .sub_score
    }

    #[test]
    fn zero_posts_is_dead() {
        assert_eq!(score(json!({ "post_count": 0, "avg_points": 500 })), 10.0);
    }

    #[test]
    fn busy_fresh_front_page_is_alive() {
        let value = score(json!({
            "post_count": 40,
            "avg_points": 80,
            "days_since_last_post": 1
        }));
        assert_eq!(value, 0.0);
    }

    #[test]
    fn recency_decays_after_first_week() {
        let fresh = score(json!({ "post_count": 4, "avg_points": 10, "days_since_last_post": 7 }));
        let stale = score(json!({ "post_count": 4, "avg_points": 10, "days_since_last_post": 60 }));
        let gone = score(json!({ "post_count": 4, "avg_points": 10, "days_since_last_post": 400 }));

        // volume 2 and karma 2 give 1.6 alive before recency
        assert!((fresh - 6.4).abs() < 1e-9);
        assert!((stale - 7.4).abs() < 1e-9);
        assert!((gone - 8.4).abs() < 1e-9);
    }

    #[test]
    fn malformed_post_count_keeps_karma_and_recency() {
        let value = score(json!({
            "post_count": "n/a",
            "avg_points": 10,
            "days_since_last_post": 3
        }));
        // karma 2 and fresh recency 10 give 2.8 alive
        assert!((value - 7.2).abs() < 1e-9);
    }

    #[test]
    fn payload_without_usable_fields_is_unusable() {
        let raw = RawSourceMetrics::from(json!({ "post_count": -1, "avg_points": null }));
        assert!(score_link_aggregator(&raw, &LinkAggregatorConfig::default()).is_none());
    }
}
