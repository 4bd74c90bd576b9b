use crate::models::config::CodeHostingConfig;
use crate::models::metrics::RawSourceMetrics;
use crate::models::snapshot::SourceReading;

/// Score repository health starting from a neutral baseline.
///
/// Staleness signals (few commits, old PRs, old releases, no recent push)
/// add to the baseline. Momentum signals (busy commit log, many stars,
/// broad contributor base) subtract from it. Each rule needs only its own
/// field; `None` means no field in the payload was usable.
pub fn score_code_hosting(
    raw: &RawSourceMetrics,
    config: &CodeHostingConfig,
) -> Option<SourceReading> {
    let commits = raw.count("commits_last_30d");
    let pr_age = raw.count("avg_open_pr_age_days");
    let has_releases = raw.flag("has_releases");
    let release_age = raw.count("days_since_release");
    let push_age = raw.count("days_since_push");
    let stars = raw.count("stars");
    let contributors = raw.count("contributors");

    let observed = [commits, pr_age, release_age, push_age, stars, contributors]
        .iter()
        .any(Option::is_some);
    if !observed && has_releases.is_none() {
        return None;
    }

    let mut score = config.baseline;
    let mut details = Vec::new();
    let mut apply = |label: String, delta: f64| {
        if delta != 0.0 {
            score += delta;
            details.push(format!("{label} ({delta:+})"));
        }
    };

    if let Some(n) = commits {
        apply(
            format!("{n} commits in 30 days"),
            config.commits_penalty.value(n) + config.commits_bonus.value(n),
        );
    }
    if let Some(days) = pr_age {
        apply(format!("open PRs average {days} days"), config.pr_age_days.value(days));
    }
    match (has_releases, release_age) {
        (Some(false), _) => apply("no releases".to_string(), config.no_release_penalty),
        (_, Some(days)) => apply(
            format!("{days} days since release"),
            config.release_age_days.value(days),
        ),
        _ => {}
    }
    if let Some(days) = push_age {
        apply(format!("{days} days since push"), config.push_age_days.value(days));
    }
    if let Some(stars) = stars {
        apply(format!("{stars} stars"), config.stars.value(stars));
    }
    if let Some(contributors) = contributors {
        apply(
            format!("{contributors} contributors"),
            config.contributors.value(contributors),
        );
    }

    Some(SourceReading::new(score, commits.unwrap_or(0.0), details))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn score(payload: serde_json::Value) -> Option<f64> {
        score_code_hosting(&RawSourceMetrics::from(payload), &CodeHostingConfig::default())
            .map(|reading| reading.sub_score)
    }

    #[test]
    fn flagship_project_bottoms_out() {
        let value = score(json!({
            "commits_last_30d": 450,
            "avg_open_pr_age_days": 12,
            "days_since_release": 14,
            "days_since_push": 0,
            "stars": 210_000,
            "contributors": 1800
        }));
        assert_eq!(value, Some(0.0));
    }

    #[test]
    fn frozen_repository_tops_out() {
        let value = score(json!({
            "commits_last_30d": 0,
            "avg_open_pr_age_days": 400,
            "has_releases": false,
            "days_since_push": 800,
            "stars": 300,
            "contributors": 2
        }));
        assert_eq!(value, Some(10.0));
    }

    #[test]
    fn moderate_activity_stays_near_baseline() {
        let value = score(json!({
            "commits_last_30d": 35,
            "days_since_release": 45,
            "days_since_push": 3,
            "stars": 4000,
            "contributors": 4
        }));
        assert_eq!(value, Some(5.0));
    }

    #[test]
    fn push_age_alone_is_usable() {
        assert_eq!(score(json!({ "days_since_push": 200 })), Some(6.0));
    }

    #[test]
    fn popularity_without_commit_data_still_scores() {
        let value = score(json!({
            "commits_last_30d": "unknown",
            "stars": 200_000,
            "contributors": 900,
            "days_since_release": 3
        }));
        assert_eq!(value, Some(0.0));
        assert_eq!(score(json!({ "stars": 90_000 })), Some(3.0));
        assert_eq!(score(json!({ "has_releases": false })), Some(7.0));
    }

    #[test]
    fn commit_bonus_needs_strictly_more_than_bound() {
        assert_eq!(score(json!({ "commits_last_30d": 50 })), Some(5.0));
        assert_eq!(score(json!({ "commits_last_30d": 51 })), Some(3.5));
        assert_eq!(score(json!({ "commits_last_30d": 100 })), Some(3.5));
        assert_eq!(score(json!({ "commits_last_30d": 101 })), Some(3.0));
    }

    #[test]
    fn payload_without_usable_fields_is_unusable() {
        assert_eq!(score(json!({})), None);
        assert_eq!(score(json!({ "stars": "many", "contributors": -3 })), None);
    }
}
