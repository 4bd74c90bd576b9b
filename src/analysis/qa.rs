use crate::models::config::QaConfig;
use crate::models::metrics::RawSourceMetrics;
use crate::models::snapshot::SourceReading;

#[derive(Default)]
struct Tally {
    points: f64,
    details: Vec<String>,
}

impl Tally {
    fn add(&mut self, label: impl FnOnce() -> String, points: f64) {
        if points != 0.0 {
            self.points += points;
            self.details.push(format!("{} (+{points})", label()));
        }
    }
}

/// Score Q&A health (0 = thriving, 10 = dead) with an additive point system.
///
/// Every rule adds points when its signal looks unhealthy:
/// - low answered / accepted ratios, many zero-answer questions
/// - slow first answers, many duplicates
/// - few views, or many views that nobody answers
/// - low weekly volume and long silence
///
/// Ratio rules are skipped when their denominator is zero, so an empty week
/// only triggers the volume and last-activity rules. Without a usable
/// question count only the last-activity rule applies. Returns `None` when
/// neither the question count nor the last activity is usable.
pub fn score_qa(raw: &RawSourceMetrics, config: &QaConfig) -> Option<SourceReading> {
    let questions = raw.count("questions");
    let last_activity = raw.count("days_since_last_activity");
    if questions.is_none() && last_activity.is_none() {
        return None;
    }
    let mut tally = Tally::default();

    if let Some(days) = last_activity {
        tally.add(
            || format!("{days} days since last activity"),
            config.days_since_activity.value(days),
        );
    }
    if let Some(questions) = questions {
        tally.add(
            || format!("{questions} questions in window"),
            config.volume.value(questions),
        );
        score_ratios(raw, questions, config, &mut tally);
    }

    log::debug!("qa: {} points from {} rules", tally.points, tally.details.len());
    Some(SourceReading::new(
        tally.points,
        questions.unwrap_or(0.0),
        tally.details,
    ))
}

fn score_ratios(raw: &RawSourceMetrics, questions: f64, config: &QaConfig, tally: &mut Tally) {
    if questions <= 0.0 {
        return;
    }

    let answered = raw.count("answered").map(|a| a.min(questions));
    let answered_ratio = answered.map(|a| a / questions);

    if let Some(ratio) = answered_ratio {
        tally.add(
            || format!("answered ratio {}", percent(ratio)),
            config.answered_ratio.value(ratio),
        );
    }
    if let Some(zero) = raw.count("zero_answer") {
        let ratio = (zero / questions).min(1.0);
        tally.add(
            || format!("zero-answer ratio {}", percent(ratio)),
            config.zero_answer_ratio.value(ratio),
        );
    }
    if let Some(hours) = raw.count("median_hours_to_first_answer") {
        tally.add(
            || format!("median first answer after {hours}h"),
            config.response_hours.value(hours),
        );
    }
    if let Some(duplicates) = raw.count("duplicates") {
        let ratio = (duplicates / questions).min(1.0);
        tally.add(
            || format!("duplicate ratio {}", percent(ratio)),
            config.duplicate_ratio.value(ratio),
        );
    }
    let avg_views = raw.count("avg_views");
    if let Some(views) = avg_views {
        tally.add(
            || format!("{views} average views"),
            config.avg_views.value(views),
        );
    }
    if let (Some(high_views), Some(ratio)) =
        (raw.count("high_view_questions"), answered_ratio)
    {
        let share = high_views / questions;
        if share >= config.high_view_share && ratio < config.high_view_answered_below {
            tally.add(
                || format!("{} of questions draw views but stay unanswered", percent(share)),
                config.high_view_points,
            );
        }
    }

    if let Some(answered) = answered.filter(|a| *a > 0.0) {
        if let Some(accepted) = raw.count("accepted") {
            let ratio = (accepted / answered).min(1.0);
            tally.add(
                || format!("accepted ratio {}", percent(ratio)),
                config.accepted_ratio.value(ratio),
            );
        }

        let views_total = raw
            .count("views_total")
            .or_else(|| avg_views.map(|v| v * questions));
        if let Some(total) = views_total {
            let per_answer = total / answered;
            tally.add(
                || format!("{per_answer:.0} views per answer"),
                config.views_per_answer.value(per_answer),
            );
        }
    }
}

fn percent(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn score(payload: serde_json::Value) -> SourceReading {
        score_qa(&RawSourceMetrics::from(payload), &QaConfig::default()).expect("usable payload")
    }

    #[test]
    fn struggling_community_sums_to_sixteen_and_clamps() {
        let reading = score(json!({
            "questions": 5,
            "answered": 1,
            "zero_answer": 3,
            "accepted": 0,
            "median_hours_to_first_answer": 60,
            "duplicates": 0,
            "avg_views": 5,
            "days_since_last_activity": 200
        }));

        // 3 volume + 3 answered + 2 zero-answer + 2 accepted
        // + 2 response time + 2 views + 2 silence
        assert_eq!(reading.details.len(), 7);
        assert_eq!(reading.sub_score, 10.0);
        assert_eq!(reading.sample_size, 5);
    }

    #[test]
    fn empty_week_only_fires_volume_rule() {
        let reading = score(json!({
            "questions": 0,
            "answered": 0,
            "zero_answer": 0,
            "accepted": 0,
            "avg_views": 0
        }));

        assert_eq!(reading.sub_score, 3.0);
        assert_eq!(reading.details.len(), 1);
    }

    #[test]
    fn empty_week_with_silence_adds_activity_rule() {
        let reading = score(json!({ "questions": 0, "days_since_last_activity": 90 }));
        assert_eq!(reading.sub_score, 4.0);
    }

    #[test]
    fn low_answered_ratio_alone_gives_three_points() {
        let reading = score(json!({
            "questions": 100,
            "answered": 20,
            "accepted": 20,
            "zero_answer": 0,
            "median_hours_to_first_answer": 1,
            "duplicates": 0,
            "avg_views": 50,
            "days_since_last_activity": 0
        }));

        assert_eq!(reading.sub_score, 3.0);
    }

    #[test]
    fn healthy_community_scores_zero() {
        let reading = score(json!({
            "questions": 400,
            "answered": 380,
            "accepted": 250,
            "zero_answer": 10,
            "median_hours_to_first_answer": 2,
            "duplicates": 12,
            "avg_views": 150,
            "days_since_last_activity": 0
        }));

        assert_eq!(reading.sub_score, 0.0);
        assert!(reading.details.is_empty());
    }

    #[test]
    fn zero_answered_skips_accepted_and_views_per_answer() {
        let reading = score(json!({
            "questions": 60,
            "answered": 0,
            "accepted": 0,
            "avg_views": 100
        }));

        // answered ratio 0% only
        assert_eq!(reading.sub_score, 3.0);
    }

    #[test]
    fn many_views_per_answer_adds_point() {
        let reading = score(json!({
            "questions": 100,
            "answered": 90,
            "accepted": 50,
            "views_total": 100_000,
            "avg_views": 1000
        }));

        assert_eq!(reading.sub_score, 1.0);
    }

    #[test]
    fn high_view_unanswered_pattern() {
        let reading = score(json!({
            "questions": 100,
            "answered": 40,
            "accepted": 20,
            "high_view_questions": 30,
            "avg_views": 100,
            "views_total": 100
        }));

        // answered ratio 40% (+2) and the high-view pattern (+1)
        assert_eq!(reading.sub_score, 3.0);
    }

    #[test]
    fn malformed_question_count_keeps_activity_rule() {
        let reading = score(json!({
            "questions": "n/a",
            "answered": 3,
            "days_since_last_activity": 300
        }));

        assert_eq!(reading.sub_score, 2.0);
        assert_eq!(reading.sample_size, 0);
        assert_eq!(reading.details.len(), 1);
    }

    #[test]
    fn payload_without_questions_or_activity_is_unusable() {
        let raw = RawSourceMetrics::from(json!({ "answered": 3 }));
        assert!(score_qa(&raw, &QaConfig::default()).is_none());

        let malformed = RawSourceMetrics::from(json!({
            "questions": "lots",
            "days_since_last_activity": -4
        }));
        assert!(score_qa(&malformed, &QaConfig::default()).is_none());
    }
}
