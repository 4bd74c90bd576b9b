use crate::analysis::trend;
use crate::models::config::VideoConfig;
use crate::models::metrics::RawSourceMetrics;
use crate::models::snapshot::SourceReading;

/// Score learning-content activity. Alive points come from upload count,
/// audience size, how recent the last upload is and the upload trend.
/// Unusable fields score no alive points; `None` means none was usable.
pub fn score_video(raw: &RawSourceMetrics, config: &VideoConfig) -> Option<SourceReading> {
    let videos = raw.count("video_count");
    let views = raw.count("avg_views");
    let last_upload = raw.count("days_since_last_upload");
    let growth = trend::growth_rate(raw);
    if videos.is_none() && views.is_none() && last_upload.is_none() && growth.is_none() {
        return None;
    }
    if videos == Some(0.0) {
        return Some(SourceReading::new(10.0, 0.0, vec!["no recent videos".to_string()]));
    }

    let count_score = videos
        .map(|videos| (config.count_multiplier * videos.log10()).clamp(0.0, config.count_max))
        .unwrap_or(0.0);
    let view_score = views.map(|views| config.avg_views.value(views)).unwrap_or(0.0);
    let recency = last_upload
        .map(|days| trend::linear_recency(days, config.recency_max, config.recency_horizon_days))
        .unwrap_or(0.0);
    let trend_score = growth.map(|g| config.trend.value(g)).unwrap_or(0.0);

    let alive = count_score + view_score + recency + trend_score;
    let mut details = vec![format!(
        "count {count_score:.2}, views {view_score}, recency {recency:.2}"
    )];
    if let Some(videos) = videos {
        details.push(format!("{videos} videos"));
    }
    if let Some(g) = growth {
        details.push(format!("upload growth {:+.0}% ({trend_score:+})", g * 100.0));
    }

    Some(SourceReading::new(10.0 - alive, videos.unwrap_or(0.0), details))
}
