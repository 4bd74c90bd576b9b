use crate::models::config::JobMarketConfig;
use crate::models::metrics::RawSourceMetrics;
use crate::models::snapshot::SourceReading;

/// Map open job postings onto the tier ladder. Falls back to summing the
/// per-region counts when no total is reported, and gives `None` when
/// neither is usable.
pub fn score_jobs(raw: &RawSourceMetrics, config: &JobMarketConfig) -> Option<SourceReading> {
    let total = raw.count("total_jobs").or_else(|| raw.sum_of("by_region"))?;
    let sub_score = config.tiers.value(total);

    Some(SourceReading::new(
        sub_score,
        total,
        vec![format!("{total} open postings")],
    ))
}
