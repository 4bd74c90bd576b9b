use crate::models::config::AdoptionConfig;
use crate::models::metrics::RawSourceMetrics;
use crate::models::snapshot::SourceReading;

/// Score how many companies publicly run the technology, on a log scale.
/// When several directories report counts, their median is used.
pub fn score_adoption(raw: &RawSourceMetrics, config: &AdoptionConfig) -> Option<SourceReading> {
    let companies = raw
        .count("company_count")
        .or_else(|| raw.counts("company_counts").map(median))?;

    let alive = (companies.max(1.0).log10() / config.log_scale * config.max_alive)
        .min(config.max_alive);

    Some(SourceReading::new(
        10.0 - alive,
        companies,
        vec![format!("{companies} companies")],
    ))
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
