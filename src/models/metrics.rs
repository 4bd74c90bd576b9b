use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Signal sources the engine knows how to normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    CodeHosting,
    JobMarket,
    CommunityForum,
    AdoptionDirectory,
    VideoPlatform,
    Qa,
    LinkAggregator,
}

impl SourceId {
    pub const ALL: [SourceId; 7] = [
        SourceId::CodeHosting,
        SourceId::JobMarket,
        SourceId::CommunityForum,
        SourceId::AdoptionDirectory,
        SourceId::VideoPlatform,
        SourceId::Qa,
        SourceId::LinkAggregator,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceId::CodeHosting => "code_hosting",
            SourceId::JobMarket => "job_market",
            SourceId::CommunityForum => "community_forum",
            SourceId::AdoptionDirectory => "adoption_directory",
            SourceId::VideoPlatform => "video_platform",
            SourceId::Qa => "qa",
            SourceId::LinkAggregator => "link_aggregator",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw counters collected for one source, as delivered by the collectors.
///
/// The bag is deliberately untyped: every accessor returns `None` for a
/// field that is missing, non-numeric, non-finite or outside its domain, so
/// normalizers never see NaN or negative counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSourceMetrics(Map<String, Value>);

impl RawSourceMetrics {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Non-negative finite number.
    pub fn count(&self, key: &str) -> Option<f64> {
        self.signed(key).filter(|v| *v >= 0.0)
    }

    /// Finite number of any sign (growth rates, deltas).
    pub fn signed(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(finite_number)
    }

    pub fn bounded(&self, key: &str, lo: f64, hi: f64) -> Option<f64> {
        self.signed(key).filter(|v| (lo..=hi).contains(v))
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Valid counts of an array field; malformed entries are skipped.
    pub fn counts(&self, key: &str) -> Option<Vec<f64>> {
        let values: Vec<f64> = self
            .0
            .get(key)?
            .as_array()?
            .iter()
            .filter_map(finite_number)
            .filter(|v| *v >= 0.0)
            .collect();

        if values.is_empty() {
            None
        } else {
            Some(values)
        }
    }

    /// Sum of the valid counts held in an object or array field.
    pub fn sum_of(&self, key: &str) -> Option<f64> {
        let entries: Vec<&Value> = match self.0.get(key)? {
            Value::Object(map) => map.values().collect(),
            Value::Array(items) => items.iter().collect(),
            _ => return None,
        };

        let valid: Vec<f64> = entries
            .into_iter()
            .filter_map(finite_number)
            .filter(|v| *v >= 0.0)
            .collect();

        if valid.is_empty() {
            None
        } else {
            Some(valid.iter().sum())
        }
    }
}

impl From<Value> for RawSourceMetrics {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }
}

fn finite_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

/// Everything collected for one technology in one collection cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechMetrics {
    pub tech_id: String,
    pub snapshot_date: NaiveDate,
    #[serde(default)]
    pub creation_year: Option<i32>,
    /// Sources that were not collected are absent, never zero-filled.
    #[serde(default)]
    pub sources: BTreeMap<SourceId, RawSourceMetrics>,
}

impl TechMetrics {
    pub fn new(tech_id: impl Into<String>, snapshot_date: NaiveDate) -> Self {
        Self {
            tech_id: tech_id.into(),
            snapshot_date,
            creation_year: None,
            sources: BTreeMap::new(),
        }
    }

    pub fn with_source(mut self, source: SourceId, raw: impl Into<RawSourceMetrics>) -> Self {
        self.sources.insert(source, raw.into());
        self
    }

    pub fn with_creation_year(mut self, year: i32) -> Self {
        self.creation_year = Some(year);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn count_rejects_negative_and_non_numeric_fields() {
        let raw = RawSourceMetrics::from(json!({
            "questions": 12,
            "answered": -3,
            "accepted": "many",
            "avg_views": 4.5
        }));

        assert_eq!(raw.count("questions"), Some(12.0));
        assert_eq!(raw.count("answered"), None);
        assert_eq!(raw.count("accepted"), None);
        assert_eq!(raw.count("avg_views"), Some(4.5));
        assert_eq!(raw.count("missing"), None);
    }

    #[test]
    fn bounded_drops_values_outside_domain() {
        let raw = RawSourceMetrics::from(json!({ "avg_sentiment": 1.7, "other": -0.4 }));
        assert_eq!(raw.bounded("avg_sentiment", -1.0, 1.0), None);
        assert_eq!(raw.bounded("other", -1.0, 1.0), Some(-0.4));
    }

    #[test]
    fn sum_of_skips_malformed_regions() {
        let raw = RawSourceMetrics::from(json!({
            "by_region": { "us": 1200, "gb": "n/a", "de": 300, "fr": -5 }
        }));
        assert_eq!(raw.sum_of("by_region"), Some(1500.0));

        let empty = RawSourceMetrics::from(json!({ "by_region": { "us": null } }));
        assert_eq!(empty.sum_of("by_region"), None);
    }

    #[test]
    fn tech_metrics_deserializes_source_keys() {
        let tech: TechMetrics = serde_json::from_value(json!({
            "tech_id": "flutter",
            "snapshot_date": "2026-10-01",
            "sources": {
                "qa": { "questions": 40 },
                "job_market": { "total_jobs": 2500 }
            }
        }))
        .expect("valid tech metrics");

        assert_eq!(tech.sources.len(), 2);
        assert!(tech.sources.contains_key(&SourceId::Qa));
        assert_eq!(tech.creation_year, None);
    }
}
