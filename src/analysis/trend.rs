use crate::models::config::{DeclineCurve, MaturityConfig};
use crate::models::metrics::RawSourceMetrics;
use crate::models::snapshot::Maturity;

/// Relative change between the first and last period counts.
/// Needs at least two periods and a non-zero first period.
pub fn growth_from_periods(counts: &[f64]) -> Option<f64> {
    let (first, last) = match counts {
        [first, .., last] => (*first, *last),
        _ => return None,
    };
    if first <= 0.0 {
        return None;
    }
    Some(last / first - 1.0)
}

/// Explicit `growth_rate` wins over a rate derived from `period_counts`.
pub fn growth_rate(raw: &RawSourceMetrics) -> Option<f64> {
    raw.signed("growth_rate").or_else(|| {
        raw.counts("period_counts")
            .and_then(|counts| growth_from_periods(&counts))
    })
}

/// Linear decay from `max` at day zero to 0 at `horizon_days`.
pub fn linear_recency(days: f64, max: f64, horizon_days: f64) -> f64 {
    if horizon_days <= 0.0 {
        return 0.0;
    }
    (max - days.max(0.0) / horizon_days * max).max(0.0)
}

/// Extra deaditude for a community whose volume is shrinking fast.
/// Zero at or above the onset, then quadratic up to `max_penalty`.
pub fn decline_penalty(growth: f64, curve: &DeclineCurve) -> f64 {
    if growth >= curve.onset {
        return 0.0;
    }
    let depth = curve.onset - growth;
    (curve.steepness * depth * depth).min(curve.max_penalty)
}

/// Earliest creation year taken at face value.
pub const EARLIEST_CREATION_YEAR: i32 = 1900;

/// Whole years between creation and the snapshot, at least one.
/// Creation years after the snapshot or before [`EARLIEST_CREATION_YEAR`]
/// are treated as unknown.
pub fn tech_age_years(snapshot_year: i32, creation_year: Option<i32>) -> Option<u32> {
    let created = creation_year
        .filter(|year| (EARLIEST_CREATION_YEAR..=snapshot_year).contains(year))?;
    let age = snapshot_year.checked_sub(created)?.max(1);
    u32::try_from(age).ok()
}

pub fn maturity_for(age_years: Option<u32>, config: &MaturityConfig) -> Maturity {
    match age_years {
        Some(age) if age <= config.young_max_years => Maturity::Young,
        Some(age) if age <= config.maturing_max_years => Maturity::Maturing,
        _ => Maturity::Established,
    }
}

/// Young technologies get the benefit of the doubt: thin signals are
/// expected, so their score is scaled down.
pub fn maturity_factor(maturity: Maturity, config: &MaturityConfig) -> f64 {
    match maturity {
        Maturity::Young => config.young_factor,
        Maturity::Maturing => config.maturing_factor,
        Maturity::Established => 1.0,
    }
}
