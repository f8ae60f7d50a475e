// src/scoring/risk.rs
//! Multi-factor misdiagnosis scoring.
//!
//! A job first accumulates four independent 0/1 risk indicators
//! (efficiency, repeat, vehicle complexity, weekend service); two or more
//! mark it high-risk. The misdiagnosis probability is then a weighted sum
//! of four bounded factors, clipped to [0,1] and thresholded at a fixed
//! cutoff. The cutoff is intentionally fixed, not quantile-derived like the
//! inefficiency threshold.

use std::collections::HashMap;

use chrono::Datelike;
use serde::Serialize;

use crate::models::records::ConfidenceLevel;
use crate::models::ServiceRecord;
use crate::scoring::efficiency::EfficiencyFeatures;
use crate::utils::config::ScoringConfig;
use crate::utils::constants::{
    COMPLEXITY_RISK_QUANTILE, EFFICIENCY_RISK_PCT, EFFICIENCY_WEIGHT, HIGH_DEVIATION_PCT,
    HIGH_RISK_MIN_FACTORS, REPEAT_WEIGHT, RISK_WEIGHT, SIMILARITY_RISK_THRESHOLD,
    SIMILARITY_WEIGHT,
};
use crate::utils::stats::{mean, quantile};

/// Derived risk signals for one record.
#[derive(Debug, Clone, Serialize)]
pub struct RiskProfile {
    /// Count of triggered risk indicators, 0..=4.
    pub risk_score: i32,
    pub high_risk: i32,
    /// Weighted composite in [0,1].
    pub misdiagnosis_probability: f64,
    pub suspected_misdiagnosis: i32,
    pub confidence_level: ConfidenceLevel,
}

/// Scores the batch. `repeat_flags` and `similarity` must be parallel to
/// `records`, as produced by the upstream detectors.
pub fn score_risk(
    records: &[ServiceRecord],
    efficiency: &[EfficiencyFeatures],
    repeat_flags: &[i32],
    similarity: &[f64],
    config: &ScoringConfig,
) -> Vec<RiskProfile> {
    debug_assert!(
        (REPEAT_WEIGHT + EFFICIENCY_WEIGHT + RISK_WEIGHT + SIMILARITY_WEIGHT - 1.0).abs() < 1e-12
    );

    let complexity_scores = vehicle_complexity_scores(records);
    let complexity_cutoff = quantile(&complexity_scores, COMPLEXITY_RISK_QUANTILE);

    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let deviation_pct = efficiency[i].deviation_pct;

            let efficiency_risk = matches!(deviation_pct, Some(pct) if pct > EFFICIENCY_RISK_PCT);
            let repeat_risk = repeat_flags[i] == 1;
            let complexity_risk = complexity_scores[i] > complexity_cutoff;
            let weekend_risk = is_weekend(record);

            let risk_score = efficiency_risk as i32
                + repeat_risk as i32
                + complexity_risk as i32
                + weekend_risk as i32;
            let high_risk = (risk_score >= HIGH_RISK_MIN_FACTORS) as i32;

            let repeat_factor = repeat_flags[i] as f64 * REPEAT_WEIGHT;
            let efficiency_factor = match deviation_pct {
                Some(pct) if pct > HIGH_DEVIATION_PCT => EFFICIENCY_WEIGHT,
                _ => 0.0,
            };
            let risk_factor = high_risk as f64 * RISK_WEIGHT;
            let similarity_factor = if similarity[i] > SIMILARITY_RISK_THRESHOLD {
                SIMILARITY_WEIGHT
            } else {
                0.0
            };

            let misdiagnosis_probability =
                (repeat_factor + efficiency_factor + risk_factor + similarity_factor)
                    .clamp(0.0, 1.0);
            let suspected_misdiagnosis =
                (misdiagnosis_probability > config.misdiagnosis_cutoff) as i32;

            RiskProfile {
                risk_score,
                high_risk,
                misdiagnosis_probability,
                suspected_misdiagnosis,
                confidence_level: ConfidenceLevel::from_probability(misdiagnosis_probability),
            }
        })
        .collect()
}

/// Per-record vehicle complexity: mean labor hours across the batch for the
/// record's make/model pair.
fn vehicle_complexity_scores(records: &[ServiceRecord]) -> Vec<f64> {
    let mut grouped: HashMap<(&str, &str), Vec<f64>> = HashMap::new();
    for record in records {
        grouped
            .entry((record.make.as_str(), record.model.as_str()))
            .or_default()
            .push(record.labor_hours_billed);
    }
    let group_means: HashMap<(&str, &str), f64> = grouped
        .into_iter()
        .map(|(key, hours)| (key, mean(&hours)))
        .collect();

    records
        .iter()
        .map(|r| group_means[&(r.make.as_str(), r.model.as_str())])
        .collect()
}

fn is_weekend(record: &ServiceRecord) -> bool {
    matches!(
        record.service_date.map(|d| d.weekday()),
        Some(chrono::Weekday::Sat) | Some(chrono::Weekday::Sun)
    )
}
