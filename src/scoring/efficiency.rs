// src/scoring/efficiency.rs
//! Deviation of billed labor hours from the complaint baseline.
//!
//! Two thresholding policies deliberately coexist and serve different
//! consumers: `efficiency_loss` charges hours beyond 20% of the expected
//! time and feeds the dashboard, while `significant_inefficiency` measures
//! against the 25th-percentile benchmark with a data-derived quantile
//! threshold and feeds the financial model. Do not unify them.

use serde::Serialize;

use crate::models::ServiceRecord;
use crate::scoring::baseline::ComplaintBaselines;
use crate::utils::config::ScoringConfig;
use crate::utils::constants::DISPLAY_EFFICIENCY_MARGIN;
use crate::utils::stats::quantile;

/// Derived efficiency signals for one record.
#[derive(Debug, Clone, Serialize)]
pub struct EfficiencyFeatures {
    /// Mean labor hours for this record's complaint type.
    pub expected_hours: f64,
    /// actual − expected, in hours. Negative means faster than typical.
    pub efficiency_deviation: f64,
    /// Hours beyond the 20%-of-expected display margin; 0 when within it.
    pub efficiency_loss: f64,
    /// Hours beyond the quantile threshold over the percentile-benchmark
    /// deviation distribution. Always >= 0.
    pub significant_inefficiency: f64,
    /// Deviation as a percent of expected hours. `None` when expected
    /// hours is zero (percentage deviation undefined); percent-based risk
    /// indicators are suppressed for such records.
    pub deviation_pct: Option<f64>,
}

/// Scores the whole batch against the supplied baselines. Pure function of
/// its inputs; returns one feature set per input record, in order.
pub fn score_efficiency(
    records: &[ServiceRecord],
    baselines: &ComplaintBaselines,
    config: &ScoringConfig,
) -> Vec<EfficiencyFeatures> {
    // Financial-policy deviations against the stricter percentile benchmark,
    // needed up front so the threshold can be derived from their distribution.
    let benchmark_deviations: Vec<f64> = records
        .iter()
        .map(|r| r.labor_hours_billed - baselines.efficient_benchmark(&r.complaint))
        .collect();
    let inefficiency_threshold = quantile(&benchmark_deviations, config.inefficiency_quantile);

    records
        .iter()
        .zip(benchmark_deviations.iter())
        .map(|(record, &benchmark_deviation)| {
            let expected_hours = baselines.expected_hours(&record.complaint);
            let efficiency_deviation = record.labor_hours_billed - expected_hours;

            let display_margin = expected_hours * DISPLAY_EFFICIENCY_MARGIN;
            let efficiency_loss = if efficiency_deviation > display_margin {
                efficiency_deviation - display_margin
            } else {
                0.0
            };

            let significant_inefficiency = if benchmark_deviation > inefficiency_threshold {
                benchmark_deviation - inefficiency_threshold
            } else {
                0.0
            };

            let deviation_pct = if expected_hours > 0.0 {
                Some(efficiency_deviation / expected_hours * 100.0)
            } else {
                None
            };

            EfficiencyFeatures {
                expected_hours,
                efficiency_deviation,
                efficiency_loss,
                significant_inefficiency,
                deviation_pct,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::records::ServiceRecord;

    fn record(complaint: &str, hours: f64) -> ServiceRecord {
        ServiceRecord {
            vin: "VIN1".to_string(),
            service_date: None,
            invoice_total: 0.0,
            labor_hours_billed: hours,
            odometer_reading: 0.0,
            make: "Make".to_string(),
            model: "Model".to_string(),
            year: Some(2020),
            complaint: complaint.to_string(),
            customer_name: None,
            customer_contact: None,
            diagnosis: None,
            recommended: None,
            parts_used: None,
            technician: "T1".to_string(),
            shop_id: "shop-1".to_string(),
        }
    }

    #[test]
    fn test_deviation_against_complaint_mean() {
        let records = vec![record("brake noise", 2.0), record("brake noise", 4.0)];
        let baselines = ComplaintBaselines::compute(&records);
        let features = score_efficiency(&records, &baselines, &ScoringConfig::default());

        // Expected hours = mean(2, 4) = 3.
        assert!((features[0].efficiency_deviation - (-1.0)).abs() < 1e-12);
        assert!((features[1].efficiency_deviation - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_display_loss_requires_20_pct_overrun() {
        let records = vec![
            record("a", 2.0),
            record("a", 2.0),
            record("a", 2.0),
            record("a", 2.3), // deviation over mean ~2.075 is ~0.225, margin 0.415
            record("b", 1.0),
            record("b", 2.5), // deviation 0.75 over mean 1.75, margin 0.35
        ];
        let baselines = ComplaintBaselines::compute(&records);
        let features = score_efficiency(&records, &baselines, &ScoringConfig::default());

        assert_eq!(features[3].efficiency_loss, 0.0);
        assert!(features[5].efficiency_loss > 0.0);
    }

    #[test]
    fn test_significant_inefficiency_never_negative() {
        let records = vec![
            record("a", 1.0),
            record("a", 2.0),
            record("a", 8.0),
            record("b", 0.5),
        ];
        let baselines = ComplaintBaselines::compute(&records);
        let features = score_efficiency(&records, &baselines, &ScoringConfig::default());
        for f in &features {
            assert!(f.significant_inefficiency >= 0.0);
        }
    }

    #[test]
    fn test_zero_expected_hours_suppresses_pct() {
        let records = vec![record("a", 0.0), record("a", 0.0)];
        let baselines = ComplaintBaselines::compute(&records);
        let features = score_efficiency(&records, &baselines, &ScoringConfig::default());
        assert!(features[0].deviation_pct.is_none());
    }

    #[test]
    fn test_quantile_threshold_charges_only_worst_records() {
        // Nine on-benchmark jobs and one large overrun; with the default 0.60
        // quantile the overrun must carry significant inefficiency.
        let mut records: Vec<ServiceRecord> = (0..9).map(|_| record("a", 2.0)).collect();
        records.push(record("a", 6.0));
        let baselines = ComplaintBaselines::compute(&records);
        let features = score_efficiency(&records, &baselines, &ScoringConfig::default());

        assert!(features[9].significant_inefficiency > 0.0);
        assert_eq!(features[0].significant_inefficiency, 0.0);
    }
}
