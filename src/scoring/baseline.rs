// src/scoring/baseline.rs
//! Per-complaint expected-hours baselines, recomputed from scratch every run.
//! Two benchmarks coexist: the mean (dashboard-facing expected hours) and the
//! 25th percentile (the financial model's stricter "efficient" time).

use std::collections::HashMap;

use crate::models::ServiceRecord;
use crate::utils::constants::EFFICIENT_BENCHMARK_QUANTILE;
use crate::utils::stats::{mean, quantile};

#[derive(Debug, Clone, Default)]
pub struct ComplaintBaselines {
    mean_hours: HashMap<String, f64>,
    efficient_hours: HashMap<String, f64>,
    sample_counts: HashMap<String, usize>,
    batch_mean_hours: f64,
}

impl ComplaintBaselines {
    /// Computes baselines over the full batch. Records with empty complaint
    /// text are excluded from the per-complaint grouping and use the
    /// batch-wide mean fallback on lookup. An empty batch yields an empty
    /// mapping and a zero fallback.
    pub fn compute(records: &[ServiceRecord]) -> Self {
        let all_hours: Vec<f64> = records.iter().map(|r| r.labor_hours_billed).collect();
        let batch_mean_hours = mean(&all_hours);

        let mut grouped: HashMap<String, Vec<f64>> = HashMap::new();
        for record in records.iter().filter(|r| r.has_complaint()) {
            grouped
                .entry(record.complaint.clone())
                .or_default()
                .push(record.labor_hours_billed);
        }

        let mut mean_hours = HashMap::with_capacity(grouped.len());
        let mut efficient_hours = HashMap::with_capacity(grouped.len());
        let mut sample_counts = HashMap::with_capacity(grouped.len());
        for (complaint, hours) in grouped {
            mean_hours.insert(complaint.clone(), mean(&hours));
            efficient_hours.insert(
                complaint.clone(),
                quantile(&hours, EFFICIENT_BENCHMARK_QUANTILE),
            );
            sample_counts.insert(complaint, hours.len());
        }

        Self {
            mean_hours,
            efficient_hours,
            sample_counts,
            batch_mean_hours,
        }
    }

    /// Mean labor hours for this complaint type, or the batch-wide mean for
    /// unknown/empty complaints.
    pub fn expected_hours(&self, complaint: &str) -> f64 {
        self.mean_hours
            .get(complaint)
            .copied()
            .unwrap_or(self.batch_mean_hours)
    }

    /// 25th-percentile labor hours for this complaint type, with the same
    /// batch-wide fallback.
    pub fn efficient_benchmark(&self, complaint: &str) -> f64 {
        self.efficient_hours
            .get(complaint)
            .copied()
            .unwrap_or(self.batch_mean_hours)
    }

    /// How many records share this exact complaint string; 0 for unknown.
    pub fn sample_count(&self, complaint: &str) -> usize {
        self.sample_counts.get(complaint).copied().unwrap_or(0)
    }

    pub fn batch_mean(&self) -> f64 {
        self.batch_mean_hours
    }

    pub fn distinct_complaints(&self) -> usize {
        self.mean_hours.len()
    }
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
    fn test_mean_baseline_per_complaint() {
        let records = vec![
            record("brake noise", 2.0),
            record("brake noise", 4.0),
            record("oil leak", 1.0),
        ];
        let baselines = ComplaintBaselines::compute(&records);
        assert!((baselines.expected_hours("brake noise") - 3.0).abs() < 1e-12);
        assert!((baselines.expected_hours("oil leak") - 1.0).abs() < 1e-12);
        assert_eq!(baselines.sample_count("brake noise"), 2);
        assert_eq!(baselines.sample_count("oil leak"), 1);
    }

    #[test]
    fn test_unknown_complaint_falls_back_to_batch_mean() {
        let records = vec![record("brake noise", 2.0), record("oil leak", 4.0)];
        let baselines = ComplaintBaselines::compute(&records);
        assert!((baselines.expected_hours("transmission slip") - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_complaint_excluded_from_grouping() {
        let records = vec![record("", 10.0), record("brake noise", 2.0)];
        let baselines = ComplaintBaselines::compute(&records);
        assert_eq!(baselines.distinct_complaints(), 1);
        // Empty complaint looks up the batch mean, which still includes its hours.
        assert!((baselines.expected_hours("") - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_efficient_benchmark_is_lower_quartile() {
        let records = vec![
            record("brake noise", 1.0),
            record("brake noise", 2.0),
            record("brake noise", 3.0),
            record("brake noise", 4.0),
        ];
        let baselines = ComplaintBaselines::compute(&records);
        // 25th percentile of [1,2,3,4] with linear interpolation = 1.75.
        assert!((baselines.efficient_benchmark("brake noise") - 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_empty_batch() {
        let baselines = ComplaintBaselines::compute(&[]);
        assert_eq!(baselines.distinct_complaints(), 0);
        assert_eq!(baselines.expected_hours("anything"), 0.0);
        assert_eq!(baselines.batch_mean(), 0.0);
    }
}
